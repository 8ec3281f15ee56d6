//! Aggregation exports: `team_aggregation.json` and `team_aggregation.csv`
//! written side by side under the output directory.

pub mod csv;
pub mod json;

use crate::aggregate::TeamAggregation;
use crate::errors::EvalError;
use crate::model::CriterionSet;
use std::path::{Path, PathBuf};
use tracing::info;

pub const JSON_REPORT_NAME: &str = "team_aggregation.json";
pub const CSV_REPORT_NAME: &str = "team_aggregation.csv";

pub struct SummaryExporter {
    output_dir: PathBuf,
}

impl SummaryExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(JSON_REPORT_NAME)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(CSV_REPORT_NAME)
    }

    /// Write both report formats. Columns and cell keys are labeled with
    /// the criterion descriptions; the CSV column order follows the
    /// criterion set's display order.
    pub fn export(
        &self,
        aggregation: &TeamAggregation,
        criteria: &CriterionSet,
    ) -> Result<(), EvalError> {
        write_report(&self.json_path(), &json::render(aggregation, criteria)?)?;
        write_report(&self.csv_path(), &csv::render(aggregation, criteria))?;
        info!(
            dir = %self.output_dir.display(),
            teams = aggregation.teams.len(),
            "wrote aggregation reports"
        );
        Ok(())
    }
}

fn write_report(path: &Path, contents: &str) -> Result<(), EvalError> {
    std::fs::write(path, contents).map_err(|e| {
        EvalError::Persist {
            unit_id: "aggregation".into(),
            detail: format!("{}: {e}", path.display()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregationEngine, RosterTeamResolver};
    use crate::model::{Criterion, CriterionResult, GameResult, Participant, RankingEntry, Unit};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn fixture() -> (TeamAggregation, CriterionSet) {
        let units = vec![Unit {
            unit_id: "g1".into(),
            participants: vec![
                Participant {
                    name: "p1".into(),
                    team: "alpha".into(),
                    profile: None,
                },
                Participant {
                    name: "p2".into(),
                    team: "beta".into(),
                    profile: None,
                },
            ],
        }];
        let mut results = BTreeMap::new();
        results.insert(
            "persuasion".to_string(),
            CriterionResult::valid(
                "persuasion",
                vec![
                    RankingEntry {
                        player_name: "p1".into(),
                        rank: 1,
                        reasoning: "r".into(),
                    },
                    RankingEntry {
                        player_name: "p2".into(),
                        rank: 2,
                        reasoning: "r".into(),
                    },
                ],
            ),
        );
        let games = vec![GameResult {
            unit_id: "g1".into(),
            size: 2,
            results,
        }];
        let resolver = RosterTeamResolver::from_units(&units);
        let aggregation = AggregationEngine::aggregate(&games, &resolver);
        let criteria = CriterionSet::new(vec![Criterion {
            name: "persuasion".into(),
            description: "who drove the discussion".into(),
            applicable_sizes: vec![2],
            display_order: 1,
        }])
        .unwrap();
        (aggregation, criteria)
    }

    #[test]
    fn exports_both_report_files() {
        let dir = tempdir().unwrap();
        let (aggregation, criteria) = fixture();
        let exporter = SummaryExporter::new(dir.path());
        exporter.export(&aggregation, &criteria).unwrap();

        let json = std::fs::read_to_string(exporter.json_path()).unwrap();
        assert!(json.contains("\"alpha\""));
        let csv = std::fs::read_to_string(exporter.csv_path()).unwrap();
        assert!(csv.starts_with("Team,"));
    }
}
