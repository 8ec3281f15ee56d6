//! JSON aggregation report: full nested mapping plus a summary block.
//!
//! Cells are re-keyed from the internal criterion name to the criterion's
//! human-readable description, matching the tabular export.

use crate::aggregate::TeamAggregation;
use crate::errors::EvalError;
use crate::model::CriterionSet;
use serde_json::json;
use std::collections::BTreeMap;

pub fn render(
    aggregation: &TeamAggregation,
    criteria: &CriterionSet,
) -> Result<String, EvalError> {
    let teams: BTreeMap<&str, BTreeMap<&str, _>> = aggregation
        .teams
        .iter()
        .map(|(team, cells)| {
            let relabeled = cells
                .iter()
                .map(|(name, cell)| {
                    let label = criteria
                        .get(name)
                        .map_or(name.as_str(), |c| c.description.as_str());
                    (label, cell)
                })
                .collect();
            (team.as_str(), relabeled)
        })
        .collect();

    let doc = json!({
        "teams": teams,
        "summary": {
            "total_games_processed": aggregation.total_games_processed,
            "teams_found": aggregation.teams.len(),
            "criteria_evaluated": aggregation.criteria_evaluated,
        },
    });
    serde_json::to_string_pretty(&doc).map_err(|e| EvalError::Persist {
        unit_id: "aggregation".into(),
        detail: format!("serializing json report: {e}"),
    })
}
