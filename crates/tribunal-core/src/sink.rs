//! Per-game result persistence.
//!
//! Each unit writes to its own `<unit_id>_result.json`, so units never
//! contend on output. The artifact schema is shared with the `aggregate`
//! command, which reads these files back instead of re-running judges.

use crate::errors::EvalError;
use crate::model::{CriterionOutcome, GameResult, Unit};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::aggregate::UNRESOLVED_TEAM;

#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn persist(&self, unit: &Unit, result: &GameResult) -> Result<(), EvalError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingArtifact {
    pub player_name: String,
    pub team: String,
    pub ranking: u32,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CriterionArtifact {
    Valid { rankings: Vec<RankingArtifact> },
    Failed { reason: String, attempts: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfoArtifact {
    pub player_count: usize,
}

/// On-disk form of one game's evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameArtifact {
    pub game_id: String,
    pub game_info: GameInfoArtifact,
    pub evaluated_at: DateTime<Utc>,
    pub evaluations: BTreeMap<String, CriterionArtifact>,
}

impl GameArtifact {
    pub fn from_result(unit: &Unit, result: &GameResult) -> Self {
        let evaluations = result
            .results
            .iter()
            .map(|(name, cr)| {
                let artifact = match &cr.outcome {
                    CriterionOutcome::Valid { entries } => CriterionArtifact::Valid {
                        rankings: entries
                            .iter()
                            .map(|e| RankingArtifact {
                                player_name: e.player_name.clone(),
                                team: unit
                                    .team_of(&e.player_name)
                                    .unwrap_or(UNRESOLVED_TEAM)
                                    .to_string(),
                                ranking: e.rank,
                                reasoning: e.reasoning.clone(),
                            })
                            .collect(),
                    },
                    CriterionOutcome::Failed { reason, attempts } => CriterionArtifact::Failed {
                        reason: reason.clone(),
                        attempts: *attempts,
                    },
                };
                (name.clone(), artifact)
            })
            .collect();

        Self {
            game_id: result.unit_id.clone(),
            game_info: GameInfoArtifact {
                player_count: result.size,
            },
            evaluated_at: Utc::now(),
            evaluations,
        }
    }

    /// Rebuild the in-memory result plus the player→team mapping recorded
    /// at write time.
    pub fn into_parts(self) -> (GameResult, HashMap<String, String>) {
        let mut teams = HashMap::new();
        let results = self
            .evaluations
            .into_iter()
            .map(|(name, artifact)| {
                let outcome = match artifact {
                    CriterionArtifact::Valid { rankings } => CriterionOutcome::Valid {
                        entries: rankings
                            .into_iter()
                            .map(|r| {
                                teams.insert(r.player_name.clone(), r.team);
                                crate::model::RankingEntry {
                                    player_name: r.player_name,
                                    rank: r.ranking,
                                    reasoning: r.reasoning,
                                }
                            })
                            .collect(),
                    },
                    CriterionArtifact::Failed { reason, attempts } => {
                        CriterionOutcome::Failed { reason, attempts }
                    }
                };
                (
                    name.clone(),
                    crate::model::CriterionResult {
                        criterion_name: name,
                        outcome,
                    },
                )
            })
            .collect();

        (
            GameResult {
                unit_id: self.game_id,
                size: self.game_info.player_count,
                results,
            },
            teams,
        )
    }
}

pub struct FsResultSink {
    output_dir: PathBuf,
}

impl FsResultSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn result_path(&self, unit_id: &str) -> PathBuf {
        self.output_dir.join(format!("{unit_id}_result.json"))
    }
}

#[async_trait]
impl ResultSink for FsResultSink {
    async fn persist(&self, unit: &Unit, result: &GameResult) -> Result<(), EvalError> {
        let artifact = GameArtifact::from_result(unit, result);
        let json = serde_json::to_string_pretty(&artifact).map_err(|e| EvalError::Persist {
            unit_id: result.unit_id.clone(),
            detail: e.to_string(),
        })?;
        let path = self.result_path(&result.unit_id);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| EvalError::Persist {
                unit_id: result.unit_id.clone(),
                detail: format!("{}: {e}", path.display()),
            })?;
        debug!(unit_id = %result.unit_id, path = %path.display(), "saved game result");
        Ok(())
    }
}

/// Read every `*_result.json` under `dir` back into artifacts, sorted by
/// game id.
pub fn read_artifacts(dir: &Path) -> Result<Vec<GameArtifact>, EvalError> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        EvalError::Discovery(format!("cannot read results dir {}: {e}", dir.display()))
    })?;

    let mut artifacts = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            EvalError::Discovery(format!("error scanning {}: {e}", dir.display()))
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with("_result.json") {
            continue;
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| EvalError::Discovery(format!(
            "cannot read {}: {e}",
            path.display()
        )))?;
        let artifact: GameArtifact = serde_json::from_str(&raw).map_err(|e| {
            EvalError::Discovery(format!("invalid result artifact {}: {e}", path.display()))
        })?;
        artifacts.push(artifact);
    }
    artifacts.sort_by(|a, b| a.game_id.cmp(&b.game_id));
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CriterionResult, Participant, RankingEntry};
    use tempfile::tempdir;

    fn unit() -> Unit {
        Unit {
            unit_id: "g1".into(),
            participants: vec![
                Participant {
                    name: "a".into(),
                    team: "team-a".into(),
                    profile: None,
                },
                Participant {
                    name: "b".into(),
                    team: "team-b".into(),
                    profile: None,
                },
            ],
        }
    }

    fn result() -> GameResult {
        let mut results = BTreeMap::new();
        results.insert(
            "persuasion".to_string(),
            CriterionResult::valid(
                "persuasion",
                vec![
                    RankingEntry {
                        player_name: "b".into(),
                        rank: 1,
                        reasoning: "led the vote".into(),
                    },
                    RankingEntry {
                        player_name: "a".into(),
                        rank: 2,
                        reasoning: "followed".into(),
                    },
                ],
            ),
        );
        results.insert(
            "deception".to_string(),
            CriterionResult::failed("deception", "judge call timed out after 30s", 3),
        );
        GameResult {
            unit_id: "g1".into(),
            size: 2,
            results,
        }
    }

    #[tokio::test]
    async fn persists_and_reads_back_artifacts() {
        let dir = tempdir().unwrap();
        let sink = FsResultSink::new(dir.path());
        sink.persist(&unit(), &result()).await.unwrap();

        let artifacts = read_artifacts(dir.path()).unwrap();
        assert_eq!(artifacts.len(), 1);
        let (game, teams) = artifacts.into_iter().next().unwrap().into_parts();
        assert_eq!(game, result());
        assert_eq!(teams.get("b").map(String::as_str), Some("team-b"));
    }

    #[test]
    fn artifact_labels_unknown_players_unresolved() {
        let mut r = result();
        r.results.insert(
            "extra".into(),
            CriterionResult::valid(
                "extra",
                vec![
                    RankingEntry {
                        player_name: "ghost".into(),
                        rank: 1,
                        reasoning: "r".into(),
                    },
                    RankingEntry {
                        player_name: "a".into(),
                        rank: 2,
                        reasoning: "r".into(),
                    },
                ],
            ),
        );
        let artifact = GameArtifact::from_result(&unit(), &r);
        match &artifact.evaluations["extra"] {
            CriterionArtifact::Valid { rankings } => {
                assert_eq!(rankings[0].team, UNRESOLVED_TEAM);
            }
            _ => panic!("expected valid artifact"),
        }
    }
}
