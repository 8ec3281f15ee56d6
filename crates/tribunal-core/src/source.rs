//! Transcript discovery and loading.
//!
//! A unit on disk is a pair of files under the input root: `<unit_id>.json`
//! with the roster (participants and their teams, optionally a profile
//! line) and `<unit_id>.log` with the rendered game log. Discovery reads
//! rosters; the log is only touched when the unit is actually processed,
//! so a broken log fails that unit alone.

use crate::errors::EvalError;
use crate::judge::FormattedTranscript;
use crate::model::{Participant, Unit};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where units come from. `load` failing is the one fatal, non-retryable
/// failure mode for a unit.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn discover(&self) -> Result<Vec<Unit>, EvalError>;
    async fn load(&self, unit_id: &str) -> Result<FormattedTranscript, EvalError>;
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    participants: Vec<Participant>,
}

pub struct FsTranscriptSource {
    root: PathBuf,
}

impl FsTranscriptSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn roster_path(&self, unit_id: &str) -> PathBuf {
        self.root.join(format!("{unit_id}.json"))
    }

    fn log_path(&self, unit_id: &str) -> PathBuf {
        self.root.join(format!("{unit_id}.log"))
    }

    async fn read_roster(&self, unit_id: &str) -> Result<Vec<Participant>, EvalError> {
        let path = self.roster_path(unit_id);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| EvalError::Transcript {
                unit_id: unit_id.to_string(),
                detail: format!("failed to read roster {}: {e}", path.display()),
            })?;
        let roster: RosterFile =
            serde_json::from_str(&raw).map_err(|e| EvalError::Transcript {
                unit_id: unit_id.to_string(),
                detail: format!("invalid roster {}: {e}", path.display()),
            })?;
        if roster.participants.is_empty() {
            return Err(EvalError::Transcript {
                unit_id: unit_id.to_string(),
                detail: "roster has no participants".to_string(),
            });
        }
        Ok(roster.participants)
    }

    fn character_info(participants: &[Participant]) -> String {
        participants
            .iter()
            .filter_map(|p| {
                p.profile
                    .as_ref()
                    .map(|profile| format!("- {}: {}", p.name, profile))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl TranscriptSource for FsTranscriptSource {
    async fn discover(&self) -> Result<Vec<Unit>, EvalError> {
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            EvalError::Discovery(format!(
                "cannot read input root {}: {e}",
                self.root.display()
            ))
        })?;

        let mut units = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            EvalError::Discovery(format!("error scanning {}: {e}", self.root.display()))
        })? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(unit_id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.read_roster(unit_id).await {
                Ok(participants) => units.push(Unit {
                    unit_id: unit_id.to_string(),
                    participants,
                }),
                Err(e) => {
                    // A broken roster cannot become a schedulable unit; skip
                    // it so its siblings still run.
                    warn!(unit_id, error = %e, "skipping unit with unreadable roster");
                }
            }
        }

        units.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        info!(root = %self.root.display(), units = units.len(), "discovered units");
        Ok(units)
    }

    async fn load(&self, unit_id: &str) -> Result<FormattedTranscript, EvalError> {
        let participants = self.read_roster(unit_id).await?;
        let log_path = self.log_path(unit_id);
        let text = tokio::fs::read_to_string(&log_path)
            .await
            .map_err(|e| EvalError::Transcript {
                unit_id: unit_id.to_string(),
                detail: format!("failed to read log {}: {e}", log_path.display()),
            })?;

        Ok(FormattedTranscript {
            unit_id: unit_id.to_string(),
            participants: participants.iter().map(|p| p.name.clone()).collect(),
            character_info: Self::character_info(&participants),
            text,
        })
    }
}

/// Write a unit fixture pair under `dir`. Test and demo helper.
pub fn write_unit_fixture(
    dir: &Path,
    unit_id: &str,
    participants: &[Participant],
    log: &str,
) -> std::io::Result<()> {
    let roster = serde_json::json!({ "participants": participants });
    std::fs::write(
        dir.join(format!("{unit_id}.json")),
        serde_json::to_string_pretty(&roster).expect("roster serializes"),
    )?;
    std::fs::write(dir.join(format!("{unit_id}.log")), log)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn participants(names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .map(|n| Participant {
                name: (*n).into(),
                team: format!("team-{n}"),
                profile: Some(format!("{n} profile")),
            })
            .collect()
    }

    #[tokio::test]
    async fn discovers_units_sorted_and_loads_transcripts() {
        let dir = tempdir().unwrap();
        write_unit_fixture(dir.path(), "b-game", &participants(&["x", "y"]), "b log").unwrap();
        write_unit_fixture(dir.path(), "a-game", &participants(&["p", "q"]), "a log").unwrap();

        let source = FsTranscriptSource::new(dir.path());
        let units = source.discover().await.unwrap();
        let ids: Vec<_> = units.iter().map(|u| u.unit_id.as_str()).collect();
        assert_eq!(ids, ["a-game", "b-game"]);

        let transcript = source.load("a-game").await.unwrap();
        assert_eq!(transcript.text, "a log");
        assert_eq!(transcript.participants, ["p", "q"]);
        assert!(transcript.character_info.contains("- p: p profile"));
    }

    #[tokio::test]
    async fn missing_log_is_a_transcript_error_not_a_discovery_error() {
        let dir = tempdir().unwrap();
        let roster = serde_json::json!({ "participants": participants(&["x"]) });
        std::fs::write(
            dir.path().join("orphan.json"),
            serde_json::to_string(&roster).unwrap(),
        )
        .unwrap();

        let source = FsTranscriptSource::new(dir.path());
        assert_eq!(source.discover().await.unwrap().len(), 1);

        let err = source.load("orphan").await.unwrap_err();
        assert!(matches!(err, EvalError::Transcript { .. }));
    }

    #[tokio::test]
    async fn unreadable_root_is_a_discovery_error() {
        let source = FsTranscriptSource::new("/definitely/not/here");
        let err = source.discover().await.unwrap_err();
        assert!(matches!(err, EvalError::Discovery(_)));
    }

    #[tokio::test]
    async fn corrupt_roster_is_skipped_with_siblings_unaffected() {
        let dir = tempdir().unwrap();
        write_unit_fixture(dir.path(), "good", &participants(&["x", "y"]), "log").unwrap();
        std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();

        let source = FsTranscriptSource::new(dir.path());
        let units = source.discover().await.unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit_id, "good");
    }
}
