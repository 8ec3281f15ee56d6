//! Shared data model for the evaluation pipeline.
//!
//! Units and criteria are read-only inputs; criterion and game results are
//! built once per run and never mutated after they are handed back to the
//! caller.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One evaluation dimension: what the judge ranks players on, which game
/// sizes it applies to, and where it sits in exported tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    pub name: String,
    pub description: String,
    pub applicable_sizes: Vec<usize>,
    pub display_order: i32,
}

impl Criterion {
    pub fn applies_to(&self, size: usize) -> bool {
        self.applicable_sizes.contains(&size)
    }
}

/// Ordered collection of criteria with named lookup and applicability
/// filtering. Display order is preserved from construction.
#[derive(Debug, Clone, Default)]
pub struct CriterionSet {
    criteria: Vec<Criterion>,
}

impl CriterionSet {
    /// Build a set from loaded criteria, sorted by `display_order`.
    /// Duplicate names are rejected at load time, not at use time.
    pub fn new(mut criteria: Vec<Criterion>) -> Result<Self, crate::errors::EvalError> {
        let mut seen = BTreeSet::new();
        for c in &criteria {
            if !seen.insert(c.name.clone()) {
                return Err(crate::errors::EvalError::Config(format!(
                    "duplicate criterion name: {}",
                    c.name
                )));
            }
        }
        criteria.sort_by(|a, b| a.display_order.cmp(&b.display_order));
        Ok(Self { criteria })
    }

    pub fn get(&self, name: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.name == name)
    }

    /// Criteria applicable to a game of `size` players, in display order.
    pub fn criteria_for_size(&self, size: usize) -> Vec<Criterion> {
        self.criteria
            .iter()
            .filter(|c| c.applies_to(size))
            .cloned()
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

/// One player in a unit's roster, with the team it plays for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub team: String,
    /// Free-form character/profile line shown to the judge, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// The smallest independently schedulable piece of work: one recorded game
/// and its roster. Created by discovery, read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub unit_id: String,
    pub participants: Vec<Participant>,
}

impl Unit {
    pub fn size(&self) -> usize {
        self.participants.len()
    }

    pub fn participant_names(&self) -> BTreeSet<&str> {
        self.participants.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn team_of(&self, player_name: &str) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.name == player_name)
            .map(|p| p.team.as_str())
    }
}

/// One accepted ranking line: player, unique rank in 1..=size, and the
/// judge's reasoning for that placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub player_name: String,
    pub rank: u32,
    pub reasoning: String,
}

/// Terminal outcome of one criterion evaluation.
///
/// `Valid` entries are a verified permutation: one entry per participant,
/// ranks exactly `{1..size}`. `Failed` retains the last failure reason so
/// consumers can see which criteria degraded without losing the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CriterionOutcome {
    Valid { entries: Vec<RankingEntry> },
    Failed { reason: String, attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion_name: String,
    #[serde(flatten)]
    pub outcome: CriterionOutcome,
}

impl CriterionResult {
    pub fn valid(criterion_name: impl Into<String>, entries: Vec<RankingEntry>) -> Self {
        Self {
            criterion_name: criterion_name.into(),
            outcome: CriterionOutcome::Valid { entries },
        }
    }

    pub fn failed(
        criterion_name: impl Into<String>,
        reason: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            criterion_name: criterion_name.into(),
            outcome: CriterionOutcome::Failed {
                reason: reason.into(),
                attempts,
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.outcome, CriterionOutcome::Valid { .. })
    }

    pub fn entries(&self) -> Option<&[RankingEntry]> {
        match &self.outcome {
            CriterionOutcome::Valid { entries } => Some(entries),
            CriterionOutcome::Failed { .. } => None,
        }
    }
}

/// All criterion results for one unit, keyed by criterion name. Owned by
/// the game evaluator that produced it, immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub unit_id: String,
    pub size: usize,
    pub results: BTreeMap<String, CriterionResult>,
}

impl GameResult {
    pub fn valid_results(&self) -> impl Iterator<Item = &CriterionResult> {
        self.results.values().filter(|r| r.is_valid())
    }
}

/// Batch-level counters. A run always finishes with one of these, even if
/// every unit failed; only discovery/configuration problems abort earlier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Units whose transcript could not be loaded or formatted (subset of `failed`).
    pub transcript_failures: usize,
    /// Units evaluated successfully whose result could not be persisted
    /// (subset of `failed`, kept separate for diagnostics).
    pub persist_failures: usize,
    /// True when a cancellation signal stopped the run before every unit
    /// reached a terminal state.
    pub interrupted: bool,
}

impl ProcessingSummary {
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(name: &str, order: i32, sizes: &[usize]) -> Criterion {
        Criterion {
            name: name.into(),
            description: format!("{name} description"),
            applicable_sizes: sizes.to_vec(),
            display_order: order,
        }
    }

    #[test]
    fn criterion_set_orders_by_display_order_and_filters_by_size() {
        let set = CriterionSet::new(vec![
            criterion("b", 2, &[5, 13]),
            criterion("a", 1, &[5, 13]),
            criterion("c", 3, &[13]),
        ])
        .unwrap();

        let names: Vec<_> = set.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);

        let five: Vec<_> = set
            .criteria_for_size(5)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(five, ["a", "b"]);
        assert_eq!(set.criteria_for_size(13).len(), 3);
        assert!(set.criteria_for_size(7).is_empty());
    }

    #[test]
    fn criterion_set_rejects_duplicate_names() {
        let err = CriterionSet::new(vec![
            criterion("dup", 1, &[5]),
            criterion("dup", 2, &[5]),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate criterion name"));
    }

    #[test]
    fn success_rate_is_zero_for_empty_batch() {
        let summary = ProcessingSummary::default();
        assert_eq!(summary.success_rate(), 0.0);

        let summary = ProcessingSummary {
            total: 4,
            completed: 3,
            failed: 1,
            ..Default::default()
        };
        assert_eq!(summary.success_rate(), 0.75);
    }

    #[test]
    fn unit_roster_lookups() {
        let unit = Unit {
            unit_id: "g1".into(),
            participants: vec![
                Participant {
                    name: "kanolab".into(),
                    team: "team-a".into(),
                    profile: None,
                },
                Participant {
                    name: "satozaki".into(),
                    team: "team-b".into(),
                    profile: None,
                },
            ],
        };
        assert_eq!(unit.size(), 2);
        assert_eq!(unit.team_of("satozaki"), Some("team-b"));
        assert_eq!(unit.team_of("nobody"), None);
        assert!(unit.participant_names().contains("kanolab"));
    }
}
