//! Team-level aggregation of per-game rankings.
//!
//! The fold is deterministic: games are visited in unit-id order, teams and
//! criteria accumulate in sorted maps, and failed criterion results are
//! excluded entirely (they contribute neither rank mass nor sample count).

use crate::model::{GameResult, Unit};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Team label used when a ranked player cannot be traced back to a roster
/// entry. Kept as its own bucket so the gap is visible in exports instead
/// of silently skewing a real team's average.
pub const UNRESOLVED_TEAM: &str = "unresolved";

/// Maps a ranked player back to the team it played for in a given game.
pub trait TeamResolver {
    fn team_of(&self, unit_id: &str, player_name: &str) -> Option<&str>;
}

/// Resolver backed by per-game player→team tables.
#[derive(Debug, Default)]
pub struct RosterTeamResolver {
    rosters: HashMap<String, HashMap<String, String>>,
}

impl RosterTeamResolver {
    pub fn from_units(units: &[Unit]) -> Self {
        let mut rosters = HashMap::new();
        for unit in units {
            let table = unit
                .participants
                .iter()
                .map(|p| (p.name.clone(), p.team.clone()))
                .collect();
            rosters.insert(unit.unit_id.clone(), table);
        }
        Self { rosters }
    }

    /// Register a player→team table for one game, e.g. recovered from a
    /// previously written result artifact.
    pub fn insert(&mut self, unit_id: impl Into<String>, table: HashMap<String, String>) {
        self.rosters.insert(unit_id.into(), table);
    }
}

impl TeamResolver for RosterTeamResolver {
    fn team_of(&self, unit_id: &str, player_name: &str) -> Option<&str> {
        self.rosters
            .get(unit_id)
            .and_then(|table| table.get(player_name))
            .map(String::as_str)
    }
}

/// Aggregated standing of one team on one criterion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateCell {
    pub average_rank: f64,
    pub sample_count: usize,
}

/// Cross-game aggregation: team → criterion → averaged rank.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TeamAggregation {
    pub teams: BTreeMap<String, BTreeMap<String, AggregateCell>>,
    pub total_games_processed: usize,
    pub criteria_evaluated: BTreeSet<String>,
}

impl TeamAggregation {
    pub fn team_names(&self) -> impl Iterator<Item = &str> {
        self.teams.keys().map(String::as_str)
    }
}

#[derive(Default)]
struct RankAccumulator {
    rank_sum: u64,
    count: usize,
}

pub struct AggregationEngine;

impl AggregationEngine {
    /// Fold valid rankings from `results` into per-team averages. Input
    /// order does not matter; games are re-sorted by unit id first.
    pub fn aggregate(results: &[GameResult], resolver: &dyn TeamResolver) -> TeamAggregation {
        let mut ordered: Vec<&GameResult> = results.iter().collect();
        ordered.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));

        let mut cells: BTreeMap<(String, String), RankAccumulator> = BTreeMap::new();
        let mut criteria_evaluated = BTreeSet::new();

        for game in &ordered {
            for criterion_result in game.valid_results() {
                criteria_evaluated.insert(criterion_result.criterion_name.clone());
                let entries = criterion_result
                    .entries()
                    .expect("valid results carry entries");
                for entry in entries {
                    let team = match resolver.team_of(&game.unit_id, &entry.player_name) {
                        Some(team) => team.to_string(),
                        None => {
                            warn!(
                                unit_id = %game.unit_id,
                                player = %entry.player_name,
                                "no team mapping for ranked player"
                            );
                            UNRESOLVED_TEAM.to_string()
                        }
                    };
                    let acc = cells
                        .entry((team, criterion_result.criterion_name.clone()))
                        .or_default();
                    acc.rank_sum += u64::from(entry.rank);
                    acc.count += 1;
                }
            }
        }

        let mut teams: BTreeMap<String, BTreeMap<String, AggregateCell>> = BTreeMap::new();
        for ((team, criterion), acc) in cells {
            teams.entry(team).or_default().insert(
                criterion,
                AggregateCell {
                    average_rank: acc.rank_sum as f64 / acc.count as f64,
                    sample_count: acc.count,
                },
            );
        }

        debug!(
            teams = teams.len(),
            criteria = criteria_evaluated.len(),
            games = ordered.len(),
            "aggregated team standings"
        );

        TeamAggregation {
            teams,
            total_games_processed: ordered.len(),
            criteria_evaluated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CriterionResult, GameResult, Participant, RankingEntry, Unit};
    use std::collections::BTreeMap;

    fn unit(id: &str, players: &[(&str, &str)]) -> Unit {
        Unit {
            unit_id: id.into(),
            participants: players
                .iter()
                .map(|(name, team)| Participant {
                    name: (*name).into(),
                    team: (*team).into(),
                    profile: None,
                })
                .collect(),
        }
    }

    fn game(id: &str, criterion: &str, ranking: &[(&str, u32)]) -> GameResult {
        let entries = ranking
            .iter()
            .map(|(name, rank)| RankingEntry {
                player_name: (*name).into(),
                rank: *rank,
                reasoning: "r".into(),
            })
            .collect();
        let mut results = BTreeMap::new();
        results.insert(
            criterion.to_string(),
            CriterionResult::valid(criterion, entries),
        );
        GameResult {
            unit_id: id.into(),
            size: ranking.len(),
            results,
        }
    }

    #[test]
    fn averages_ranks_across_games() {
        let units = vec![
            unit("g1", &[("p1", "alpha"), ("p2", "beta")]),
            unit("g2", &[("p3", "alpha"), ("p4", "beta")]),
        ];
        let resolver = RosterTeamResolver::from_units(&units);
        // alpha ranks 1 then 2 -> average 1.5 over two samples.
        let results = vec![
            game("g1", "persuasion", &[("p1", 1), ("p2", 2)]),
            game("g2", "persuasion", &[("p4", 1), ("p3", 2)]),
        ];

        let agg = AggregationEngine::aggregate(&results, &resolver);
        let alpha = &agg.teams["alpha"]["persuasion"];
        assert_eq!(alpha.average_rank, 1.5);
        assert_eq!(alpha.sample_count, 2);
        let beta = &agg.teams["beta"]["persuasion"];
        assert_eq!(beta.average_rank, 1.5);
        assert_eq!(agg.total_games_processed, 2);
        assert!(agg.criteria_evaluated.contains("persuasion"));
    }

    #[test]
    fn failed_criteria_contribute_nothing() {
        let units = vec![
            unit("g1", &[("p1", "alpha"), ("p2", "beta")]),
            unit("g2", &[("p1", "alpha"), ("p2", "beta")]),
        ];
        let resolver = RosterTeamResolver::from_units(&units);

        let mut degraded = game("g2", "persuasion", &[("p1", 1), ("p2", 2)]);
        degraded.results.insert(
            "persuasion".into(),
            CriterionResult::failed("persuasion", "retries exhausted", 3),
        );
        let results = vec![game("g1", "persuasion", &[("p1", 2), ("p2", 1)]), degraded];

        let agg = AggregationEngine::aggregate(&results, &resolver);
        let alpha = &agg.teams["alpha"]["persuasion"];
        assert_eq!(alpha.average_rank, 2.0);
        assert_eq!(alpha.sample_count, 1);
        // The degraded game still counts as processed.
        assert_eq!(agg.total_games_processed, 2);
    }

    #[test]
    fn unmapped_players_land_in_the_unresolved_bucket() {
        let units = vec![unit("g1", &[("p1", "alpha")])];
        let resolver = RosterTeamResolver::from_units(&units);
        let results = vec![game("g1", "persuasion", &[("p1", 1), ("ghost", 2)])];

        let agg = AggregationEngine::aggregate(&results, &resolver);
        assert_eq!(agg.teams[UNRESOLVED_TEAM]["persuasion"].average_rank, 2.0);
        assert_eq!(agg.teams["alpha"]["persuasion"].average_rank, 1.0);
    }

    #[test]
    fn aggregation_is_order_insensitive() {
        let units = vec![
            unit("g1", &[("p1", "alpha"), ("p2", "beta")]),
            unit("g2", &[("p1", "alpha"), ("p2", "beta")]),
        ];
        let resolver = RosterTeamResolver::from_units(&units);
        let forward = vec![
            game("g1", "persuasion", &[("p1", 1), ("p2", 2)]),
            game("g2", "persuasion", &[("p1", 2), ("p2", 1)]),
        ];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();

        let a = AggregationEngine::aggregate(&forward, &resolver);
        let b = AggregationEngine::aggregate(&reversed, &resolver);
        assert_eq!(a.teams, b.teams);
    }
}
