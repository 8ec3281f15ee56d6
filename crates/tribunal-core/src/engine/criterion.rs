//! Validation/retry state machine around a single judge call.
//!
//! One evaluator obtains one valid ranking for one criterion on one unit,
//! or fails after a bounded number of attempts. Every attempt makes exactly
//! one external call; transport errors, timeouts, and invalid responses all
//! consume one attempt. The shared semaphore bounds concurrent judge calls
//! across the whole process, not per unit.

use crate::errors::{AttemptFailure, ValidationFailure};
use crate::judge::{FormattedTranscript, Judge, RawRanking};
use crate::model::{Criterion, CriterionResult, RankingEntry, Unit};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{timeout, Duration};
use tracing::debug;

#[derive(Clone)]
pub struct CriterionEvaluator {
    judge: Arc<dyn Judge>,
    judge_permits: Arc<Semaphore>,
    max_retries: u32,
    attempt_timeout: Duration,
}

impl CriterionEvaluator {
    pub fn new(
        judge: Arc<dyn Judge>,
        judge_permits: Arc<Semaphore>,
        max_retries: u32,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            judge,
            judge_permits,
            max_retries,
            attempt_timeout,
        }
    }

    /// Run the attempt loop to a terminal state. Never returns an error:
    /// exhaustion yields a `Failed` result carrying the last failure reason.
    pub async fn evaluate(
        &self,
        unit: &Unit,
        transcript: &FormattedTranscript,
        criterion: &Criterion,
    ) -> CriterionResult {
        let mut last_failure: Option<AttemptFailure> = None;

        for attempt in 1..=self.max_retries {
            match self.attempt(transcript, criterion).await {
                Ok(raw) => match validate_ranking(&raw, unit) {
                    Ok(entries) => {
                        debug!(
                            unit_id = %unit.unit_id,
                            criterion = %criterion.name,
                            attempt,
                            "criterion evaluation accepted"
                        );
                        return CriterionResult::valid(&criterion.name, entries);
                    }
                    Err(failure) => {
                        debug!(
                            unit_id = %unit.unit_id,
                            criterion = %criterion.name,
                            attempt,
                            %failure,
                            "judge response rejected"
                        );
                        last_failure = Some(AttemptFailure::Invalid(failure));
                    }
                },
                Err(failure) => {
                    debug!(
                        unit_id = %unit.unit_id,
                        criterion = %criterion.name,
                        attempt,
                        %failure,
                        "judge attempt failed"
                    );
                    last_failure = Some(failure);
                }
            }
        }

        let reason = last_failure
            .map(|f| f.to_string())
            .unwrap_or_else(|| "no attempts permitted".to_string());
        CriterionResult::failed(&criterion.name, reason, self.max_retries)
    }

    /// One external call: permit, timeout, transport, parse.
    async fn attempt(
        &self,
        transcript: &FormattedTranscript,
        criterion: &Criterion,
    ) -> Result<RawRanking, AttemptFailure> {
        let _permit = self
            .judge_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| AttemptFailure::Call("judge capacity pool closed".into()))?;

        let fut = self.judge.evaluate(transcript, criterion);
        let resp = match timeout(self.attempt_timeout, fut).await {
            Err(_) => {
                return Err(AttemptFailure::Timeout {
                    secs: self.attempt_timeout.as_secs(),
                })
            }
            Ok(Err(e)) => return Err(AttemptFailure::Call(e.to_string())),
            Ok(Ok(resp)) => resp,
        };

        serde_json::from_str::<RawRanking>(&resp.text)
            .map_err(|e| AttemptFailure::Invalid(ValidationFailure::Malformed(e.to_string())))
    }
}

/// Checks in contract order, short-circuiting on the first failure:
/// entry count, roster set equality, rank permutation.
pub(crate) fn validate_ranking(
    raw: &RawRanking,
    unit: &Unit,
) -> Result<Vec<RankingEntry>, ValidationFailure> {
    let size = unit.size();

    if raw.rankings.len() != size {
        return Err(ValidationFailure::EntryCount {
            expected: size,
            got: raw.rankings.len(),
        });
    }

    let roster = unit.participant_names();
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in &raw.rankings {
        *seen.entry(entry.player_name.as_str()).or_default() += 1;
    }
    let named: BTreeSet<&str> = seen.keys().copied().collect();
    if named != roster || seen.values().any(|&n| n > 1) {
        let unknown: Vec<&str> = named.difference(&roster).copied().collect();
        let missing: Vec<&str> = roster.difference(&named).copied().collect();
        let mut parts = Vec::new();
        if !unknown.is_empty() {
            parts.push(format!("unknown: {}", unknown.join(", ")));
        }
        if !missing.is_empty() {
            parts.push(format!("missing: {}", missing.join(", ")));
        }
        if parts.is_empty() {
            parts.push("duplicate player names".to_string());
        }
        return Err(ValidationFailure::RosterMismatch {
            detail: parts.join("; "),
        });
    }

    let ranks: BTreeSet<u32> = raw.rankings.iter().map(|e| e.rank).collect();
    let expected: BTreeSet<u32> = (1..=size as u32).collect();
    if ranks != expected {
        let got: Vec<String> = raw.rankings.iter().map(|e| e.rank.to_string()).collect();
        return Err(ValidationFailure::RankSet {
            size,
            detail: format!("got [{}]", got.join(", ")),
        });
    }

    Ok(raw
        .rankings
        .iter()
        .map(|e| RankingEntry {
            player_name: e.player_name.clone(),
            rank: e.rank,
            reasoning: e.reasoning.clone(),
        })
        .collect())
}
