//! Per-unit evaluation: one criterion evaluator per applicable criterion,
//! run concurrently and merged into a single [`GameResult`].

use crate::errors::EvalError;
use crate::judge::FormattedTranscript;
use crate::model::{CriterionResult, CriterionSet, GameResult, Unit};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::criterion::CriterionEvaluator;

#[derive(Clone)]
pub struct GameEvaluator {
    evaluator: CriterionEvaluator,
}

impl GameEvaluator {
    pub fn new(evaluator: CriterionEvaluator) -> Self {
        Self { evaluator }
    }

    /// Evaluate every applicable criterion for one unit. A `Failed`
    /// criterion is recorded in the result, never escalated; the only
    /// errors out of here are cancellation and fatal unit-level problems
    /// raised by the caller's transcript handling.
    pub async fn evaluate(
        &self,
        unit: &Unit,
        transcript: FormattedTranscript,
        criteria: &CriterionSet,
        cancel: &watch::Receiver<bool>,
    ) -> Result<GameResult, EvalError> {
        let applicable = criteria.criteria_for_size(unit.size());
        if applicable.is_empty() {
            warn!(
                unit_id = %unit.unit_id,
                size = unit.size(),
                "no evaluation criteria apply to this unit size"
            );
            return Ok(GameResult {
                unit_id: unit.unit_id.clone(),
                size: unit.size(),
                results: BTreeMap::new(),
            });
        }

        info!(
            unit_id = %unit.unit_id,
            criteria = applicable.len(),
            "starting criterion evaluations"
        );

        let unit = Arc::new(unit.clone());
        let transcript = Arc::new(transcript);
        let mut join_set = JoinSet::new();
        for criterion in applicable {
            let evaluator = self.evaluator.clone();
            let unit = unit.clone();
            let transcript = transcript.clone();
            let mut cancel = cancel.clone();
            join_set.spawn(async move {
                if *cancel.borrow() {
                    return Err(EvalError::Interrupted);
                }
                tokio::select! {
                    result = evaluator.evaluate(&unit, &transcript, &criterion) => Ok(result),
                    _ = cancel.wait_for(|stop| *stop) => Err(EvalError::Interrupted),
                }
            });
        }

        let mut results: BTreeMap<String, CriterionResult> = BTreeMap::new();
        let mut interrupted = false;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(Ok(result)) => {
                    results.insert(result.criterion_name.clone(), result);
                }
                Ok(Err(EvalError::Interrupted)) => interrupted = true,
                Ok(Err(other)) => return Err(other),
                Err(e) => {
                    return Err(EvalError::Transcript {
                        unit_id: unit.unit_id.clone(),
                        detail: format!("criterion task panicked: {e}"),
                    })
                }
            }
        }
        if interrupted {
            return Err(EvalError::Interrupted);
        }

        info!(
            unit_id = %unit.unit_id,
            valid = results.values().filter(|r| r.is_valid()).count(),
            failed = results.values().filter(|r| !r.is_valid()).count(),
            "completed criterion evaluations"
        );

        Ok(GameResult {
            unit_id: unit.unit_id.clone(),
            size: unit.size(),
            results,
        })
    }
}
