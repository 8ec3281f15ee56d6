//! Batch orchestration: bounded concurrency over units, with per-unit
//! failure isolation.
//!
//! Two limits are in play. The unit semaphore here bounds how many games
//! are in flight; the judge-call semaphore (owned by the criterion
//! evaluator) bounds outstanding judge requests across the whole process,
//! so total pressure on the backend never exceeds it no matter how many
//! units are running.

use crate::errors::EvalError;
use crate::judge::Judge;
use crate::model::{CriterionSet, GameResult, ProcessingSummary, Unit};
use crate::sink::ResultSink;
use crate::source::TranscriptSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::criterion::CriterionEvaluator;
use super::game::GameEvaluator;

/// Concurrency and retry knobs for one run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Units evaluated in parallel.
    pub unit_concurrency: usize,
    /// Judge calls in flight process-wide.
    pub evaluation_concurrency: usize,
    /// Total judge attempts per criterion, first call included.
    pub max_retries: u32,
    pub attempt_timeout: Duration,
}

impl BatchOptions {
    fn validate(&self) -> Result<(), EvalError> {
        if self.unit_concurrency == 0 {
            return Err(EvalError::Config(
                "unit concurrency must be at least 1".into(),
            ));
        }
        if self.evaluation_concurrency == 0 {
            return Err(EvalError::Config(
                "evaluation concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Everything a caller needs after a run: the discovered rosters (for team
/// resolution), every computed game result, and the counters.
#[derive(Debug)]
pub struct BatchOutcome {
    pub units: Vec<Unit>,
    pub results: Vec<GameResult>,
    pub summary: ProcessingSummary,
}

pub struct BatchEngine {
    source: Arc<dyn TranscriptSource>,
    sink: Arc<dyn ResultSink>,
    game_evaluator: GameEvaluator,
    unit_concurrency: usize,
}

impl BatchEngine {
    pub fn new(
        source: Arc<dyn TranscriptSource>,
        sink: Arc<dyn ResultSink>,
        judge: Arc<dyn Judge>,
        options: BatchOptions,
    ) -> Result<Self, EvalError> {
        options.validate()?;
        let judge_permits = Arc::new(Semaphore::new(options.evaluation_concurrency));
        let evaluator = CriterionEvaluator::new(
            judge,
            judge_permits,
            options.max_retries,
            options.attempt_timeout,
        );
        Ok(Self {
            source,
            sink,
            game_evaluator: GameEvaluator::new(evaluator),
            unit_concurrency: options.unit_concurrency,
        })
    }

    /// Run the full batch. Aborts only on discovery problems; anything that
    /// goes wrong inside one unit is folded into the summary.
    pub async fn run(
        &self,
        criteria: &CriterionSet,
        cancel: watch::Receiver<bool>,
    ) -> Result<BatchOutcome, EvalError> {
        let units = self.source.discover().await?;
        if units.is_empty() {
            return Err(EvalError::Discovery(
                "no evaluable units found under the input root".into(),
            ));
        }

        info!(
            total = units.len(),
            unit_concurrency = self.unit_concurrency,
            "starting batch evaluation"
        );

        let semaphore = Arc::new(Semaphore::new(self.unit_concurrency));
        let mut join_set = JoinSet::new();
        let mut admission_cancel = cancel.clone();
        let mut summary = ProcessingSummary {
            total: units.len(),
            ..Default::default()
        };

        for unit in units.clone() {
            if *admission_cancel.borrow() {
                summary.interrupted = true;
                break;
            }
            // Admission waits for a slot so at most `unit_concurrency`
            // tasks exist; cancellation during the wait stops admitting
            // new units without touching the ones already running.
            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = admission_cancel.wait_for(|stop| *stop) => {
                    summary.interrupted = true;
                    break;
                }
            };

            let source = self.source.clone();
            let sink = self.sink.clone();
            let game_evaluator = self.game_evaluator.clone();
            let criteria = criteria.clone();
            let cancel = cancel.clone();
            join_set.spawn(async move {
                let _permit = permit;
                let unit_id = unit.unit_id.clone();
                let outcome = Self::process_unit(
                    &source,
                    &sink,
                    &game_evaluator,
                    &unit,
                    &criteria,
                    &cancel,
                )
                .await;
                (unit_id, outcome)
            });
        }

        let mut results = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((unit_id, Ok(result))) => {
                    let degraded = result.results.values().filter(|r| !r.is_valid()).count();
                    if degraded > 0 {
                        warn!(unit_id = %unit_id, degraded, "✓ unit completed with degraded criteria");
                    } else {
                        info!(unit_id = %unit_id, "✓ unit completed");
                    }
                    summary.completed += 1;
                    results.push(result);
                }
                Ok((unit_id, Err(EvalError::Interrupted))) => {
                    info!(unit_id = %unit_id, "unit stopped by cancellation");
                    summary.interrupted = true;
                }
                Ok((unit_id, Err(err))) => {
                    error!(unit_id = %unit_id, error = %err, "✗ unit failed");
                    summary.failed += 1;
                    match err {
                        EvalError::Transcript { .. } => summary.transcript_failures += 1,
                        EvalError::Persist { .. } => summary.persist_failures += 1,
                        _ => {}
                    }
                }
                Err(join_err) => {
                    error!(error = %join_err, "✗ unit task panicked");
                    summary.failed += 1;
                }
            }
        }

        results.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));

        info!(
            total = summary.total,
            completed = summary.completed,
            failed = summary.failed,
            interrupted = summary.interrupted,
            success_rate = format!("{:.1}%", summary.success_rate() * 100.0),
            "batch evaluation finished"
        );

        Ok(BatchOutcome {
            units,
            results,
            summary,
        })
    }

    async fn process_unit(
        source: &Arc<dyn TranscriptSource>,
        sink: &Arc<dyn ResultSink>,
        game_evaluator: &GameEvaluator,
        unit: &Unit,
        criteria: &CriterionSet,
        cancel: &watch::Receiver<bool>,
    ) -> Result<GameResult, EvalError> {
        if *cancel.borrow() {
            return Err(EvalError::Interrupted);
        }
        let transcript = source.load(&unit.unit_id).await?;
        let result = game_evaluator
            .evaluate(unit, transcript, criteria, cancel)
            .await?;
        sink.persist(unit, &result).await?;
        Ok(result)
    }
}
