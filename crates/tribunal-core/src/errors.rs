//! Error taxonomy for the pipeline.
//!
//! Propagation policy: criterion-level problems never escalate past the
//! game evaluator (they become `Failed` criterion results); unit-level
//! problems never escalate past the batch engine (they become `failed`
//! counts); only discovery and configuration problems abort the run.

use thiserror::Error;

/// Fatal and unit-level failures. Retryable judge problems are represented
/// by [`AttemptFailure`] instead and never surface through this type.
#[derive(Debug, Error)]
pub enum EvalError {
    /// Input root unreadable or no units found. Fatal to the whole run.
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// A unit's backing files are missing or unparseable. Fatal to that
    /// unit only.
    #[error("transcript unusable for unit '{unit_id}': {detail}")]
    Transcript { unit_id: String, detail: String },

    /// A computed result could not be written. Fatal to the unit's output,
    /// reported separately from computation failures.
    #[error("failed to persist result for unit '{unit_id}': {detail}")]
    Persist { unit_id: String, detail: String },

    /// Invalid settings or criteria definitions. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// The run was stopped by an operator signal. Not a failure; the batch
    /// reports itself as interrupted instead.
    #[error("run interrupted")]
    Interrupted,
}

/// Why one judge response was rejected, in check order. Each variant is a
/// distinct reportable reason; the state machine keeps the last one when
/// attempts run out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("expected {expected} ranking entries, got {got}")]
    EntryCount { expected: usize, got: usize },

    #[error("ranked players do not match the roster ({detail})")]
    RosterMismatch { detail: String },

    #[error("rank values are not a permutation of 1..={size} ({detail})")]
    RankSet { size: usize, detail: String },

    #[error("malformed judge response: {0}")]
    Malformed(String),
}

/// One consumed attempt: a transport/API error, a timeout, or a response
/// that failed validation. All three cost exactly one retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("judge call failed: {0}")]
    Call(String),

    #[error("judge call timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error(transparent)]
    Invalid(ValidationFailure),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_reasons_are_distinct_and_readable() {
        let count = AttemptFailure::Invalid(ValidationFailure::EntryCount {
            expected: 5,
            got: 4,
        });
        assert_eq!(count.to_string(), "expected 5 ranking entries, got 4");

        let timeout = AttemptFailure::Timeout { secs: 30 };
        assert_eq!(timeout.to_string(), "judge call timed out after 30s");

        let malformed = AttemptFailure::Invalid(ValidationFailure::Malformed(
            "expected JSON object".into(),
        ));
        assert!(malformed.to_string().starts_with("malformed judge response"));
    }
}
