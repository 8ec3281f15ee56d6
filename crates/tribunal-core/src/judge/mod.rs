//! Judge backends: the external scoring oracle invoked once per
//! (unit, criterion) attempt.

pub mod fake;
pub mod openai;
pub mod prompt;

use crate::model::Criterion;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A unit's transcript rendered for the judge, together with the roster
/// the judge is asked to rank.
#[derive(Debug, Clone)]
pub struct FormattedTranscript {
    pub unit_id: String,
    /// Participant names in roster order.
    pub participants: Vec<String>,
    /// Character/profile lines shown alongside the log, may be empty.
    pub character_info: String,
    /// The rendered game log.
    pub text: String,
}

/// Raw judge output before validation. The text is expected to be a JSON
/// object matching [`RawRanking`], but nothing is guaranteed until the
/// criterion evaluator has checked it.
#[derive(Debug, Clone)]
pub struct JudgeResponse {
    pub text: String,
    pub backend: String,
    pub model: String,
}

/// The JSON shape the judge is asked to produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRanking {
    pub rankings: Vec<RawRankingEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRankingEntry {
    pub player_name: String,
    pub rank: u32,
    pub reasoning: String,
}

/// Capability interface over judge backends. One external call per
/// invocation; transport and API errors are retryable by the caller.
#[async_trait]
pub trait Judge: Send + Sync {
    async fn evaluate(
        &self,
        transcript: &FormattedTranscript,
        criterion: &Criterion,
    ) -> anyhow::Result<JudgeResponse>;

    fn backend_name(&self) -> &'static str;
}
