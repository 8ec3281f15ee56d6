//! tribunal-core: batch evaluation of recorded multi-agent game
//! transcripts with an external LLM judge.
//!
//! The pipeline discovers units (one recorded game each), evaluates every
//! applicable criterion per unit through a validated, retried judge call,
//! persists one artifact per game, and aggregates valid rankings into
//! team-level standings. Failures stay at the level they occur: a bad
//! judge response costs a retry, a bad criterion degrades one cell of one
//! game, a bad transcript fails one unit, and only discovery or
//! configuration problems abort a run.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod errors;
pub mod judge;
pub mod model;
pub mod report;
pub mod sink;
pub mod source;

pub use aggregate::{AggregationEngine, RosterTeamResolver, TeamAggregation, TeamResolver};
pub use config::{load_criteria, Settings};
pub use engine::{BatchEngine, BatchOptions, BatchOutcome};
pub use errors::{AttemptFailure, EvalError, ValidationFailure};
pub use judge::{FormattedTranscript, Judge, JudgeResponse};
pub use model::{
    Criterion, CriterionOutcome, CriterionResult, CriterionSet, GameResult, Participant,
    ProcessingSummary, RankingEntry, Unit,
};
pub use report::SummaryExporter;
pub use sink::{FsResultSink, GameArtifact, ResultSink};
pub use source::{FsTranscriptSource, TranscriptSource};
