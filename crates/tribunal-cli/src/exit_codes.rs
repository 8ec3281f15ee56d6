//! Unified exit codes. These are part of the CLI contract: automation
//! distinguishes a clean run from a degraded one without parsing logs.

pub const SUCCESS: i32 = 0;
/// The batch finished but at least one unit failed.
pub const PARTIAL_FAILURE: i32 = 1;
/// Settings or criteria were invalid; nothing was evaluated.
pub const CONFIG_ERROR: i32 = 2;
/// Discovery or another infrastructure problem aborted the run.
pub const INFRA_ERROR: i32 = 3;
