use super::args::{Cli, Command};
use crate::exit_codes;
use tribunal_core::errors::EvalError;

pub mod aggregate;
pub mod run;
pub mod validate;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Aggregate(args) => aggregate::run(args).await,
        Command::Validate(args) => validate::run(args).await,
    }
}

/// Map a pipeline error to the exit-code contract and report it.
pub(crate) fn fail(err: &EvalError) -> i32 {
    eprintln!("error: {err}");
    match err {
        EvalError::Config(_) => exit_codes::CONFIG_ERROR,
        _ => exit_codes::INFRA_ERROR,
    }
}
