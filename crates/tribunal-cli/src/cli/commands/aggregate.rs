//! `tribunal aggregate`: rebuild the team reports from result artifacts
//! already on disk, without any judge traffic.

use super::super::args::AggregateArgs;
use super::fail;
use crate::exit_codes;
use tribunal_core::aggregate::{AggregationEngine, RosterTeamResolver};
use tribunal_core::config::{load_criteria, Settings};
use tribunal_core::errors::EvalError;
use tribunal_core::report::SummaryExporter;
use tribunal_core::sink::read_artifacts;

pub async fn run(args: AggregateArgs) -> anyhow::Result<i32> {
    let settings = match Settings::load(&args.config) {
        Ok(s) => s,
        Err(e) => return Ok(fail(&e)),
    };
    let criteria = match load_criteria(&settings.criteria_path) {
        Ok(c) => c,
        Err(e) => return Ok(fail(&e)),
    };
    let results_dir = args
        .results_dir
        .unwrap_or_else(|| settings.processing.output_dir.clone());

    let artifacts = match read_artifacts(&results_dir) {
        Ok(artifacts) => artifacts,
        Err(e) => return Ok(fail(&e)),
    };
    if artifacts.is_empty() {
        let err = EvalError::Discovery(format!(
            "no result artifacts found under {}",
            results_dir.display()
        ));
        return Ok(fail(&err));
    }

    let mut results = Vec::with_capacity(artifacts.len());
    let mut resolver = RosterTeamResolver::default();
    for artifact in artifacts {
        let (result, teams) = artifact.into_parts();
        resolver.insert(result.unit_id.clone(), teams);
        results.push(result);
    }

    let aggregation = AggregationEngine::aggregate(&results, &resolver);
    let exporter = SummaryExporter::new(&results_dir);
    if let Err(e) = exporter.export(&aggregation, &criteria) {
        return Ok(fail(&e));
    }

    println!(
        "Aggregated {} games across {} teams ({} criteria)",
        aggregation.total_games_processed,
        aggregation.teams.len(),
        aggregation.criteria_evaluated.len()
    );
    Ok(exit_codes::SUCCESS)
}
