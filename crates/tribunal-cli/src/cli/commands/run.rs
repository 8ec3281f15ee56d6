//! `tribunal run`: the full pipeline, discovery through aggregation
//! reports, with Ctrl-C wired to graceful cancellation.

use super::super::args::RunArgs;
use super::fail;
use crate::exit_codes;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tribunal_core::aggregate::{AggregationEngine, RosterTeamResolver};
use tribunal_core::config::{load_criteria, Settings};
use tribunal_core::engine::BatchEngine;
use tribunal_core::judge::openai::OpenAiJudge;
use tribunal_core::report::SummaryExporter;
use tribunal_core::sink::FsResultSink;
use tribunal_core::source::FsTranscriptSource;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let mut settings = match Settings::load(&args.config) {
        Ok(s) => s,
        Err(e) => return Ok(fail(&e)),
    };
    if let Some(input_dir) = args.input_dir {
        settings.processing.input_dir = input_dir;
    }
    if let Some(output_dir) = args.output_dir {
        settings.processing.output_dir = output_dir;
    }

    let criteria = match load_criteria(&settings.criteria_path) {
        Ok(c) => c,
        Err(e) => return Ok(fail(&e)),
    };
    let api_key = match settings.api_key() {
        Ok(k) => k,
        Err(e) => return Ok(fail(&e)),
    };

    if let Err(e) = std::fs::create_dir_all(&settings.processing.output_dir) {
        eprintln!(
            "error: cannot create output directory {}: {e}",
            settings.processing.output_dir.display()
        );
        return Ok(exit_codes::INFRA_ERROR);
    }

    let judge = Arc::new(OpenAiJudge::new(
        settings.judge.model.clone(),
        api_key,
        settings.judge.temperature,
        settings.judge.max_tokens,
    ));
    let engine = match BatchEngine::new(
        Arc::new(FsTranscriptSource::new(&settings.processing.input_dir)),
        Arc::new(FsResultSink::new(&settings.processing.output_dir)),
        judge,
        settings.batch_options(),
    ) {
        Ok(engine) => engine,
        Err(e) => return Ok(fail(&e)),
    };

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing in-flight work");
            let _ = cancel_tx.send(true);
        }
    });

    let outcome = match engine.run(&criteria, cancel_rx).await {
        Ok(outcome) => outcome,
        Err(e) => return Ok(fail(&e)),
    };

    let resolver = RosterTeamResolver::from_units(&outcome.units);
    let aggregation = AggregationEngine::aggregate(&outcome.results, &resolver);
    let exporter = SummaryExporter::new(&settings.processing.output_dir);
    if let Err(e) = exporter.export(&aggregation, &criteria) {
        return Ok(fail(&e));
    }

    let summary = &outcome.summary;
    info!(
        teams = aggregation.teams.len(),
        criteria = aggregation.criteria_evaluated.len(),
        "aggregation reports written"
    );
    println!(
        "Processing complete: {}/{} games evaluated ({:.1}% success rate){}",
        summary.completed,
        summary.total,
        summary.success_rate() * 100.0,
        if summary.interrupted {
            " [interrupted]"
        } else {
            ""
        }
    );

    if summary.failed > 0 || summary.interrupted {
        Ok(exit_codes::PARTIAL_FAILURE)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}
