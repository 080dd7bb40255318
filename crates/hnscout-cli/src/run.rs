//! `run` and `historical` command handlers.

use std::path::Path;
use std::sync::Arc;

use hnscout_core::AppConfig;
use hnscout_detect::LlmClassifier;
use hnscout_hn::HnClient;
use hnscout_pipeline::{Pipeline, RunReport};
use tokio_util::sync::CancellationToken;

use crate::report;

struct Runtime {
    pipeline: Pipeline,
    source: HnClient,
    cancel: CancellationToken,
}

async fn build_runtime(config: &AppConfig) -> anyhow::Result<Runtime> {
    let classifier = LlmClassifier::from_settings(&config.llm)
        .map_err(|e| anyhow::anyhow!("failed to build classifier: {e}"))?;
    let source = HnClient::from_settings(&config.hn)
        .map_err(|e| anyhow::anyhow!("failed to build Hacker News client: {e}"))?;
    let store = hnscout_db::open_store(config).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; finishing current item then stopping");
            on_interrupt.cancel();
        }
    });

    Ok(Runtime {
        pipeline: Pipeline::new(store, Arc::new(classifier), config.thresholds),
        source,
        cancel,
    })
}

/// Incremental run, falling back to a historical scan on an empty store.
///
/// # Errors
///
/// Returns an error if setup fails or the run aborts as a whole.
pub(crate) async fn run_incremental(config: &AppConfig) -> anyhow::Result<()> {
    let rt = build_runtime(config).await?;
    let report = rt
        .pipeline
        .run_incremental(&rt.source, config.lookback_days, &rt.cancel)
        .await?;
    finish(&rt, config, &report).await
}

/// Historical scan over the last `days` days.
///
/// # Errors
///
/// Returns an error if setup fails or the run aborts as a whole.
pub(crate) async fn run_historical(config: &AppConfig, days: u32) -> anyhow::Result<()> {
    let rt = build_runtime(config).await?;
    let report = rt
        .pipeline
        .run_historical(&rt.source, days, &rt.cancel)
        .await?;
    finish(&rt, config, &report).await
}

async fn finish(rt: &Runtime, config: &AppConfig, report: &RunReport) -> anyhow::Result<()> {
    let summary = &report.summary;
    println!(
        "{} run {}: fetched {}, candidates {}, processed {}, accepted {}, classification failures {}, persistence errors {}",
        report.record.mode,
        report.record.status,
        summary.fetched,
        summary.candidates,
        summary.processed(),
        summary.accepted,
        summary.classification_failed,
        summary.persistence_errors,
    );

    let snapshot = hnscout_pipeline::build_snapshot(
        rt.pipeline.store().as_ref(),
        config.report_limit,
        config.report_days,
    )
    .await?;
    print!("{}", report::render_console(&snapshot));

    for path in report::write_run_reports(
        summary,
        &snapshot,
        Path::new(report::DEFAULT_OUTPUT_DIR),
    )? {
        tracing::info!(path = %path.display(), "report written");
    }
    Ok(())
}
