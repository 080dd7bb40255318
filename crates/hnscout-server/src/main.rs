mod api;
mod middleware;
mod runner;
mod scheduler;

use std::sync::Arc;

use hnscout_core::{AppConfig, Environment};
use hnscout_db::StateStore;
use hnscout_detect::{ClassifyError, LlmClassifier};
use hnscout_hn::HnClient;
use hnscout_pipeline::Pipeline;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    runner::RunService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = hnscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store = hnscout_db::open_store(&config).await?;
    let cancel = CancellationToken::new();
    let runner = build_runner(&config, Arc::clone(&store), cancel.clone())?;

    let _scheduler = match &runner {
        Some(runner) => {
            Some(scheduler::build_scheduler(Arc::clone(runner), &config.schedule).await?)
        }
        None => None,
    };

    let auth = AuthState::from_keys(&config.api_keys, config.env == Environment::Development)?;
    let state = AppState {
        store,
        runner,
        report_limit: config.report_limit,
        report_days: config.report_days,
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel))
        .await?;
    Ok(())
}

/// Wire the pipeline for API and scheduled runs.
///
/// Without an LLM API key the server still serves reads; runs stay disabled.
fn build_runner(
    config: &AppConfig,
    store: Arc<dyn StateStore>,
    cancel: CancellationToken,
) -> anyhow::Result<Option<Arc<RunService>>> {
    let classifier = match LlmClassifier::from_settings(&config.llm) {
        Ok(classifier) => classifier,
        Err(ClassifyError::MissingApiKey) => {
            tracing::warn!("HNSCOUT_LLM_API_KEY not set; runs disabled, serving reads only");
            return Ok(None);
        }
        Err(e) => anyhow::bail!("failed to build classifier: {e}"),
    };
    let source = HnClient::from_settings(&config.hn)
        .map_err(|e| anyhow::anyhow!("failed to build Hacker News client: {e}"))?;

    let pipeline = Pipeline::new(store, Arc::new(classifier), config.thresholds);
    Ok(Some(Arc::new(RunService::new(
        pipeline,
        Arc::new(source),
        config.lookback_days,
        cancel,
    ))))
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
    cancel.cancel();
}
