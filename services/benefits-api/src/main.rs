//! Benefits service entry point.
//!
//! # Purpose
//! Wires configuration, observability, the principal directory, and the
//! in-memory datastore, then serves the API and metrics listeners.
use anyhow::Context;
use benefits_api::app::{AppState, build_router};
use benefits_api::auth::directory::PrincipalDirectory;
use benefits_api::config::BenefitsConfig;
use benefits_api::observability;
use benefits_api::service::ApplicationService;
use std::future::Future;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BenefitsConfig::from_env_or_yaml().context("benefits config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: BenefitsConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("benefits-api")?;
    let state = build_state(&config)?;
    let metrics_task = observability::spawn_metrics_listener(metrics_handle, config.metrics_bind);

    let app = build_router(state);
    let addr = config.bind_addr;
    tracing::info!(%addr, metrics = %config.metrics_bind, "benefits api listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    match metrics_task.await {
        Ok(Ok(())) => {}
        // Already logged by the listener task.
        Ok(Err(_)) => {}
        Err(err) if err.is_cancelled() => {}
        Err(err) => tracing::error!(error = %err, "metrics listener task panicked"),
    }
    Ok(())
}

fn build_state(config: &BenefitsConfig) -> anyhow::Result<AppState> {
    let path = config
        .directory_path
        .as_deref()
        .context("BENEFITS_DIRECTORY must name the principal directory file")?;
    let directory = PrincipalDirectory::load(path)?;
    let applications = ApplicationService::in_memory();
    AppState::new(directory, applications).context("register route permissions")
}
