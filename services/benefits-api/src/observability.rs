//! Observability wiring for the benefits service.
//!
//! # Purpose
//! Initializes structured logging and the Prometheus metrics recorder, and
//! serves the rendered metrics on a separate listener.
//!
//! # Notes
//! Initialization is guarded by `OnceLock` to keep startup idempotent in tests.
use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static OBS_INIT: OnceLock<()> = OnceLock::new();

pub fn init_observability(service_name: &str) -> anyhow::Result<PrometheusHandle> {
    OBS_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init();
        tracing::info!(service = service_name, "observability initialized");
    });

    let handle = install_metrics_recorder()?;
    describe_metrics();
    Ok(handle)
}

fn describe_metrics() {
    metrics::describe_counter!(
        "benefits_scoped_operations_total",
        "Repository operations by operation and scope tier"
    );
    metrics::describe_counter!(
        "benefits_scope_context_missing_total",
        "Scoped repository calls made without an installed scope context"
    );
    metrics::describe_counter!(
        "benefits_authz_denied_total",
        "Requests rejected at the authorization boundary"
    );
    metrics::describe_gauge!("benefits_rows_total", "Rows held by the datastore");
}

pub fn metrics_router(handle: PrometheusHandle) -> axum::Router {
    axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

async fn serve_metrics(handle: PrometheusHandle, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_metrics_with_listener(handle, listener, std::future::pending()).await
}

/// Run the metrics listener on its own task.
///
/// A listener failure (bind error, accept loop error) is logged when it
/// happens and returned through the handle, so it is never lost behind the
/// API listener.
pub fn spawn_metrics_listener(
    handle: PrometheusHandle,
    addr: SocketAddr,
) -> tokio::task::JoinHandle<std::io::Result<()>> {
    tokio::spawn(async move {
        let result = serve_metrics(handle, addr).await;
        if let Err(err) = &result {
            tracing::error!(%addr, error = %err, "metrics listener stopped");
        }
        result
    })
}

async fn serve_metrics_with_listener<F>(
    handle: PrometheusHandle,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, metrics_router(handle).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

fn install_metrics_recorder() -> anyhow::Result<PrometheusHandle> {
    if let Some(handle) = METRICS_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("install metrics recorder")?;
    let _ = METRICS_HANDLE.set(handle.clone());
    Ok(handle)
}
