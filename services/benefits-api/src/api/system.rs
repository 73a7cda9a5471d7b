//! System API handlers.
//!
//! Health checks must stay fast and side-effect free; they are public and run
//! without a scope context.
use crate::api::error::{ApiError, api_repository};
use crate::api::openapi::ApiDoc;
use crate::api::types::HealthStatus;
use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use utoipa::OpenApi;

#[utoipa::path(
    get,
    path = "/v1/system/health",
    tag = "system",
    responses(
        (status = 200, description = "Service health", body = HealthStatus)
    )
)]
/// Check the datastore and report the backend in use.
///
/// # Errors
/// - Returns 500 if the datastore health check fails.
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    let backend = state
        .applications
        .health()
        .await
        .map_err(|err| api_repository("storage unavailable", err))?;
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        backend: backend.to_string(),
    }))
}

pub(crate) async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
