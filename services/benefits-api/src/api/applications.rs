//! Benefit application API handlers.
//!
//! # Purpose
//! Implements submission, listing, lookup, amendment, and withdrawal of
//! benefit applications, plus the unscoped admin listing.
//!
//! # Security considerations
//! Handlers run inside the caller's scope context. A row outside that scope
//! is indistinguishable from a missing row in every response.
use crate::api::error::{ApiError, api_not_found, api_repository, api_validation_error};
use crate::api::types::{
    ApplicationCountQuery, ApplicationCreateRequest, ApplicationListQuery,
    ApplicationListResponse, CountResponse,
};
use crate::app::AppState;
use crate::model::{ApplicationPatchRequest, BenefitApplication};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/v1/applications",
    tag = "applications",
    params(ApplicationListQuery),
    responses(
        (status = 200, description = "Applications visible to the caller", body = ApplicationListResponse),
        (status = 401, description = "Unknown principal", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Missing permission", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ApplicationListQuery>,
) -> Result<Json<ApplicationListResponse>, ApiError> {
    let items = state
        .applications
        .list(query.status, query.page_size(), query.offset.unwrap_or(0))
        .await
        .map_err(|err| api_repository("failed to list applications", err))?;
    Ok(Json(ApplicationListResponse { items }))
}

#[utoipa::path(
    post,
    path = "/v1/applications",
    tag = "applications",
    request_body = ApplicationCreateRequest,
    responses(
        (status = 201, description = "Application submitted", body = BenefitApplication),
        (status = 400, description = "Invalid application", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_application(
    State(state): State<AppState>,
    Json(body): Json<ApplicationCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.benefit_type.trim().is_empty() {
        return Err(api_validation_error("benefit_type must not be empty"));
    }
    if body.amount_cents < 0 {
        return Err(api_validation_error("amount_cents must not be negative"));
    }
    let created = state
        .applications
        .submit(body)
        .await
        .map_err(|err| api_repository("failed to submit application", err))?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/v1/applications/count",
    tag = "applications",
    params(ApplicationCountQuery),
    responses(
        (status = 200, description = "Number of applications visible to the caller", body = CountResponse)
    )
)]
pub(crate) async fn count_applications(
    State(state): State<AppState>,
    Query(query): Query<ApplicationCountQuery>,
) -> Result<Json<CountResponse>, ApiError> {
    let count = state
        .applications
        .count(query.status)
        .await
        .map_err(|err| api_repository("failed to count applications", err))?;
    Ok(Json(CountResponse { count }))
}

#[utoipa::path(
    get,
    path = "/v1/applications/{application_id}",
    tag = "applications",
    params(("application_id" = Uuid, Path, description = "Application identifier")),
    responses(
        (status = 200, description = "Fetch application", body = BenefitApplication),
        (status = 404, description = "Application not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_application(
    Path(application_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<BenefitApplication>, ApiError> {
    match state.applications.get(application_id).await {
        Ok(Some(application)) => Ok(Json(application)),
        Ok(None) => Err(api_not_found("benefit application not found")),
        Err(err) => Err(api_repository("failed to fetch application", err)),
    }
}

#[utoipa::path(
    patch,
    path = "/v1/applications/{application_id}",
    tag = "applications",
    params(("application_id" = Uuid, Path, description = "Application identifier")),
    request_body = ApplicationPatchRequest,
    responses(
        (status = 200, description = "Application updated", body = BenefitApplication),
        (status = 404, description = "Application not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn patch_application(
    Path(application_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(body): Json<ApplicationPatchRequest>,
) -> Result<Json<BenefitApplication>, ApiError> {
    if body.amount_cents.is_some_and(|amount| amount < 0) {
        return Err(api_validation_error("amount_cents must not be negative"));
    }
    let updated = state
        .applications
        .amend(application_id, body)
        .await
        .map_err(|err| api_repository("failed to update application", err))?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/v1/applications/{application_id}",
    tag = "applications",
    params(("application_id" = Uuid, Path, description = "Application identifier")),
    responses(
        (status = 204, description = "Application withdrawn"),
        (status = 404, description = "Application not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_application(
    Path(application_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state
        .applications
        .withdraw(application_id)
        .await
        .map_err(|err| api_repository("failed to withdraw application", err))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/admin/applications",
    tag = "admin",
    responses(
        (status = 200, description = "Every application, unscoped", body = ApplicationListResponse),
        (status = 403, description = "Missing admin permission", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_all_applications(
    State(state): State<AppState>,
) -> Result<Json<ApplicationListResponse>, ApiError> {
    let items = state
        .applications
        .list_all()
        .await
        .map_err(|err| api_repository("failed to list applications", err))?;
    Ok(Json(ApplicationListResponse { items }))
}
