//! Authorization boundary middleware.
//!
//! # Purpose
//! Runs before every handler on the API router:
//! 1. Looks the matched route up in the route table. Unregistered routes are
//!    denied; public routes run without identity.
//! 2. Reads the principal id set by the upstream gateway and resolves it in
//!    the principal directory.
//! 3. Checks the route's required permission against the principal's grants.
//! 4. Runs the rest of the request inside the principal's scope context.
//!
//! # Security considerations
//! - Missing or unknown principals get 401; missing grants get 403.
//! - Denials never say which permission was missing.
//! - The scope context is bound to the request future, so it cannot leak into
//!   other requests sharing a worker thread.
use crate::api::error::{ApiError, api_forbidden, api_internal_message, api_unauthorized};
use crate::app::AppState;
use axum::extract::{MatchedPath, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use benefits_authz::RouteRequirement;
use benefits_scope::ScopeContextHolder;

pub const PRINCIPAL_HEADER: &str = "x-principal-id";

fn principal_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(PRINCIPAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn denied(reason: &'static str) {
    metrics::counter!("benefits_authz_denied_total", "reason" => reason).increment(1);
}

pub async fn authorize_request(
    State(state): State<AppState>,
    matched: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let method = request.method().as_str().to_string();
    let route = matched
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let permission = match state.routes.required_for(&method, &route) {
        RouteRequirement::Public => {
            return Ok(ScopeContextHolder::isolate(next.run(request)).await);
        }
        RouteRequirement::Unregistered => {
            denied("unregistered_route");
            tracing::warn!(%method, %route, "request to route without a permission registration");
            return Err(api_forbidden("insufficient permissions"));
        }
        RouteRequirement::Permission(permission) => permission.to_string(),
    };

    let Some(principal_id) = principal_from_headers(request.headers()) else {
        denied("missing_principal");
        return Err(api_unauthorized("missing principal"));
    };
    let Some(principal) = state.directory.resolve(&principal_id) else {
        denied("unknown_principal");
        tracing::warn!(principal = %principal_id, "unknown principal");
        return Err(api_unauthorized("unknown principal"));
    };

    if !principal.matcher().allows(&permission) {
        denied("missing_permission");
        tracing::warn!(
            principal = %principal_id,
            %method,
            %route,
            "permission check failed"
        );
        return Err(api_forbidden("insufficient permissions"));
    }

    let context = principal.scope_context().map_err(|err| {
        tracing::error!(principal = %principal_id, error = %err, "cannot build scope context");
        api_internal_message("internal error")
    })?;
    tracing::debug!(
        principal = %principal_id,
        tier = %context.tier(),
        unit = context.unit_id().unwrap_or("-"),
        %route,
        "request authorized"
    );
    Ok(ScopeContextHolder::run_async(context, next.run(request)).await)
}
