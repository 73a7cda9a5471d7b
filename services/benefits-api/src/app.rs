//! Benefits HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, registers every route's permission, and defines the
//! shared application state injected into handlers and the authorization
//! boundary.
use crate::api;
use crate::auth::{self, directory::PrincipalDirectory};
use crate::service::ApplicationService;
use axum::Router;
use axum::routing::get;
use benefits_authz::{AuthzResult, RouteTable};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<PrincipalDirectory>,
    pub routes: Arc<RouteTable>,
    pub applications: ApplicationService,
}

impl AppState {
    pub fn new(directory: PrincipalDirectory, applications: ApplicationService) -> AuthzResult<Self> {
        Ok(Self {
            directory: Arc::new(directory),
            routes: Arc::new(route_table()?),
            applications,
        })
    }
}

/// Permission required by each route. Anything missing here is denied.
pub fn route_table() -> AuthzResult<RouteTable> {
    let mut routes = RouteTable::new();
    routes.register_public("GET", api::ROUTE_HEALTH)?;
    routes.register_public("GET", api::ROUTE_OPENAPI)?;
    routes.register("GET", api::ROUTE_APPLICATIONS, auth::PERM_APPLICATIONS_READ)?;
    routes.register("POST", api::ROUTE_APPLICATIONS, auth::PERM_APPLICATIONS_CREATE)?;
    routes.register("GET", api::ROUTE_APPLICATION_COUNT, auth::PERM_APPLICATIONS_READ)?;
    routes.register("GET", api::ROUTE_APPLICATION, auth::PERM_APPLICATIONS_READ)?;
    routes.register(
        "PATCH",
        api::ROUTE_APPLICATION,
        &format!(
            "{},{}",
            auth::PERM_APPLICATIONS_UPDATE,
            auth::PERM_APPLICATIONS_REVIEW
        ),
    )?;
    routes.register("DELETE", api::ROUTE_APPLICATION, auth::PERM_APPLICATIONS_DELETE)?;
    routes.register(
        "GET",
        api::ROUTE_ADMIN_APPLICATIONS,
        auth::PERM_ADMIN_APPLICATIONS_READ,
    )?;
    Ok(routes)
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            )
        });

    Router::new()
        .route(api::ROUTE_HEALTH, get(api::system::system_health))
        .route(api::ROUTE_OPENAPI, get(api::system::openapi_document))
        .route(
            api::ROUTE_APPLICATIONS,
            get(api::applications::list_applications)
                .post(api::applications::create_application),
        )
        .route(
            api::ROUTE_APPLICATION_COUNT,
            get(api::applications::count_applications),
        )
        .route(
            api::ROUTE_APPLICATION,
            get(api::applications::get_application)
                .patch(api::applications::patch_application)
                .delete(api::applications::delete_application),
        )
        .route(
            api::ROUTE_ADMIN_APPLICATIONS,
            get(api::applications::list_all_applications),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::boundary::authorize_request,
        ))
        .layer(trace_layer)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use benefits_authz::RouteRequirement;

    #[test]
    fn every_route_is_registered() {
        let routes = route_table().expect("route table");
        assert_eq!(
            routes.required_for("GET", api::ROUTE_HEALTH),
            RouteRequirement::Public
        );
        assert_eq!(
            routes.required_for("PATCH", api::ROUTE_APPLICATION),
            RouteRequirement::Permission("applications.update,applications.review")
        );
        assert_eq!(
            routes.required_for("PUT", api::ROUTE_APPLICATION),
            RouteRequirement::Unregistered
        );
        assert_eq!(routes.len(), 8);
    }
}
