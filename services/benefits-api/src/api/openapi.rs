//! OpenAPI schema aggregation for the benefits API.
use crate::api::{
    applications, system,
    types::{
        ApplicationCreateRequest, ApplicationListResponse, CountResponse, ErrorResponse,
        HealthStatus,
    },
};
use crate::model::{ApplicationPatchRequest, ApplicationStatus, BenefitApplication};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "benefits-api",
        version = "v1",
        description = "Benefits administration HTTP API"
    ),
    paths(
        system::system_health,
        applications::list_applications,
        applications::create_application,
        applications::count_applications,
        applications::get_application,
        applications::patch_application,
        applications::delete_application,
        applications::list_all_applications,
    ),
    components(schemas(
        ApplicationCreateRequest,
        ApplicationListResponse,
        ApplicationPatchRequest,
        ApplicationStatus,
        BenefitApplication,
        CountResponse,
        ErrorResponse,
        HealthStatus,
    )),
    tags(
        (name = "applications", description = "Scoped benefit applications"),
        (name = "admin", description = "Unscoped administrative views"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_application_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|path| path.as_str() == "/v1/applications"));
        assert!(
            paths
                .iter()
                .any(|path| path.as_str() == "/v1/applications/{application_id}")
        );
        assert!(paths.iter().any(|path| path.as_str() == "/v1/admin/applications"));
    }
}
