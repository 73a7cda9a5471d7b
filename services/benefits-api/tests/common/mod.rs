use axum::body::Body;
use benefits_api::app::{AppState, build_router};
use benefits_api::auth::directory::PrincipalDirectory;
use benefits_api::service::ApplicationService;

pub const DIRECTORY: &str = r#"
roles:
  - name: member
    scope: own
    permissions: [applications.read, applications.create, applications.update]
  - name: caseworker
    scope: unit
    permissions: ["applications.*"]
  - name: reviewer
    scope: unit
    permissions: [applications.read, applications.review]
  - name: auditor
    scope: unrestricted
    permissions: ["admin.*"]
principals:
  - principal_id: alice
    unit_id: north
    roles: [member]
  - principal_id: bob
    unit_id: south
    roles: [member]
  - principal_id: carol
    unit_id: north
    roles: [member, caseworker]
  - principal_id: sam
    unit_id: south
    roles: [caseworker]
  - principal_id: rita
    unit_id: north
    roles: [reviewer]
  - principal_id: root
    roles: [auditor]
"#;

pub type App = axum::routing::RouterIntoService<Body, ()>;

pub fn app() -> App {
    let directory = PrincipalDirectory::from_yaml_str(DIRECTORY).expect("directory");
    let state = AppState::new(directory, ApplicationService::in_memory()).expect("state");
    build_router(state).into_service()
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
