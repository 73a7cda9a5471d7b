//! HTTP API handlers for the benefits service.
//!
//! # Purpose
//! Groups the application, admin, system, and OpenAPI endpoints and the route
//! templates they are mounted on.
pub mod applications;
pub mod error;
pub mod openapi;
pub mod system;
pub mod types;

pub const ROUTE_HEALTH: &str = "/v1/system/health";
pub const ROUTE_OPENAPI: &str = "/v1/openapi.json";
pub const ROUTE_APPLICATIONS: &str = "/v1/applications";
pub const ROUTE_APPLICATION_COUNT: &str = "/v1/applications/count";
pub const ROUTE_APPLICATION: &str = "/v1/applications/:application_id";
pub const ROUTE_ADMIN_APPLICATIONS: &str = "/v1/admin/applications";
