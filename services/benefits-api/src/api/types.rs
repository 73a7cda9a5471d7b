//! HTTP API request/response types.
//!
//! # Purpose
//! Defines payload shapes for the benefits REST API and OpenAPI schema
//! generation.
use crate::model::{ApplicationStatus, BenefitApplication};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: u64 = 100;
pub const MAX_PAGE_SIZE: u64 = 500;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
}

/// New application submitted by the caller.
///
/// Own and unit callers always get both values from their scope context.
/// Unrestricted callers keep the supplied `unit_id`, even when their context
/// carries a unit, and keep the supplied `owner_id` only when their context
/// has no caller identity.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ApplicationCreateRequest {
    pub benefit_type: String,
    pub amount_cents: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub unit_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ApplicationListResponse {
    pub items: Vec<BenefitApplication>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ApplicationListQuery {
    /// Only return applications in this status.
    pub status: Option<ApplicationStatus>,
    /// Page size, capped at 500.
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl ApplicationListQuery {
    pub fn page_size(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ApplicationCountQuery {
    pub status: Option<ApplicationStatus>,
}
