//! Benefits data model.
//!
//! # Purpose
//! Re-exports the scoped entities and patch payloads used by the API and
//! service layers.
mod application;

pub use application::{ApplicationPatchRequest, ApplicationStatus, BenefitApplication};
