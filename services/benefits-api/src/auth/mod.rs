//! Authentication-adjacent plumbing for the benefits service.
//!
//! # Purpose
//! Resolves upstream-authenticated principals to grants and scope tiers, and
//! enforces route permissions before handlers run.
pub mod boundary;
pub mod directory;

pub const PERM_APPLICATIONS_READ: &str = "applications.read";
pub const PERM_APPLICATIONS_CREATE: &str = "applications.create";
pub const PERM_APPLICATIONS_UPDATE: &str = "applications.update";
pub const PERM_APPLICATIONS_REVIEW: &str = "applications.review";
pub const PERM_APPLICATIONS_DELETE: &str = "applications.delete";
pub const PERM_ADMIN_APPLICATIONS_READ: &str = "admin.applications.read";
