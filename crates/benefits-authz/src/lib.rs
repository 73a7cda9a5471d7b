//! Permission primitives shared by the benefits service and its checkpoints.
//!
//! # Purpose
//! Centralizes permission-string grammar, grant matching, and the per-route
//! permission registration table consulted before handlers run.
//!
//! # How it fits
//! The authorization boundary resolves a caller's grant set once per request,
//! looks the matched route up in the [`RouteTable`], and asks
//! [`has_permission`] (or a pre-parsed [`PermissionMatcher`]) whether the
//! request may proceed at all. Data visibility is decided later, by the scoped
//! repository.
//!
//! # Key invariants
//! - Matching is case-sensitive and purely structural.
//! - The matcher never fails: a grant that cannot be compiled is skipped.
//! - `*.*` and `*.*.*` grant every permission.
//!
//! # Examples
//! ```rust
//! use benefits_authz::has_permission;
//!
//! let granted = ["applications.*"];
//! assert!(has_permission(&granted, "applications.review.approve"));
//! assert!(!has_permission(&granted, "payments.issue"));
//! ```
//!
//! # Common pitfalls
//! - A module wildcard (`module.*`) only compares the first segment, so
//!   `applications.review.*` also covers `applications.create`.
//! - Validate configured grants with [`Permission::parse`] at load time; the
//!   matcher deliberately does not.

mod errors;
mod matcher;
mod permission;
mod route;

pub use errors::{AuthzError, AuthzResult};
pub use matcher::{FULL_WILDCARDS, PermissionMatcher, compile_glob, has_permission};
pub use permission::Permission;
pub use route::{RouteRequirement, RouteTable};
