//! Permission-string grammar.
//!
//! # Purpose
//! Validates permission strings of the form `segment("." segment)*` before
//! they enter role definitions or route registrations.
//!
//! # Key invariants
//! - Segments are non-empty and use `[A-Za-z0-9_-]`, optionally mixed with `*`.
//! - A required permission may be a comma-separated list of alternatives;
//!   each alternative must satisfy the grammar on its own.
//!
//! # Common pitfalls
//! - The matcher does not call into this module. Grants that bypassed
//!   validation are still evaluated (and skipped if they cannot compile).
use crate::{AuthzError, AuthzResult};

/// A validated permission string.
///
/// # Example
/// ```rust
/// use benefits_authz::Permission;
///
/// let permission = Permission::parse("applications.review.*").expect("valid");
/// assert_eq!(permission.as_str(), "applications.review.*");
/// assert!(Permission::parse("applications..review").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission(String);

impl Permission {
    /// Parse and validate a single permission string.
    ///
    /// # Errors
    /// - [`AuthzError::InvalidPermission`] for empty segments, whitespace,
    ///   commas, or characters outside the segment alphabet.
    pub fn parse(value: &str) -> AuthzResult<Self> {
        if value.is_empty() {
            return Err(AuthzError::InvalidPermission(value.to_string()));
        }
        for segment in value.split('.') {
            if segment.is_empty() || !segment.chars().all(is_segment_char) {
                return Err(AuthzError::InvalidPermission(value.to_string()));
            }
        }
        Ok(Self(value.to_string()))
    }

    /// Parse a comma-separated list of alternatives.
    ///
    /// Alternatives are trimmed; an input with no alternatives is rejected.
    pub fn parse_alternatives(value: &str) -> AuthzResult<Vec<Self>> {
        let parsed = value
            .split(',')
            .map(str::trim)
            .map(Self::parse)
            .collect::<AuthzResult<Vec<_>>>()?;
        if parsed.is_empty() {
            return Err(AuthzError::InvalidPermission(value.to_string()));
        }
        Ok(parsed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_segment_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '*')
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
