//! Permission-string matching.
//!
//! # Purpose
//! Decides whether a caller's grant set covers a required permission string.
//!
//! # Key invariants
//! - An empty grant set never matches.
//! - `required` may be a comma-separated list of alternatives; any match wins.
//! - Evaluation order per alternative is cheapest first: exact equality,
//!   module wildcard (`module.*`, first segment only), then glob fallback
//!   where every `*` matches any run of characters, dots included.
//! - A grant that fails to compile is skipped; it can neither deny nor forge.
use regex::{Regex, RegexBuilder};

/// Grants that cover every permission.
pub const FULL_WILDCARDS: [&str; 2] = ["*.*", "*.*.*"];

// Upper bound on the compiled program for a single grant pattern.
const MAX_PATTERN_PROGRAM_BYTES: usize = 1 << 16;

/// Check whether `granted` covers `required`.
///
/// Absent grant sets are represented by an empty iterator and always yield
/// `false`.
///
/// # Example
/// ```rust
/// use benefits_authz::has_permission;
///
/// let granted = vec!["cases.read".to_string(), "applications.review.*".to_string()];
/// assert!(has_permission(&granted, "payments.issue, cases.read"));
/// assert!(has_permission(&granted, "applications.create"));
/// assert!(!has_permission(Vec::<String>::new(), "cases.read"));
/// ```
pub fn has_permission<I, S>(granted: I, required: &str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    PermissionMatcher::new(granted.into_iter().map(|grant| grant.as_ref().to_string()))
        .allows(required)
}

/// Compile a grant into an anchored glob matcher.
///
/// Regex metacharacters are escaped and every `*` becomes "any sequence",
/// crossing segment boundaries. Returns `None` when the pattern cannot be
/// compiled within the size limit.
pub fn compile_glob(grant: &str) -> Option<Regex> {
    let body = regex::escape(grant).replace(r"\*", ".*");
    match RegexBuilder::new(&format!("^(?s:{body})$"))
        .size_limit(MAX_PATTERN_PROGRAM_BYTES)
        .build()
    {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            tracing::debug!(error = %err, grant_len = grant.len(), "skipping malformed grant");
            None
        }
    }
}

fn is_full_wildcard(grant: &str) -> bool {
    FULL_WILDCARDS.contains(&grant)
}

fn alternatives(required: &str) -> impl Iterator<Item = &str> {
    required
        .split(',')
        .map(str::trim)
        .filter(|alternative| !alternative.is_empty())
}

fn first_segment(value: &str) -> &str {
    value.split_once('.').map_or(value, |(head, _)| head)
}

/// Grant set parsed once for repeated checks within a request.
///
/// [`has_permission`] is a one-shot use of this type; exact grants, module
/// prefixes, and compiled globs are prepared once, up front.
#[derive(Debug, Clone, Default)]
pub struct PermissionMatcher {
    grants: Vec<String>,
    full_wildcard: bool,
    modules: Vec<String>,
    globs: Vec<Regex>,
}

impl PermissionMatcher {
    pub fn new<I, S>(granted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let grants: Vec<String> = granted.into_iter().map(Into::into).collect();
        let full_wildcard = grants.iter().any(|grant| is_full_wildcard(grant));
        let modules = grants
            .iter()
            .filter(|grant| grant.ends_with(".*"))
            .map(|grant| first_segment(grant).to_string())
            .collect();
        let globs = grants
            .iter()
            .filter(|grant| grant.contains('*'))
            .filter_map(|grant| compile_glob(grant))
            .collect();
        Self {
            grants,
            full_wildcard,
            modules,
            globs,
        }
    }

    pub fn allows(&self, required: &str) -> bool {
        if self.grants.is_empty() {
            return false;
        }
        if self.full_wildcard {
            return true;
        }
        alternatives(required).any(|alternative| {
            self.grants.iter().any(|grant| grant == alternative)
                || self
                    .modules
                    .iter()
                    .any(|module| module == first_segment(alternative))
                || self.globs.iter().any(|glob| glob.is_match(alternative))
        })
    }
}
