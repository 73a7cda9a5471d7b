//! Scope context value and tiers.
//!
//! # Purpose
//! Describes the caller and the visibility tier applied to every scoped
//! repository operation for one request.
//!
//! # Key invariants
//! - `Own` contexts always carry a caller id.
//! - `Unit` contexts always carry a unit id.
//! - Fields are private; a context cannot be altered once built.
use crate::{ScopeError, ScopeResult};
use serde::{Deserialize, Serialize};

/// Visibility tier, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeTier {
    /// Only rows owned by the caller.
    Own,
    /// Only rows belonging to the caller's organizational unit.
    Unit,
    /// No additional predicate.
    Unrestricted,
}

impl ScopeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeTier::Own => "own",
            ScopeTier::Unit => "unit",
            ScopeTier::Unrestricted => "unrestricted",
        }
    }
}

impl std::fmt::Display for ScopeTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable authorization context for one logical unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeContext {
    tier: ScopeTier,
    caller_id: Option<String>,
    unit_id: Option<String>,
}

impl ScopeContext {
    /// Build a context, checking the identifiers the tier depends on.
    ///
    /// Empty identifiers are treated as missing.
    ///
    /// # Errors
    /// - [`ScopeError::InvalidContext`] when `Own` lacks a caller id or
    ///   `Unit` lacks a unit id.
    pub fn new(
        tier: ScopeTier,
        caller_id: Option<String>,
        unit_id: Option<String>,
    ) -> ScopeResult<Self> {
        let caller_id = caller_id.filter(|id| !id.is_empty());
        let unit_id = unit_id.filter(|id| !id.is_empty());
        match tier {
            ScopeTier::Own if caller_id.is_none() => Err(ScopeError::InvalidContext(
                "own tier requires a caller id".to_string(),
            )),
            ScopeTier::Unit if unit_id.is_none() => Err(ScopeError::InvalidContext(
                "unit tier requires a unit id".to_string(),
            )),
            _ => Ok(Self {
                tier,
                caller_id,
                unit_id,
            }),
        }
    }

    pub fn own(caller_id: impl Into<String>) -> ScopeResult<Self> {
        Self::new(ScopeTier::Own, Some(caller_id.into()), None)
    }

    pub fn unit(caller_id: Option<String>, unit_id: impl Into<String>) -> ScopeResult<Self> {
        Self::new(ScopeTier::Unit, caller_id, Some(unit_id.into()))
    }

    pub fn unrestricted(caller_id: Option<String>) -> Self {
        Self {
            tier: ScopeTier::Unrestricted,
            caller_id: caller_id.filter(|id| !id.is_empty()),
            unit_id: None,
        }
    }

    /// Attach the caller's unit to an `Own` or `Unrestricted` context.
    ///
    /// The unit never narrows reads for these tiers. `Own` writes stamp it;
    /// `Unrestricted` writes leave the row's unit alone. A `Unit` context
    /// keeps the unit it was built with.
    pub fn with_unit(mut self, unit_id: Option<String>) -> Self {
        if self.tier != ScopeTier::Unit {
            self.unit_id = unit_id.filter(|id| !id.is_empty());
        }
        self
    }

    pub fn tier(&self) -> ScopeTier {
        self.tier
    }

    pub fn caller_id(&self) -> Option<&str> {
        self.caller_id.as_deref()
    }

    pub fn unit_id(&self) -> Option<&str> {
        self.unit_id.as_deref()
    }
}
