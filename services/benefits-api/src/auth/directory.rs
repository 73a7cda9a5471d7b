//! Principal directory.
//!
//! # Purpose
//! Maps principal ids (already authenticated upstream) to their organizational
//! unit, effective scope tier, and permission grants.
//!
//! # Resolution rules
//! - Roles bundle a scope tier with a list of permission grants.
//! - A principal's tier is the widest tier among its roles; `own` when it has
//!   none.
//! - A principal's grants are the union of its roles' permissions.
//!
//! # Validation
//! Loading fails when a grant does not satisfy the permission grammar, a
//! principal references an unknown role, names repeat, or a principal whose
//! tier is `unit` has no unit id.
use benefits_authz::{Permission, PermissionMatcher};
use benefits_scope::{ScopeContext, ScopeResult, ScopeTier};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("parse directory: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("role {role} has an invalid permission {permission:?}")]
    InvalidPermission { role: String, permission: String },
    #[error("role {0} is defined twice")]
    DuplicateRole(String),
    #[error("principal {0} is defined twice")]
    DuplicatePrincipal(String),
    #[error("principal {principal} references unknown role {role}")]
    UnknownRole { principal: String, role: String },
    #[error("principal {0} has unit scope but no unit_id")]
    MissingUnit(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleDefinition {
    pub name: String,
    pub scope: ScopeTier,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrincipalAssignment {
    pub principal_id: String,
    #[serde(default)]
    pub unit_id: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DirectoryDocument {
    #[serde(default)]
    roles: Vec<RoleDefinition>,
    #[serde(default)]
    principals: Vec<PrincipalAssignment>,
}

/// A principal's effective authorization, computed once at load time.
#[derive(Debug, Clone)]
pub struct ResolvedPrincipal {
    principal_id: String,
    unit_id: Option<String>,
    tier: ScopeTier,
    matcher: PermissionMatcher,
}

impl ResolvedPrincipal {
    pub fn principal_id(&self) -> &str {
        &self.principal_id
    }

    pub fn unit_id(&self) -> Option<&str> {
        self.unit_id.as_deref()
    }

    pub fn tier(&self) -> ScopeTier {
        self.tier
    }

    pub fn matcher(&self) -> &PermissionMatcher {
        &self.matcher
    }

    pub fn scope_context(&self) -> ScopeResult<ScopeContext> {
        ScopeContext::new(
            self.tier,
            Some(self.principal_id.clone()),
            self.unit_id.clone(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrincipalDirectory {
    principals: HashMap<String, ResolvedPrincipal>,
}

impl PrincipalDirectory {
    pub fn from_yaml_str(contents: &str) -> Result<Self, DirectoryError> {
        let document: DirectoryDocument = serde_yaml::from_str(contents)?;
        Self::from_parts(document.roles, document.principals)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("read principal directory: {}", path.display()))?;
        let directory = Self::from_yaml_str(&contents)
            .with_context(|| format!("load principal directory: {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            principals = directory.len(),
            "principal directory loaded"
        );
        Ok(directory)
    }

    pub fn from_parts(
        roles: Vec<RoleDefinition>,
        principals: Vec<PrincipalAssignment>,
    ) -> Result<Self, DirectoryError> {
        let mut role_index: HashMap<String, RoleDefinition> = HashMap::new();
        for role in roles {
            if let Some(permission) = role
                .permissions
                .iter()
                .find(|permission| Permission::parse(permission).is_err())
            {
                return Err(DirectoryError::InvalidPermission {
                    role: role.name.clone(),
                    permission: permission.clone(),
                });
            }
            if role_index.contains_key(&role.name) {
                return Err(DirectoryError::DuplicateRole(role.name));
            }
            role_index.insert(role.name.clone(), role);
        }

        let mut resolved = HashMap::new();
        for assignment in principals {
            if resolved.contains_key(&assignment.principal_id) {
                return Err(DirectoryError::DuplicatePrincipal(assignment.principal_id));
            }
            let principal = resolve_assignment(&role_index, &assignment)?;
            resolved.insert(assignment.principal_id, principal);
        }
        Ok(Self {
            principals: resolved,
        })
    }

    pub fn resolve(&self, principal_id: &str) -> Option<&ResolvedPrincipal> {
        self.principals.get(principal_id)
    }

    pub fn len(&self) -> usize {
        self.principals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

fn resolve_assignment(
    roles: &HashMap<String, RoleDefinition>,
    assignment: &PrincipalAssignment,
) -> Result<ResolvedPrincipal, DirectoryError> {
    let mut tier = None;
    let mut grants = BTreeSet::new();
    for name in &assignment.roles {
        let role = roles.get(name).ok_or_else(|| DirectoryError::UnknownRole {
            principal: assignment.principal_id.clone(),
            role: name.clone(),
        })?;
        tier = tier.max(Some(role.scope));
        grants.extend(role.permissions.iter().cloned());
    }
    let tier = tier.unwrap_or(ScopeTier::Own);
    let unit_id = assignment.unit_id.clone().filter(|unit| !unit.is_empty());
    if tier == ScopeTier::Unit && unit_id.is_none() {
        return Err(DirectoryError::MissingUnit(assignment.principal_id.clone()));
    }
    Ok(ResolvedPrincipal {
        principal_id: assignment.principal_id.clone(),
        unit_id,
        tier,
        matcher: PermissionMatcher::new(grants),
    })
}
