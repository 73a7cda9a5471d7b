use crate::Value;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A persisted record whose visibility is governed by a scope context.
///
/// Implementors expose the ownership, unit, and timestamp columns the
/// repository rewrites on every operation. `field` makes entity-specific
/// columns available to filters; unknown names read as `Null`.
pub trait ScopedEntity: Clone + Send + Sync + 'static {
    /// Partial update accepted by [`ScopedEntity::apply_patch`].
    type Patch: Send + 'static;

    /// Human-readable entity name used in not-found errors.
    const ENTITY: &'static str;
    const TABLE: &'static str;

    fn id(&self) -> Uuid;

    fn owner_id(&self) -> Option<&str>;
    fn set_owner_id(&mut self, owner_id: Option<String>);

    fn unit_id(&self) -> Option<&str>;
    fn set_unit_id(&mut self, unit_id: Option<String>);

    fn created_at(&self) -> DateTime<Utc>;
    fn set_created_at(&mut self, at: DateTime<Utc>);

    fn updated_at(&self) -> DateTime<Utc>;
    fn set_updated_at(&mut self, at: DateTime<Utc>);

    fn field(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Merge `patch` into `self`. Must not change the id.
    fn apply_patch(&mut self, patch: Self::Patch);
}
