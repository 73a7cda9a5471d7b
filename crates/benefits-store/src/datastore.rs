//! Datastore contract consumed by the scoped repository.
//!
//! Backends evaluate [`Query`] values verbatim. They never see a scope
//! context; by the time a query reaches them the repository has already
//! narrowed it.
use crate::{Query, ScopedEntity};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Datastore<T: ScopedEntity>: Send + Sync {
    /// Rows matching every filter, ordered and paged as requested.
    async fn select(&self, query: &Query) -> StoreResult<Vec<T>>;
    /// Number of matching rows; ordering and paging are ignored.
    async fn count(&self, query: &Query) -> StoreResult<u64>;
    /// Persist a new row. Fails with `Conflict` if the id is taken.
    async fn insert(&self, entity: T) -> StoreResult<T>;
    /// Replace the row with the same id. Fails with `NotFound` if absent.
    async fn update(&self, entity: T) -> StoreResult<T>;
    /// Delete every matching row and return how many were removed.
    async fn delete_where(&self, query: &Query) -> StoreResult<u64>;
    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
