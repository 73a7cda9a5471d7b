//! In-memory datastore.
//!
//! # Purpose
//! Implements [`Datastore`] with a `HashMap` guarded by `tokio::sync::RwLock`.
//! It backs local development, tests, and deployments where durability is
//! not required.
//!
//! # Durability and consistency
//! - **Not durable**: all rows are lost on process restart.
//! - **Single-process consistency**: mutations take the write lock and
//!   reads take the read lock, so each operation sees a consistent map.
//!
//! # Metrics
//! `benefits_rows_total{table}` tracks the row count after every mutation.
use crate::{Datastore, Query, ScopedEntity, StoreError, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct InMemoryDatastore<T: ScopedEntity> {
    rows: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: ScopedEntity> InMemoryDatastore<T> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn record_size(rows: &HashMap<Uuid, T>) {
        metrics::gauge!("benefits_rows_total", "table" => T::TABLE).set(rows.len() as f64);
    }
}

impl<T: ScopedEntity> Default for InMemoryDatastore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ScopedEntity> Clone for InMemoryDatastore<T> {
    fn clone(&self) -> Self {
        Self {
            rows: Arc::clone(&self.rows),
        }
    }
}

#[async_trait]
impl<T: ScopedEntity> Datastore<T> for InMemoryDatastore<T> {
    async fn select(&self, query: &Query) -> StoreResult<Vec<T>> {
        let rows = self.rows.read().await;
        Ok(query.apply(rows.values().cloned()))
    }

    async fn count(&self, query: &Query) -> StoreResult<u64> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|row| query.matches(*row)).count() as u64)
    }

    async fn insert(&self, entity: T) -> StoreResult<T> {
        let mut rows = self.rows.write().await;
        let id = entity.id();
        if rows.contains_key(&id) {
            return Err(StoreError::Conflict(format!("{} {id} exists", T::ENTITY)));
        }
        rows.insert(id, entity.clone());
        Self::record_size(&rows);
        Ok(entity)
    }

    async fn update(&self, entity: T) -> StoreResult<T> {
        let mut rows = self.rows.write().await;
        let id = entity.id();
        match rows.get_mut(&id) {
            Some(existing) => {
                *existing = entity.clone();
                Ok(entity)
            }
            None => Err(StoreError::NotFound(format!("{} {id}", T::ENTITY))),
        }
    }

    async fn delete_where(&self, query: &Query) -> StoreResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, row| !query.matches(row));
        let removed = (before - rows.len()) as u64;
        if removed > 0 {
            Self::record_size(&rows);
        }
        Ok(removed)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
