//! Scoped data access for benefits records.
//!
//! # Purpose
//! Provides a [`ScopedRepository`] that narrows every read and stamps every
//! write according to the scope context installed for the current task, on
//! top of a pluggable [`Datastore`].
//!
//! # How it fits
//! - Entities implement [`ScopedEntity`] to expose ownership, unit, and
//!   timestamp columns.
//! - The repository turns the active [`benefits_scope::ScopeContext`] into
//!   [`Query`] predicates and hands them to the datastore.
//! - [`InMemoryDatastore`] is the bundled backend.
//!
//! # Common pitfalls
//! - Calling a scoped method outside a context is an error, never a fallback
//!   to some default visibility. Use the `*_global` variants for
//!   administrative paths.

mod datastore;
mod entity;
mod memory;
mod query;
mod repository;
#[cfg(test)]
mod testing;

pub use datastore::{Datastore, StoreError, StoreResult};
pub use entity::ScopedEntity;
pub use memory::InMemoryDatastore;
pub use query::{Column, Direction, Filter, OrderBy, Query, Value};
pub use repository::{
    FindOptions, RepositoryError, RepositoryResult, ScopedQueryBuilder, ScopedRepository,
};
