//! Scope-enforced repository.
//!
//! # Purpose
//! Wraps a [`Datastore`] so that every non-global operation is narrowed by
//! the scope context installed for the current task. Business services call
//! it like a plain repository and never build scope predicates themselves.
//!
//! # Read narrowing
//! - `Own`: `owner_id = caller_id`
//! - `Unit`: `unit_id = unit_id`
//! - `Unrestricted`: no predicate
//!
//! # Write stamping
//! Stamped columns always come from the context, never from the input:
//! - `Own`: owner is the caller, unit is the context unit (or none).
//! - `Unit`: owner is the caller (or none), unit is the context unit.
//! - `Unrestricted`: owner is the caller when one is present; the input's
//!   unit is kept.
//!
//! Both timestamps are stamped on create; `updated_at` on update.
//!
//! # Failure modes
//! - No installed context: [`RepositoryError::Scope`] wrapping
//!   `ScopeError::ContextRequired`. There is no fallback tier.
//! - A row that is missing and a row outside the caller's scope produce the
//!   same [`RepositoryError::NotFound`].
use crate::{
    Column, Datastore, Filter, OrderBy, Query, ScopedEntity, StoreError, Value,
};
use benefits_scope::{ScopeContext, ScopeContextHolder, ScopeError, ScopeTier};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepositoryError {
    pub fn is_context_required(&self) -> bool {
        matches!(self, RepositoryError::Scope(ScopeError::ContextRequired))
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Extra narrowing for [`ScopedRepository::find_with`].
///
/// Filters are AND-ed with the scope predicate. An explicit ordering
/// replaces the default `created_at DESC`.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }
}

pub struct ScopedRepository<T: ScopedEntity> {
    store: Arc<dyn Datastore<T>>,
}

impl<T: ScopedEntity> Clone for ScopedRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: ScopedEntity> ScopedRepository<T> {
    pub fn new(store: Arc<dyn Datastore<T>>) -> Self {
        Self { store }
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    pub async fn health_check(&self) -> RepositoryResult<()> {
        Ok(self.store.health_check().await?)
    }

    pub async fn find_all(&self) -> RepositoryResult<Vec<T>> {
        let context = Self::context("find_all")?;
        let query = Self::scoped_query(&context).order_by(OrderBy::newest_first());
        Ok(self.store.select(&query).await?)
    }

    pub async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<T>> {
        let context = Self::context("find_by_id")?;
        let query = Self::scoped_query(&context)
            .filter(Filter::Eq(Column::Id, Value::Uuid(id)))
            .limit(1);
        Ok(self.store.select(&query).await?.into_iter().next())
    }

    pub async fn count(&self) -> RepositoryResult<u64> {
        let context = Self::context("count")?;
        Ok(self.store.count(&Self::scoped_query(&context)).await?)
    }

    pub async fn find_with(&self, options: FindOptions) -> RepositoryResult<Vec<T>> {
        let context = Self::context("find_with")?;
        let mut query = options
            .filters
            .into_iter()
            .fold(Self::scoped_query(&context), Query::filter);
        query = if options.order.is_empty() {
            query.order_by(OrderBy::newest_first())
        } else {
            options.order.into_iter().fold(query, Query::order_by)
        };
        if let Some(limit) = options.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = options.offset {
            query = query.offset(offset);
        }
        Ok(self.store.select(&query).await?)
    }

    pub async fn save_with_scope(&self, mut entity: T) -> RepositoryResult<T> {
        let context = Self::context("save")?;
        let caller = context.caller_id().map(str::to_string);
        match context.tier() {
            ScopeTier::Own | ScopeTier::Unit => {
                entity.set_owner_id(caller);
                entity.set_unit_id(context.unit_id().map(str::to_string));
            }
            ScopeTier::Unrestricted => {
                if caller.is_some() {
                    entity.set_owner_id(caller);
                }
            }
        }
        let now = Utc::now();
        entity.set_created_at(now);
        entity.set_updated_at(now);
        tracing::debug!(
            entity = T::ENTITY,
            id = %entity.id(),
            tier = %context.tier(),
            "saving scoped row"
        );
        Ok(self.store.insert(entity).await?)
    }

    pub async fn update_with_scope(&self, id: Uuid, patch: T::Patch) -> RepositoryResult<T> {
        let context = Self::context("update")?;
        let query = Self::scoped_query(&context)
            .filter(Filter::Eq(Column::Id, Value::Uuid(id)))
            .limit(1);
        let Some(stored) = self.store.select(&query).await?.into_iter().next() else {
            return Err(Self::not_found(id));
        };

        let mut merged = stored.clone();
        merged.apply_patch(patch);
        if merged.id() != stored.id() {
            return Err(StoreError::Unexpected(anyhow::anyhow!(
                "{} patch changed the row id",
                T::ENTITY
            ))
            .into());
        }
        merged.set_owner_id(stored.owner_id().map(str::to_string));
        merged.set_unit_id(stored.unit_id().map(str::to_string));
        merged.set_created_at(stored.created_at());
        merged.set_updated_at(Utc::now());

        match self.store.update(merged).await {
            Ok(updated) => Ok(updated),
            Err(StoreError::NotFound(_)) => Err(Self::not_found(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Delete in a single statement carrying both the id and scope predicate.
    pub async fn delete_with_scope(&self, id: Uuid) -> RepositoryResult<()> {
        let context = Self::context("delete")?;
        let query =
            Self::scoped_query(&context).filter(Filter::Eq(Column::Id, Value::Uuid(id)));
        match self.store.delete_where(&query).await? {
            0 => Err(Self::not_found(id)),
            _ => Ok(()),
        }
    }

    /// Start a query already narrowed to the current scope.
    ///
    /// The scope predicate is captured now; later filters can only narrow
    /// it further.
    pub fn create_scoped_query_builder(
        &self,
        alias: &str,
    ) -> RepositoryResult<ScopedQueryBuilder<T>> {
        let context = Self::context("query_builder")?;
        let query = Self::scoped_query(&context)
            .with_alias(alias)
            .order_by(OrderBy::newest_first());
        Ok(ScopedQueryBuilder::new(Arc::clone(&self.store), query))
    }

    /// Unscoped listing for administrative callers.
    pub async fn find_all_global(&self) -> RepositoryResult<Vec<T>> {
        Self::record_global("find_all");
        let query = Query::table(T::TABLE).order_by(OrderBy::newest_first());
        Ok(self.store.select(&query).await?)
    }

    pub async fn find_by_id_global(&self, id: Uuid) -> RepositoryResult<Option<T>> {
        Self::record_global("find_by_id");
        let query = Query::table(T::TABLE)
            .filter(Filter::Eq(Column::Id, Value::Uuid(id)))
            .limit(1);
        Ok(self.store.select(&query).await?.into_iter().next())
    }

    pub async fn count_global(&self) -> RepositoryResult<u64> {
        Self::record_global("count");
        Ok(self.store.count(&Query::table(T::TABLE)).await?)
    }

    fn context(op: &'static str) -> RepositoryResult<ScopeContext> {
        match ScopeContextHolder::get_required() {
            Ok(context) => {
                metrics::counter!(
                    "benefits_scoped_operations_total",
                    "op" => op,
                    "tier" => context.tier().as_str()
                )
                .increment(1);
                Ok(context)
            }
            Err(err) => {
                metrics::counter!("benefits_scope_context_missing_total", "op" => op)
                    .increment(1);
                tracing::error!(
                    entity = T::ENTITY,
                    op,
                    "scoped repository called without a scope context"
                );
                Err(err.into())
            }
        }
    }

    fn record_global(op: &'static str) {
        metrics::counter!(
            "benefits_scoped_operations_total",
            "op" => op,
            "tier" => "global"
        )
        .increment(1);
    }

    // A context missing the identifier its tier needs compares against NULL
    // and matches nothing.
    fn scoped_query(context: &ScopeContext) -> Query {
        let query = Query::table(T::TABLE);
        match context.tier() {
            ScopeTier::Own => query.filter(Filter::Eq(
                Column::Owner,
                context.caller_id().map_or(Value::Null, Value::from),
            )),
            ScopeTier::Unit => query.filter(Filter::Eq(
                Column::Unit,
                context.unit_id().map_or(Value::Null, Value::from),
            )),
            ScopeTier::Unrestricted => query,
        }
    }

    fn not_found(id: Uuid) -> RepositoryError {
        RepositoryError::NotFound {
            entity: T::ENTITY,
            id,
        }
    }
}

/// Query builder pre-seeded with the scope predicate.
///
/// Only [`ScopedRepository::create_scoped_query_builder`] can construct one,
/// and there is no way to drop a filter once added.
pub struct ScopedQueryBuilder<T: ScopedEntity> {
    store: Arc<dyn Datastore<T>>,
    query: Query,
    explicit_order: bool,
}

impl<T: ScopedEntity> ScopedQueryBuilder<T> {
    fn new(store: Arc<dyn Datastore<T>>, query: Query) -> Self {
        Self {
            store,
            query,
            explicit_order: false,
        }
    }

    pub fn and_where(mut self, filter: Filter) -> Self {
        self.query = self.query.filter(filter);
        self
    }

    /// The first explicit ordering replaces the default newest-first order.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        if !self.explicit_order {
            self.query = self.query.without_order();
            self.explicit_order = true;
        }
        self.query = self.query.order_by(order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.query = self.query.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.query = self.query.offset(offset);
        self
    }

    pub fn to_sql(&self) -> (String, Vec<Value>) {
        self.query.to_sql()
    }

    pub async fn fetch(&self) -> RepositoryResult<Vec<T>> {
        Ok(self.store.select(&self.query).await?)
    }

    pub async fn fetch_one(&self) -> RepositoryResult<Option<T>> {
        let query = self.query.clone().limit(1);
        Ok(self.store.select(&query).await?.into_iter().next())
    }

    pub async fn count(&self) -> RepositoryResult<u64> {
        Ok(self.store.count(&self.query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryDatastore;
    use crate::testing::{Record, RecordPatch};
    use chrono::{DateTime, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("timestamp")
    }

    fn repository() -> (ScopedRepository<Record>, InMemoryDatastore<Record>) {
        let store = InMemoryDatastore::<Record>::new();
        let repo = ScopedRepository::new(Arc::new(store.clone()) as Arc<dyn Datastore<Record>>);
        (repo, store)
    }

    async fn seed(store: &InMemoryDatastore<Record>, rows: Vec<Record>) -> Vec<Record> {
        let mut out = Vec::new();
        for row in rows {
            out.push(store.insert(row).await.expect("seed"));
        }
        out
    }

    fn own(caller: &str) -> ScopeContext {
        ScopeContext::own(caller).expect("own context")
    }

    fn unit(caller: &str, unit: &str) -> ScopeContext {
        ScopeContext::unit(Some(caller.to_string()), unit).expect("unit context")
    }

    #[tokio::test]
    async fn own_scope_only_sees_callers_rows() {
        let (repo, store) = repository();
        seed(
            &store,
            vec![
                Record::new("u1", Some("g1"), at(1)),
                Record::new("u2", Some("g1"), at(2)),
                Record::new("u1", Some("g2"), at(3)),
            ],
        )
        .await;

        let rows = ScopeContextHolder::run_async(own("u1"), repo.find_all())
            .await
            .expect("find_all");
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| row.owner_id.as_deref() == Some("u1")));

        let count = ScopeContextHolder::run_async(own("u1"), repo.count())
            .await
            .expect("count");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn unit_scope_lists_unit_rows_newest_first() {
        let (repo, store) = repository();
        let seeded = seed(
            &store,
            vec![
                Record::new("u1", Some("g1"), at(10)),
                Record::new("u2", Some("g1"), at(20)),
                Record::new("u3", Some("g2"), at(30)),
            ],
        )
        .await;

        let rows = ScopeContextHolder::run_async(unit("u1", "g1"), repo.find_all())
            .await
            .expect("find_all");
        let ids: Vec<_> = rows.iter().map(|row| row.id).collect();
        assert_eq!(ids, vec![seeded[1].id, seeded[0].id]);
    }

    #[tokio::test]
    async fn find_by_id_hides_rows_outside_scope() {
        let (repo, store) = repository();
        let seeded = seed(&store, vec![Record::new("u2", Some("g2"), at(1))]).await;

        let hidden = ScopeContextHolder::run_async(unit("u1", "g1"), repo.find_by_id(seeded[0].id))
            .await
            .expect("find_by_id");
        assert!(hidden.is_none());

        let visible = ScopeContextHolder::run_async(
            ScopeContext::unrestricted(None),
            repo.find_by_id(seeded[0].id),
        )
        .await
        .expect("find_by_id");
        assert_eq!(visible.map(|row| row.id), Some(seeded[0].id));
    }

    #[tokio::test]
    async fn unit_save_stamps_context_columns_over_input() {
        let (repo, _store) = repository();
        let input = Record::new("intruder", Some("g2"), at(0));

        let saved = ScopeContextHolder::run_async(unit("u1", "g1"), repo.save_with_scope(input))
            .await
            .expect("save");
        assert_eq!(saved.unit_id.as_deref(), Some("g1"));
        assert_eq!(saved.owner_id.as_deref(), Some("u1"));
        assert!(saved.created_at > at(0));
        assert_eq!(saved.created_at, saved.updated_at);
    }

    #[tokio::test]
    async fn own_save_stamps_caller_and_context_unit() {
        let (repo, _store) = repository();

        let saved = ScopeContextHolder::run_async(
            own("u1"),
            repo.save_with_scope(Record::new("intruder", Some("g2"), at(0))),
        )
        .await
        .expect("save");
        assert_eq!(saved.owner_id.as_deref(), Some("u1"));
        assert_eq!(saved.unit_id, None);

        let with_unit = own("u1").with_unit(Some("g1".to_string()));
        let saved = ScopeContextHolder::run_async(
            with_unit,
            repo.save_with_scope(Record::new("intruder", Some("g2"), at(0))),
        )
        .await
        .expect("save");
        assert_eq!(saved.unit_id.as_deref(), Some("g1"));
    }

    #[tokio::test]
    async fn unrestricted_save_keeps_input_unit() {
        let (repo, _store) = repository();

        let saved = ScopeContextHolder::run_async(
            ScopeContext::unrestricted(Some("admin".to_string())),
            repo.save_with_scope(Record::new("u7", Some("g7"), at(0))),
        )
        .await
        .expect("save");
        assert_eq!(saved.owner_id.as_deref(), Some("admin"));
        assert_eq!(saved.unit_id.as_deref(), Some("g7"));

        let anonymous = ScopeContextHolder::run_async(
            ScopeContext::unrestricted(None),
            repo.save_with_scope(Record::new("u7", Some("g7"), at(0))),
        )
        .await
        .expect("save");
        assert_eq!(anonymous.owner_id.as_deref(), Some("u7"));
    }

    #[tokio::test]
    async fn update_preserves_stamped_columns() {
        let (repo, store) = repository();
        let seeded = seed(&store, vec![Record::new("u1", Some("g1"), at(5))]).await;
        let patch = RecordPatch {
            status: Some("approved".to_string()),
            owner_id: Some("intruder".to_string()),
            unit_id: Some("g9".to_string()),
        };

        let updated = ScopeContextHolder::run_async(
            unit("u2", "g1"),
            repo.update_with_scope(seeded[0].id, patch),
        )
        .await
        .expect("update");
        assert_eq!(updated.status, "approved");
        assert_eq!(updated.owner_id.as_deref(), Some("u1"));
        assert_eq!(updated.unit_id.as_deref(), Some("g1"));
        assert_eq!(updated.created_at, at(5));
        assert!(updated.updated_at > at(5));
    }

    #[tokio::test]
    async fn out_of_scope_and_missing_rows_fail_identically() {
        let (repo, store) = repository();
        let seeded = seed(&store, vec![Record::new("u2", Some("g2"), at(1))]).await;
        let foreign = seeded[0].id;
        let missing = Uuid::new_v4();

        for id in [foreign, missing] {
            let err = ScopeContextHolder::run_async(
                unit("u1", "g1"),
                repo.update_with_scope(id, RecordPatch::status("closed")),
            )
            .await
            .expect_err("update must fail");
            assert!(
                matches!(err, RepositoryError::NotFound { entity: "record", id: found } if found == id)
            );

            let err = ScopeContextHolder::run_async(unit("u1", "g1"), repo.delete_with_scope(id))
                .await
                .expect_err("delete must fail");
            assert!(
                matches!(err, RepositoryError::NotFound { entity: "record", id: found } if found == id)
            );
        }

        let untouched = repo.find_by_id_global(foreign).await.expect("global");
        assert_eq!(untouched.map(|row| row.status), Some("open".to_string()));
    }

    #[tokio::test]
    async fn delete_removes_row_in_scope() {
        let (repo, store) = repository();
        let seeded = seed(&store, vec![Record::new("u1", Some("g1"), at(1))]).await;

        ScopeContextHolder::run_async(own("u1"), repo.delete_with_scope(seeded[0].id))
            .await
            .expect("delete");
        assert_eq!(repo.count_global().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn every_scoped_method_requires_a_context() {
        let (repo, store) = repository();
        let seeded = seed(&store, vec![Record::new("u1", Some("g1"), at(1))]).await;
        let id = seeded[0].id;

        assert!(repo.find_all().await.expect_err("find_all").is_context_required());
        assert!(repo.find_by_id(id).await.expect_err("find_by_id").is_context_required());
        assert!(repo.count().await.expect_err("count").is_context_required());
        assert!(
            repo.find_with(FindOptions::new())
                .await
                .expect_err("find_with")
                .is_context_required()
        );
        assert!(
            repo.save_with_scope(Record::new("u1", None, at(2)))
                .await
                .expect_err("save")
                .is_context_required()
        );
        assert!(
            repo.update_with_scope(id, RecordPatch::status("closed"))
                .await
                .expect_err("update")
                .is_context_required()
        );
        assert!(
            repo.delete_with_scope(id)
                .await
                .expect_err("delete")
                .is_context_required()
        );
        assert!(
            repo.create_scoped_query_builder("r")
                .err()
                .is_some_and(|err| err.is_context_required())
        );
        assert_eq!(repo.count_global().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn global_variants_ignore_context() {
        let (repo, store) = repository();
        let seeded = seed(
            &store,
            vec![
                Record::new("u1", Some("g1"), at(1)),
                Record::new("u2", Some("g2"), at(2)),
            ],
        )
        .await;

        assert_eq!(repo.find_all_global().await.expect("all").len(), 2);
        assert!(
            repo.find_by_id_global(seeded[1].id)
                .await
                .expect("by id")
                .is_some()
        );

        let inside = ScopeContextHolder::run_async(own("u1"), repo.count_global())
            .await
            .expect("count");
        assert_eq!(inside, 2);
    }

    #[tokio::test]
    async fn find_with_adds_filters_ordering_and_paging() {
        let (repo, store) = repository();
        seed(
            &store,
            vec![
                Record::new("u1", Some("g1"), at(1)).with_status("open"),
                Record::new("u2", Some("g1"), at(2)).with_status("closed"),
                Record::new("u3", Some("g1"), at(3)).with_status("open"),
                Record::new("u4", Some("g2"), at(4)).with_status("open"),
            ],
        )
        .await;

        let open = FindOptions::new()
            .filter(Filter::Eq(Column::field("status"), Value::from("open")))
            .order_by(OrderBy::asc(Column::CreatedAt));
        let rows = ScopeContextHolder::run_async(unit("u1", "g1"), repo.find_with(open))
            .await
            .expect("find_with");
        let created: Vec<_> = rows.iter().map(|row| row.created_at).collect();
        assert_eq!(created, vec![at(1), at(3)]);

        let paged = FindOptions::new().limit(1).offset(1);
        let rows = ScopeContextHolder::run_async(unit("u1", "g1"), repo.find_with(paged))
            .await
            .expect("find_with");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].created_at, at(2));
    }

    #[tokio::test]
    async fn query_builder_is_seeded_with_scope() {
        let (repo, store) = repository();
        seed(
            &store,
            vec![
                Record::new("u1", Some("g1"), at(1)).with_status("open"),
                Record::new("u2", Some("g1"), at(2)).with_status("open"),
                Record::new("u3", Some("g2"), at(3)).with_status("open"),
            ],
        )
        .await;

        let builder = ScopeContextHolder::run(unit("u1", "g1"), || {
            repo.create_scoped_query_builder("rec")
        })
        .expect("builder")
        .and_where(Filter::Eq(Column::field("status"), Value::from("open")))
        .order_by(OrderBy::asc(Column::CreatedAt));

        let (sql, params) = builder.to_sql();
        assert_eq!(
            sql,
            r#"SELECT * FROM "records" AS "rec" WHERE "rec"."unit_id" = $1 AND "rec"."status" = $2 ORDER BY "rec"."created_at" ASC"#
        );
        assert_eq!(params[0], Value::from("g1"));

        // The builder keeps its narrowing after the context is gone.
        assert_eq!(builder.count().await.expect("count"), 2);
        let first = builder.fetch_one().await.expect("fetch_one").expect("row");
        assert_eq!(first.created_at, at(1));
        assert_eq!(builder.fetch().await.expect("fetch").len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_requests_see_only_their_rows() {
        let (repo, store) = repository();
        let mut rows = Vec::new();
        for i in 0..8 {
            rows.push(Record::new(&format!("u{i}"), None, at(i)));
            rows.push(Record::new(&format!("u{i}"), None, at(i + 100)));
        }
        seed(&store, rows).await;

        let tasks = (0..8).map(|i| {
            let repo = repo.clone();
            let caller = format!("u{i}");
            tokio::spawn(ScopeContextHolder::run_async(own(&caller), async move {
                tokio::task::yield_now().await;
                let rows = repo.find_all().await.expect("find_all");
                tokio::task::yield_now().await;
                (caller, rows)
            }))
        });
        for result in futures::future::join_all(tasks).await {
            let (caller, rows) = result.expect("join");
            assert_eq!(rows.len(), 2);
            assert!(rows.iter().all(|row| row.owner_id.as_deref() == Some(caller.as_str())));
        }
    }
}
