//! Benefit application business service.
//!
//! # Purpose
//! Implements the application workflows on top of the scoped repository. The
//! service never inspects the caller's scope: every read is narrowed and every
//! write stamped by the repository from the context the boundary installed.
//!
//! Only `list_all` bypasses scoping, and it is reachable solely through the
//! admin route.
use crate::api::types::ApplicationCreateRequest;
use crate::model::{ApplicationPatchRequest, ApplicationStatus, BenefitApplication};
use benefits_store::{
    Column, Datastore, Filter, FindOptions, InMemoryDatastore, RepositoryResult,
    ScopedRepository, Value,
};
use std::sync::Arc;
use uuid::Uuid;

const QUERY_ALIAS: &str = "app";

#[derive(Clone)]
pub struct ApplicationService {
    repo: ScopedRepository<BenefitApplication>,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn Datastore<BenefitApplication>>) -> Self {
        Self {
            repo: ScopedRepository::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryDatastore::<BenefitApplication>::new()))
    }

    pub async fn list(
        &self,
        status: Option<ApplicationStatus>,
        limit: u64,
        offset: u64,
    ) -> RepositoryResult<Vec<BenefitApplication>> {
        let mut options = FindOptions::new().limit(limit).offset(offset);
        if let Some(status) = status {
            options = options.filter(status_filter(status));
        }
        self.repo.find_with(options).await
    }

    pub async fn get(&self, id: Uuid) -> RepositoryResult<Option<BenefitApplication>> {
        self.repo.find_by_id(id).await
    }

    pub async fn submit(
        &self,
        request: ApplicationCreateRequest,
    ) -> RepositoryResult<BenefitApplication> {
        let mut application = BenefitApplication::new(request.benefit_type, request.amount_cents);
        application.notes = request.notes;
        application.owner_id = request.owner_id;
        application.unit_id = request.unit_id;
        let saved = self.repo.save_with_scope(application).await?;
        tracing::info!(id = %saved.id, benefit_type = %saved.benefit_type, "application submitted");
        Ok(saved)
    }

    pub async fn amend(
        &self,
        id: Uuid,
        patch: ApplicationPatchRequest,
    ) -> RepositoryResult<BenefitApplication> {
        self.repo.update_with_scope(id, patch).await
    }

    pub async fn withdraw(&self, id: Uuid) -> RepositoryResult<()> {
        self.repo.delete_with_scope(id).await?;
        tracing::info!(%id, "application withdrawn");
        Ok(())
    }

    pub async fn count(&self, status: Option<ApplicationStatus>) -> RepositoryResult<u64> {
        let Some(status) = status else {
            return self.repo.count().await;
        };
        let builder = self
            .repo
            .create_scoped_query_builder(QUERY_ALIAS)?
            .and_where(status_filter(status));
        let (sql, _) = builder.to_sql();
        tracing::trace!(%sql, "counting applications");
        builder.count().await
    }

    /// Every application regardless of scope. Admin route only.
    pub async fn list_all(&self) -> RepositoryResult<Vec<BenefitApplication>> {
        self.repo.find_all_global().await
    }

    pub async fn health(&self) -> RepositoryResult<&'static str> {
        self.repo.health_check().await?;
        Ok(self.repo.backend_name())
    }
}

fn status_filter(status: ApplicationStatus) -> Filter {
    Filter::Eq(Column::field("status"), Value::from(status.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use benefits_scope::{ScopeContext, ScopeContextHolder};

    fn request(benefit_type: &str, unit_id: Option<&str>) -> ApplicationCreateRequest {
        ApplicationCreateRequest {
            benefit_type: benefit_type.to_string(),
            amount_cents: 1000,
            notes: None,
            owner_id: Some("spoofed".to_string()),
            unit_id: unit_id.map(str::to_string),
        }
    }

    fn member(caller: &str, unit: &str) -> ScopeContext {
        ScopeContext::own(caller)
            .expect("own")
            .with_unit(Some(unit.to_string()))
    }

    #[tokio::test]
    async fn members_see_only_their_applications() {
        let service = ApplicationService::in_memory();
        for caller in ["alice", "bob"] {
            ScopeContextHolder::run_async(
                member(caller, "g1"),
                service.submit(request("dental", Some("g9"))),
            )
            .await
            .expect("submit");
        }

        let mine = ScopeContextHolder::run_async(member("alice", "g1"), service.list(None, 10, 0))
            .await
            .expect("list");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].owner_id.as_deref(), Some("alice"));
        assert_eq!(mine[0].unit_id.as_deref(), Some("g1"));
        assert_eq!(service.list_all().await.expect("all").len(), 2);
    }

    #[tokio::test]
    async fn count_by_status_uses_scope() {
        let service = ApplicationService::in_memory();
        let caseworker = ScopeContext::unit(Some("carol".to_string()), "g1").expect("unit");
        let submitted = ScopeContextHolder::run_async(
            caseworker.clone(),
            service.submit(request("dental", None)),
        )
        .await
        .expect("submit");
        ScopeContextHolder::run_async(caseworker.clone(), service.submit(request("vision", None)))
            .await
            .expect("submit");
        ScopeContextHolder::run_async(
            ScopeContext::unit(Some("dan".to_string()), "g2").expect("unit"),
            service.submit(request("dental", None)),
        )
        .await
        .expect("submit");

        ScopeContextHolder::run_async(
            caseworker.clone(),
            service.amend(
                submitted.id,
                ApplicationPatchRequest {
                    status: Some(ApplicationStatus::Approved),
                    ..ApplicationPatchRequest::default()
                },
            ),
        )
        .await
        .expect("amend");

        let (all, approved) = ScopeContextHolder::run_async(caseworker, async {
            (
                service.count(None).await.expect("count"),
                service
                    .count(Some(ApplicationStatus::Approved))
                    .await
                    .expect("count approved"),
            )
        })
        .await;
        assert_eq!(all, 2);
        assert_eq!(approved, 1);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let service = ApplicationService::in_memory();
        let context = ScopeContext::unrestricted(Some("root".to_string()));
        let first = ScopeContextHolder::run_async(context.clone(), service.submit(request("dental", None)))
            .await
            .expect("submit");
        ScopeContextHolder::run_async(context.clone(), service.submit(request("vision", None)))
            .await
            .expect("submit");
        ScopeContextHolder::run_async(
            context.clone(),
            service.amend(
                first.id,
                ApplicationPatchRequest {
                    status: Some(ApplicationStatus::Rejected),
                    ..ApplicationPatchRequest::default()
                },
            ),
        )
        .await
        .expect("amend");

        let rejected = ScopeContextHolder::run_async(
            context,
            service.list(Some(ApplicationStatus::Rejected), 10, 0),
        )
        .await
        .expect("list");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].id, first.id);
    }

    #[tokio::test]
    async fn unrestricted_submit_keeps_requested_unit() {
        let service = ApplicationService::in_memory();
        let root = ScopeContext::unrestricted(Some("root".to_string()))
            .with_unit(Some("hq".to_string()));
        let saved = ScopeContextHolder::run_async(root, service.submit(request("dental", Some("g9"))))
            .await
            .expect("submit");
        assert_eq!(saved.unit_id.as_deref(), Some("g9"));
        assert_eq!(saved.owner_id.as_deref(), Some("root"));

        let anonymous = ScopeContext::unrestricted(None);
        let saved = ScopeContextHolder::run_async(anonymous, service.submit(request("vision", None)))
            .await
            .expect("submit");
        assert_eq!(saved.unit_id, None);
        assert_eq!(saved.owner_id.as_deref(), Some("spoofed"));
    }

    #[tokio::test]
    async fn health_reports_backend() {
        let service = ApplicationService::in_memory();
        assert_eq!(service.health().await.expect("health"), "memory");
    }
}
