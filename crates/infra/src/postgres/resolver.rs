//! Postgres-backed resource → institution resolution.
//!
//! One indexed primary-key lookup per resolution, two for checksums and
//! storage records (row, then its generic file).

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use registry_api::{ResolveError, ResourceTenantResolver};
use registry_core::{InstitutionId, Ownership, ResourceId, ResourceType};

#[derive(Debug, Clone)]
pub struct PgTenantResolver {
    pool: Arc<PgPool>,
}

/// Backing table of each row-backed resource type.
fn table_for(resource_type: ResourceType) -> Option<&'static str> {
    match resource_type {
        ResourceType::Alert => Some("alerts"),
        ResourceType::Checksum => Some("checksums"),
        ResourceType::DeletionRequest => Some("deletion_requests"),
        ResourceType::GenericFile => Some("generic_files"),
        ResourceType::Institution => Some("institutions"),
        ResourceType::IntellectualObject => Some("intellectual_objects"),
        ResourceType::PremisEvent => Some("premis_events"),
        ResourceType::StorageRecord => Some("storage_records"),
        ResourceType::User => Some("users"),
        ResourceType::WorkItem => Some("work_items"),
        ResourceType::Dashboard | ResourceType::DepositStats | ResourceType::Report => None,
    }
}

impl PgTenantResolver {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn fetch_id(&self, sql: &str, id: i64, operation: &str) -> Result<Option<i64>, ResolveError> {
        let found: Option<i64> = sqlx::query_scalar(sql)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .with_context(|| format!("tenant lookup failed in {operation}"))?;
        Ok(found)
    }
}

#[async_trait]
impl ResourceTenantResolver for PgTenantResolver {
    #[instrument(
        skip(self),
        fields(resource_type = %resource_type, resource_id = %resource_id),
        err
    )]
    async fn resolve(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
    ) -> Result<InstitutionId, ResolveError> {
        let table = table_for(resource_type).ok_or(ResolveError::Unsupported(resource_type))?;
        let not_found = || ResolveError::NotFound {
            resource_type,
            resource_id,
        };

        match resource_type.ownership() {
            Ownership::Institution => self
                .fetch_id("SELECT id FROM institutions WHERE id = $1", resource_id.get(), "institutions")
                .await?
                .map(InstitutionId::new)
                .ok_or_else(not_found),
            Ownership::Direct => {
                let sql = format!("SELECT institution_id FROM {table} WHERE id = $1");
                self.fetch_id(&sql, resource_id.get(), table)
                    .await?
                    .map(InstitutionId::new)
                    .ok_or_else(not_found)
            }
            Ownership::ViaGenericFile => {
                let sql = format!("SELECT generic_file_id FROM {table} WHERE id = $1");
                let file_id = self
                    .fetch_id(&sql, resource_id.get(), table)
                    .await?
                    .map(ResourceId::new)
                    .ok_or_else(not_found)?;
                self.fetch_id(
                    "SELECT institution_id FROM generic_files WHERE id = $1",
                    file_id.get(),
                    "generic_files",
                )
                .await?
                .map(InstitutionId::new)
                .ok_or(ResolveError::ParentNotFound {
                    resource_type,
                    resource_id,
                    file_id,
                })
            }
            Ownership::Unowned => Err(ResolveError::Unsupported(resource_type)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn every_owned_type_has_a_table() {
        for t in ResourceType::ALL {
            assert_eq!(
                table_for(t).is_some(),
                t.ownership() != Ownership::Unowned,
                "{t}"
            );
        }
    }

    #[tokio::test]
    async fn unowned_types_fail_without_a_round_trip() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://registry@localhost/registry")
            .unwrap();
        let resolver = PgTenantResolver::new(pool);
        let err = resolver
            .resolve(ResourceType::Report, ResourceId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Unsupported(ResourceType::Report)));
    }
}
