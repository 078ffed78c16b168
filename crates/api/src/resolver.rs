//! Resource → owning institution resolution.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use registry_core::{InstitutionId, Ownership, ResourceId, ResourceType};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{resource_type} {resource_id} not found")]
    NotFound {
        resource_type: ResourceType,
        resource_id: ResourceId,
    },

    #[error("{resource_type} {resource_id} references missing generic file {file_id}")]
    ParentNotFound {
        resource_type: ResourceType,
        resource_id: ResourceId,
        file_id: ResourceId,
    },

    #[error("{0} rows have no owning institution")]
    Unsupported(ResourceType),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}

/// Finds the institution that governs one resource row.
///
/// Implementations must return the id that *governs* the row: the row's own
/// `institution_id`, the row itself for institutions, or the parent generic
/// file's institution for checksums and storage records.
#[async_trait]
pub trait ResourceTenantResolver: Send + Sync {
    async fn resolve(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
    ) -> Result<InstitutionId, ResolveError>;
}

#[async_trait]
impl<R> ResourceTenantResolver for Arc<R>
where
    R: ResourceTenantResolver + ?Sized,
{
    async fn resolve(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
    ) -> Result<InstitutionId, ResolveError> {
        (**self).resolve(resource_type, resource_id).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Institution(InstitutionId),
    File(ResourceId),
}

/// In-memory resolver for tests/dev.
///
/// Keeps every row it was asked to read, in order, so callers can see
/// which tables a resolution touched.
#[derive(Debug, Default)]
pub struct InMemoryResourceStore {
    rows: RwLock<HashMap<(ResourceType, ResourceId), Owner>>,
    trail: Mutex<Vec<(ResourceType, ResourceId)>>,
}

impl InMemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an institution row.
    pub fn insert_institution(&self, id: InstitutionId) {
        self.insert(
            ResourceType::Institution,
            ResourceId::new(id.get()),
            Owner::Institution(id),
        );
    }

    /// Register a row that carries its own `institution_id`.
    pub fn insert_owned(&self, resource_type: ResourceType, id: ResourceId, owner: InstitutionId) {
        self.insert(resource_type, id, Owner::Institution(owner));
    }

    /// Register a checksum or storage record under its generic file.
    pub fn insert_file_child(&self, resource_type: ResourceType, id: ResourceId, file_id: ResourceId) {
        self.insert(resource_type, id, Owner::File(file_id));
    }

    fn insert(&self, resource_type: ResourceType, id: ResourceId, owner: Owner) {
        if let Ok(mut rows) = self.rows.write() {
            rows.insert((resource_type, id), owner);
        }
    }

    /// Rows read so far, oldest first.
    pub fn lookups(&self) -> Vec<(ResourceType, ResourceId)> {
        self.trail.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn read(&self, resource_type: ResourceType, id: ResourceId) -> Result<Option<Owner>, ResolveError> {
        if let Ok(mut trail) = self.trail.lock() {
            trail.push((resource_type, id));
        }
        let rows = self
            .rows
            .read()
            .map_err(|_| anyhow::anyhow!("resource store lock poisoned"))?;
        Ok(rows.get(&(resource_type, id)).copied())
    }
}

#[async_trait]
impl ResourceTenantResolver for InMemoryResourceStore {
    async fn resolve(
        &self,
        resource_type: ResourceType,
        resource_id: ResourceId,
    ) -> Result<InstitutionId, ResolveError> {
        let not_found = || ResolveError::NotFound {
            resource_type,
            resource_id,
        };

        match resource_type.ownership() {
            Ownership::Unowned => Err(ResolveError::Unsupported(resource_type)),
            Ownership::Institution | Ownership::Direct => match self.read(resource_type, resource_id)? {
                Some(Owner::Institution(inst)) => Ok(inst),
                Some(Owner::File(_)) | None => Err(not_found()),
            },
            Ownership::ViaGenericFile => {
                let file_id = match self.read(resource_type, resource_id)? {
                    Some(Owner::File(file_id)) => file_id,
                    Some(Owner::Institution(_)) | None => return Err(not_found()),
                };
                match self.read(ResourceType::GenericFile, file_id)? {
                    Some(Owner::Institution(inst)) => Ok(inst),
                    Some(Owner::File(_)) | None => Err(ResolveError::ParentNotFound {
                        resource_type,
                        resource_id,
                        file_id,
                    }),
                }
            }
        }
    }
}
