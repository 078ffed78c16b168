use serde::{Deserialize, Serialize};

use registry_core::{InstitutionId, UserId};

use crate::Role;

/// The authenticated caller of one request.
///
/// Built once per request from the signed-in user and never persisted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSubject {
    pub user_id: UserId,
    pub role: Role,
    pub institution_id: InstitutionId,
}

impl AuthorizationSubject {
    pub fn new(user_id: UserId, role: Role, institution_id: InstitutionId) -> Self {
        Self {
            user_id,
            role,
            institution_id,
        }
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }
}
