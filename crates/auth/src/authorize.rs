use serde::Serialize;
use thiserror::Error;

use registry_core::InstitutionId;

use crate::{AuthorizationSubject, Permission, PermissionTable, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("institution mismatch: subject belongs to {subject}, resource to {owner}")]
    TenantMismatch {
        subject: InstitutionId,
        owner: InstitutionId,
    },

    #[error("forbidden: role '{role}' lacks permission '{permission}'")]
    Forbidden { role: Role, permission: Permission },
}

impl PermissionTable {
    /// Tenant-scoped permission check.
    ///
    /// Elevated subjects are checked against their role only. Everyone else
    /// must also belong to the institution that owns the resource.
    pub fn has_permission(
        &self,
        subject: &AuthorizationSubject,
        permission: Permission,
        owner: InstitutionId,
    ) -> bool {
        if subject.is_elevated() {
            return self.check(subject.role, permission);
        }
        subject.institution_id == owner && self.check(subject.role, permission)
    }

    /// Same decision as [`has_permission`](Self::has_permission), with the reason.
    ///
    /// - No IO
    /// - No panics
    pub fn authorize(
        &self,
        subject: &AuthorizationSubject,
        permission: Permission,
        owner: InstitutionId,
    ) -> Result<(), AuthzError> {
        if !subject.is_elevated() && subject.institution_id != owner {
            return Err(AuthzError::TenantMismatch {
                subject: subject.institution_id,
                owner,
            });
        }
        if !self.check(subject.role, permission) {
            return Err(AuthzError::Forbidden {
                role: subject.role,
                permission,
            });
        }
        Ok(())
    }

    /// Explain why a decision was (or would be) made, for audit display.
    pub fn explain(
        &self,
        subject: &AuthorizationSubject,
        permission: Permission,
        owner: InstitutionId,
    ) -> AuthorizationExplanation {
        let (granted, reason, denial) = match self.authorize(subject, permission, owner) {
            Ok(()) if subject.is_elevated() => (
                true,
                format!("role '{}' holds '{}' across all institutions", subject.role, permission),
                None,
            ),
            Ok(()) => (
                true,
                format!(
                    "role '{}' holds '{}' within institution {}",
                    subject.role, permission, owner
                ),
                None,
            ),
            Err(e @ AuthzError::TenantMismatch { .. }) => {
                (false, e.to_string(), Some(DenialKind::TenantMismatch))
            }
            Err(e @ AuthzError::Forbidden { .. }) => {
                (false, e.to_string(), Some(DenialKind::MissingGrant))
            }
        };

        AuthorizationExplanation {
            permission,
            granted,
            reason,
            subject: *subject,
            owner_institution_id: owner,
            denial,
            roles_granting: self.roles_granting(permission),
        }
    }
}

/// Detailed explanation of one authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub permission: Permission,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    pub subject: AuthorizationSubject,
    pub owner_institution_id: InstitutionId,
    pub denial: Option<DenialKind>,
    /// Roles that would have been granted this permission.
    pub roles_granting: Vec<Role>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    TenantMismatch,
    MissingGrant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use registry_core::UserId;

    fn subject(role: Role, inst: i64) -> AuthorizationSubject {
        AuthorizationSubject::new(UserId::new(10), role, InstitutionId::new(inst))
    }

    #[test]
    fn inst_admin_is_confined_to_own_institution() {
        let table = PermissionTable::new();
        let admin = subject(Role::InstAdmin, 2);
        let p = Permission::IntellectualObjectRestore;
        assert!(table.has_permission(&admin, p, InstitutionId::new(2)));
        assert!(!table.has_permission(&admin, p, InstitutionId::new(3)));
        assert_eq!(
            table.authorize(&admin, p, InstitutionId::new(3)),
            Err(AuthzError::TenantMismatch {
                subject: InstitutionId::new(2),
                owner: InstitutionId::new(3),
            })
        );
    }

    #[test]
    fn sys_admin_crosses_institutions_but_not_forbidden_grants() {
        let table = PermissionTable::new();
        let sys = subject(Role::SysAdmin, 1);
        assert!(table.has_permission(&sys, Permission::FileUpdate, InstitutionId::new(99)));
        assert!(!table.has_permission(&sys, Permission::EventDelete, InstitutionId::new(1)));
    }

    #[test]
    fn explanation_names_the_missing_grant() {
        let table = PermissionTable::new();
        let user = subject(Role::InstUser, 2);
        let ex = table.explain(&user, Permission::UserDelete, InstitutionId::new(2));
        assert!(!ex.granted);
        assert_eq!(ex.denial, Some(DenialKind::MissingGrant));
        assert_eq!(ex.roles_granting, vec![Role::SysAdmin, Role::InstAdmin]);

        let json = serde_json::to_value(&ex).unwrap();
        assert_eq!(json["denial"], "missing_grant");
        assert_eq!(json["permission"], "UserDelete");
    }

    #[test]
    fn explanation_reports_tenant_mismatch_first() {
        let table = PermissionTable::new();
        let user = subject(Role::InstUser, 2);
        let ex = table.explain(&user, Permission::UserDelete, InstitutionId::new(5));
        assert_eq!(ex.denial, Some(DenialKind::TenantMismatch));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the elevated role ignores the owner institution entirely.
        #[test]
        fn elevated_subject_ignores_owner(
            perm_idx in 0usize..Permission::ALL.len(),
            own in -5i64..1_000,
            owner in -5i64..1_000,
        ) {
            let table = PermissionTable::new();
            let perm = Permission::ALL[perm_idx];
            let sys = subject(Role::SysAdmin, own);
            prop_assert_eq!(
                table.has_permission(&sys, perm, InstitutionId::new(owner)),
                table.check(Role::SysAdmin, perm)
            );
            prop_assert_eq!(
                table.has_permission(&sys, perm, InstitutionId::new(0)),
                table.check(Role::SysAdmin, perm)
            );
        }

        /// Property: tenant-scoped subjects need both a matching institution and a grant.
        #[test]
        fn scoped_subject_needs_matching_institution(
            role_idx in 1usize..Role::ALL.len(),
            perm_idx in 0usize..Permission::ALL.len(),
            own in 0i64..5,
            owner in 0i64..5,
        ) {
            let table = PermissionTable::new();
            let role = Role::ALL[role_idx];
            let perm = Permission::ALL[perm_idx];
            let s = subject(role, own);
            prop_assert_eq!(
                table.has_permission(&s, perm, InstitutionId::new(owner)),
                own == owner && table.check(role, perm)
            );
            prop_assert_eq!(
                table.authorize(&s, perm, InstitutionId::new(owner)).is_ok(),
                table.has_permission(&s, perm, InstitutionId::new(owner))
            );
        }
    }
}
