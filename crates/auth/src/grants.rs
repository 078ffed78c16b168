//! Role → permission grant table.
//!
//! Grants are additive allow-lists. A permission missing from a role's list
//! is denied; a permission missing from every list is denied to everyone.
//! The table is built eagerly by [`PermissionTable::new`] before the server
//! takes traffic and is read-only afterwards, so it can be shared through an
//! `Arc` with no locking.

use std::collections::{HashMap, HashSet};

use crate::{Permission, Role};

use crate::permissions::Permission::*;

const INST_USER_GRANTS: &[Permission] = &[
    AlertRead,
    AlertUpdate,
    ChecksumRead,
    DashboardShow,
    DeletionRequestList,
    DeletionRequestShow,
    DepositReportShow,
    EventRead,
    FileRead,
    FileRequestDelete,
    FileRestore,
    InstitutionRead,
    IntellectualObjectRead,
    IntellectualObjectRequestDelete,
    IntellectualObjectRestore,
    ReportRead,
    StorageRecordRead,
    UserComplete2FASetup,
    UserConfirmPhone,
    UserGenerateBackupCodes,
    UserInit2FASetup,
    UserReadSelf,
    UserSignIn,
    UserSignOut,
    UserTwoFactorChoose,
    UserTwoFactorGenerateSMS,
    UserTwoFactorPush,
    UserTwoFactorResend,
    UserTwoFactorVerify,
    UserUpdateSelf,
    WorkItemRead,
];

const INST_ADMIN_GRANTS: &[Permission] = &[
    AlertRead,
    AlertUpdate,
    ChecksumRead,
    DashboardShow,
    DeletionRequestApprove,
    DeletionRequestList,
    DeletionRequestShow,
    DepositReportShow,
    EventRead,
    FileDelete,
    FileRead,
    FileRequestDelete,
    FileRestore,
    InstitutionRead,
    IntellectualObjectDelete,
    IntellectualObjectRead,
    IntellectualObjectRequestDelete,
    IntellectualObjectRestore,
    ReportRead,
    StorageRecordRead,
    UserComplete2FASetup,
    UserConfirmPhone,
    UserCreate,
    UserDelete,
    UserGenerateBackupCodes,
    UserInit2FASetup,
    UserRead,
    UserReadSelf,
    UserSignIn,
    UserSignOut,
    UserTwoFactorChoose,
    UserTwoFactorGenerateSMS,
    UserTwoFactorPush,
    UserTwoFactorResend,
    UserTwoFactorVerify,
    UserUpdate,
    UserUpdateSelf,
    WorkItemRead,
];

// ChecksumUpdate, ChecksumDelete, EventUpdate and EventDelete are absent on
// purpose: see FORBIDDEN_TO_ALL.
const SYS_ADMIN_GRANTS: &[Permission] = &[
    AlertCreate,
    AlertDelete,
    AlertRead,
    AlertUpdate,
    ChecksumCreate,
    ChecksumRead,
    DashboardShow,
    DeletionRequestApprove,
    DeletionRequestList,
    DeletionRequestShow,
    DepositReportShow,
    EventCreate,
    EventRead,
    FileCreate,
    FileDelete,
    FileFinishBulkDelete,
    FileRead,
    FileRequestDelete,
    FileRestore,
    FileUpdate,
    InstitutionCreate,
    InstitutionDelete,
    InstitutionList,
    InstitutionRead,
    InstitutionUpdate,
    IntellectualObjectCreate,
    IntellectualObjectDelete,
    IntellectualObjectFinishBulkDelete,
    IntellectualObjectRead,
    IntellectualObjectRequestDelete,
    IntellectualObjectRestore,
    IntellectualObjectUpdate,
    ReportRead,
    StorageRecordCreate,
    StorageRecordDelete,
    StorageRecordRead,
    StorageRecordUpdate,
    UserComplete2FASetup,
    UserConfirmPhone,
    UserCreate,
    UserDelete,
    UserDeleteSelf,
    UserGenerateBackupCodes,
    UserInit2FASetup,
    UserRead,
    UserReadSelf,
    UserSignIn,
    UserSignOut,
    UserTwoFactorChoose,
    UserTwoFactorGenerateSMS,
    UserTwoFactorPush,
    UserTwoFactorResend,
    UserTwoFactorVerify,
    UserUpdate,
    UserUpdateSelf,
    WorkItemCreate,
    WorkItemDelete,
    WorkItemRead,
    WorkItemRequeue,
    WorkItemUpdate,
];

/// Immutable role → granted-permissions map.
#[derive(Debug, Clone)]
pub struct PermissionTable {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl PermissionTable {
    /// Build the table. Call once during startup.
    pub fn new() -> Self {
        let mut grants = HashMap::with_capacity(Role::ALL.len());
        grants.insert(Role::SysAdmin, SYS_ADMIN_GRANTS.iter().copied().collect());
        grants.insert(Role::InstAdmin, INST_ADMIN_GRANTS.iter().copied().collect());
        grants.insert(Role::InstUser, INST_USER_GRANTS.iter().copied().collect());
        grants.insert(Role::None, HashSet::new());

        tracing::debug!(
            sys_admin = SYS_ADMIN_GRANTS.len(),
            inst_admin = INST_ADMIN_GRANTS.len(),
            inst_user = INST_USER_GRANTS.len(),
            "permission table built"
        );

        Self { grants }
    }

    /// Whether `role` is granted `permission`, ignoring institutions.
    pub fn check(&self, role: Role, permission: Permission) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|set| set.contains(&permission))
    }

    /// Permissions granted to `role`, in declaration order (for audit display).
    pub fn granted(&self, role: Role) -> Vec<Permission> {
        Permission::ALL
            .iter()
            .copied()
            .filter(|p| self.check(role, *p))
            .collect()
    }

    /// Roles that hold `permission`.
    pub fn roles_granting(&self, permission: Permission) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.check(*r, permission))
            .collect()
    }
}

impl Default for PermissionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FORBIDDEN_TO_ALL;
    use proptest::prelude::*;

    fn granted_list(role: Role) -> &'static [Permission] {
        match role {
            Role::SysAdmin => SYS_ADMIN_GRANTS,
            Role::InstAdmin => INST_ADMIN_GRANTS,
            Role::InstUser => INST_USER_GRANTS,
            Role::None => &[],
        }
    }

    #[test]
    fn forbidden_permissions_are_denied_to_every_role() {
        let table = PermissionTable::new();
        for role in Role::ALL {
            for p in FORBIDDEN_TO_ALL {
                assert!(!table.check(role, p), "{role} must not hold {p}");
            }
        }
    }

    #[test]
    fn none_role_holds_nothing() {
        let table = PermissionTable::new();
        assert!(table.granted(Role::None).is_empty());
    }

    #[test]
    fn inst_user_reads_self_but_not_other_users() {
        let table = PermissionTable::new();
        assert!(table.check(Role::InstUser, Permission::UserReadSelf));
        assert!(!table.check(Role::InstUser, Permission::UserRead));
        assert!(table.check(Role::InstAdmin, Permission::UserRead));
    }

    #[test]
    fn only_sys_admin_requeues_work_items() {
        let table = PermissionTable::new();
        assert_eq!(table.roles_granting(Permission::WorkItemRequeue), vec![Role::SysAdmin]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: check() is true exactly for the explicitly granted pairs.
        #[test]
        fn ungranted_pairs_are_denied(
            role_idx in 0usize..Role::ALL.len(),
            perm_idx in 0usize..Permission::ALL.len(),
        ) {
            let table = PermissionTable::new();
            let role = Role::ALL[role_idx];
            let perm = Permission::ALL[perm_idx];
            prop_assert_eq!(table.check(role, perm), granted_list(role).contains(&perm));
        }
    }
}
