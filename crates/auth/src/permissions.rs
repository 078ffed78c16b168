//! Permission catalogue.
//!
//! Every permission is declared exactly once together with the
//! `(ResourceType, Verb)` pair it governs, so lookups by pair are resolved by
//! generated match arms instead of by concatenating names.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use registry_core::ResourceType;

/// Action half of a permission.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verb {
    Approve,
    CompleteTwoFactorSetup,
    ConfirmPhone,
    Create,
    Delete,
    DeleteSelf,
    FinishBulkDelete,
    GenerateBackupCodes,
    InitTwoFactorSetup,
    List,
    Read,
    ReadSelf,
    Requeue,
    RequestDelete,
    Restore,
    Show,
    SignIn,
    SignOut,
    TwoFactorChoose,
    TwoFactorGenerateSms,
    TwoFactorPush,
    TwoFactorResend,
    TwoFactorVerify,
    Update,
    UpdateSelf,
}

impl Verb {
    /// The self-account counterpart of a general verb, if it has one.
    pub fn self_variant(self) -> Option<Verb> {
        match self {
            Verb::Read => Some(Verb::ReadSelf),
            Verb::Update => Some(Verb::UpdateSelf),
            Verb::Delete => Some(Verb::DeleteSelf),
            _ => None,
        }
    }
}

macro_rules! permissions {
    ($($name:ident => ($resource:ident, $verb:ident)),+ $(,)?) => {
        /// Permission identifier, one per (resource type, verb) pair.
        ///
        /// Serialized and displayed by variant name (`"FileRequestDelete"`).
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Permission {
            $($name),+
        }

        impl Permission {
            pub const ALL: &'static [Permission] = &[$(Permission::$name),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $(Permission::$name => stringify!($name)),+
                }
            }

            pub fn resource_type(self) -> ResourceType {
                match self {
                    $(Permission::$name => ResourceType::$resource),+
                }
            }

            pub fn verb(self) -> Verb {
                match self {
                    $(Permission::$name => Verb::$verb),+
                }
            }

            /// Resolve a (resource type, verb) pair to its permission.
            pub fn from_parts(resource: ResourceType, verb: Verb) -> Option<Permission> {
                match (resource, verb) {
                    $((ResourceType::$resource, Verb::$verb) => Some(Permission::$name),)+
                    _ => None,
                }
            }
        }
    };
}

permissions! {
    AlertCreate => (Alert, Create),
    AlertDelete => (Alert, Delete),
    AlertRead => (Alert, Read),
    AlertUpdate => (Alert, Update),
    ChecksumCreate => (Checksum, Create),
    ChecksumDelete => (Checksum, Delete),
    ChecksumRead => (Checksum, Read),
    ChecksumUpdate => (Checksum, Update),
    DashboardShow => (Dashboard, Show),
    DeletionRequestApprove => (DeletionRequest, Approve),
    DeletionRequestList => (DeletionRequest, List),
    DeletionRequestShow => (DeletionRequest, Show),
    DepositReportShow => (DepositStats, Show),
    EventCreate => (PremisEvent, Create),
    EventDelete => (PremisEvent, Delete),
    EventRead => (PremisEvent, Read),
    EventUpdate => (PremisEvent, Update),
    FileCreate => (GenericFile, Create),
    FileDelete => (GenericFile, Delete),
    FileFinishBulkDelete => (GenericFile, FinishBulkDelete),
    FileRead => (GenericFile, Read),
    FileRequestDelete => (GenericFile, RequestDelete),
    FileRestore => (GenericFile, Restore),
    FileUpdate => (GenericFile, Update),
    InstitutionCreate => (Institution, Create),
    InstitutionDelete => (Institution, Delete),
    InstitutionList => (Institution, List),
    InstitutionRead => (Institution, Read),
    InstitutionUpdate => (Institution, Update),
    IntellectualObjectCreate => (IntellectualObject, Create),
    IntellectualObjectDelete => (IntellectualObject, Delete),
    IntellectualObjectFinishBulkDelete => (IntellectualObject, FinishBulkDelete),
    IntellectualObjectRead => (IntellectualObject, Read),
    IntellectualObjectRequestDelete => (IntellectualObject, RequestDelete),
    IntellectualObjectRestore => (IntellectualObject, Restore),
    IntellectualObjectUpdate => (IntellectualObject, Update),
    ReportRead => (Report, Read),
    StorageRecordCreate => (StorageRecord, Create),
    StorageRecordDelete => (StorageRecord, Delete),
    StorageRecordRead => (StorageRecord, Read),
    StorageRecordUpdate => (StorageRecord, Update),
    UserComplete2FASetup => (User, CompleteTwoFactorSetup),
    UserConfirmPhone => (User, ConfirmPhone),
    UserCreate => (User, Create),
    UserDelete => (User, Delete),
    UserDeleteSelf => (User, DeleteSelf),
    UserGenerateBackupCodes => (User, GenerateBackupCodes),
    UserInit2FASetup => (User, InitTwoFactorSetup),
    UserRead => (User, Read),
    UserReadSelf => (User, ReadSelf),
    UserSignIn => (User, SignIn),
    UserSignOut => (User, SignOut),
    UserTwoFactorChoose => (User, TwoFactorChoose),
    UserTwoFactorGenerateSMS => (User, TwoFactorGenerateSms),
    UserTwoFactorPush => (User, TwoFactorPush),
    UserTwoFactorResend => (User, TwoFactorResend),
    UserTwoFactorVerify => (User, TwoFactorVerify),
    UserUpdate => (User, Update),
    UserUpdateSelf => (User, UpdateSelf),
    WorkItemCreate => (WorkItem, Create),
    WorkItemDelete => (WorkItem, Delete),
    WorkItemRead => (WorkItem, Read),
    WorkItemRequeue => (WorkItem, Requeue),
    WorkItemUpdate => (WorkItem, Update),
}

/// Append-only audit records. No role, elevated or not, is ever granted these.
pub const FORBIDDEN_TO_ALL: [Permission; 4] = [
    Permission::ChecksumUpdate,
    Permission::ChecksumDelete,
    Permission::EventUpdate,
    Permission::EventDelete,
];

impl Permission {
    /// The `*Self` variant to check when a user acts on their own account.
    pub fn self_variant(self) -> Option<Permission> {
        Permission::from_parts(self.resource_type(), self.verb().self_variant()?)
    }

    /// Permissions that let users manage their own account (password, phone,
    /// two-factor setup). Granted by user id rather than by institution.
    pub fn is_self_account(self) -> bool {
        matches!(
            self,
            Permission::UserComplete2FASetup
                | Permission::UserConfirmPhone
                | Permission::UserDeleteSelf
                | Permission::UserGenerateBackupCodes
                | Permission::UserInit2FASetup
                | Permission::UserReadSelf
                | Permission::UserUpdateSelf
        )
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown permission '{0}'")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_resolve_to_their_permission() {
        for &p in Permission::ALL {
            assert_eq!(Permission::from_parts(p.resource_type(), p.verb()), Some(p));
        }
    }

    #[test]
    fn checksum_delete_is_looked_up_by_pair() {
        assert_eq!(
            Permission::from_parts(ResourceType::Checksum, Verb::Delete),
            Some(Permission::ChecksumDelete)
        );
        assert_eq!(Permission::from_parts(ResourceType::Dashboard, Verb::Delete), None);
    }

    #[test]
    fn only_user_read_update_delete_have_self_variants() {
        assert_eq!(Permission::UserRead.self_variant(), Some(Permission::UserReadSelf));
        assert_eq!(Permission::UserUpdate.self_variant(), Some(Permission::UserUpdateSelf));
        assert_eq!(Permission::UserDelete.self_variant(), Some(Permission::UserDeleteSelf));
        assert_eq!(Permission::UserCreate.self_variant(), None);
        assert_eq!(Permission::FileRead.self_variant(), None);
    }

    #[test]
    fn wire_names_match_variant_names() {
        assert_eq!(Permission::UserComplete2FASetup.as_str(), "UserComplete2FASetup");
        assert_eq!("FileRequestDelete".parse::<Permission>().unwrap(), Permission::FileRequestDelete);
        assert_eq!(
            serde_json::to_string(&Permission::WorkItemRequeue).unwrap(),
            "\"WorkItemRequeue\""
        );
        assert!("FileNuke".parse::<Permission>().is_err());
    }
}
