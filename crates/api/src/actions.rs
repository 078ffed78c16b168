//! Static handler → (resource type, permission) map.
//!
//! Handler names are a versioned contract: a handler that is not listed here
//! cannot be authorized at all.

use std::collections::HashMap;

use serde::Serialize;

use registry_auth::Permission;
use registry_core::ResourceType;

/// Whether an action addresses one row or a whole list / new-row form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionScope {
    /// Requires a numeric `id`; the row's owner governs the check.
    Member,
    /// No row id; the `institution_id` param (or the caller's own) governs.
    Collection,
}

/// What one handler needs before it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionMeta {
    pub resource_type: ResourceType,
    pub permission: Permission,
    pub title: &'static str,
    pub scope: ActionScope,
}

macro_rules! action_table {
    ($($name:literal => ($resource:ident, $perm:ident, $title:literal, $scope:ident)),+ $(,)?) => {
        const ACTIONS: &[(&str, ActionMeta)] = &[
            $((
                $name,
                ActionMeta {
                    resource_type: ResourceType::$resource,
                    permission: Permission::$perm,
                    title: $title,
                    scope: ActionScope::$scope,
                },
            )),+
        ];
    };
}

action_table! {
    "AlertCreate" => (Alert, AlertCreate, "Create Alert", Collection),
    "AlertDelete" => (Alert, AlertDelete, "Delete Alert", Member),
    "AlertIndex" => (Alert, AlertRead, "Alerts", Collection),
    "AlertNew" => (Alert, AlertCreate, "New Alert", Collection),
    "AlertShow" => (Alert, AlertRead, "Alert", Member),
    "AlertUpdate" => (Alert, AlertUpdate, "Update Alert", Member),
    "AlertMarkAsReadXHR" => (Alert, AlertUpdate, "Mark Alert as Read", Member),
    "AlertMarkAllAsRead" => (Alert, AlertUpdate, "Mark All Alerts as Read", Collection),
    "AlertMarkAsUnreadXHR" => (Alert, AlertUpdate, "Mark Alert as Unread", Member),
    "ChecksumCreate" => (Checksum, ChecksumCreate, "Create Checksum", Collection),
    "ChecksumDelete" => (Checksum, ChecksumDelete, "Delete Checksum", Member),
    "ChecksumIndex" => (Checksum, ChecksumRead, "File Checksums", Collection),
    "ChecksumNew" => (Checksum, ChecksumCreate, "New Checksum", Collection),
    "ChecksumShow" => (Checksum, ChecksumRead, "Checksum Detail", Member),
    "ChecksumUpdate" => (Checksum, ChecksumUpdate, "Update Checksum", Member),
    "DashboardShow" => (Dashboard, DashboardShow, "Dashboard", Collection),
    "DeletionRequestApprove" => (DeletionRequest, DeletionRequestApprove, "Approve Deletion Request", Member),
    "DeletionRequestCancel" => (DeletionRequest, DeletionRequestApprove, "Cancel Deletion Request", Member),
    "DeletionRequestIndex" => (DeletionRequest, DeletionRequestList, "Deletion Requests", Collection),
    "DeletionRequestReview" => (DeletionRequest, DeletionRequestApprove, "Review Deletion Request", Member),
    "DeletionRequestShow" => (DeletionRequest, DeletionRequestShow, "Deletion Request", Member),
    "DepositReportShow" => (DepositStats, DepositReportShow, "Deposit Report", Collection),
    "GenericFileCreate" => (GenericFile, FileCreate, "Create Generic File", Collection),
    "GenericFileCreateBatch" => (GenericFile, FileCreate, "Create Generic File Batch", Collection),
    "GenericFileDelete" => (GenericFile, FileDelete, "Delete Generic File", Member),
    "GenericFileFinishBulkDelete" => (GenericFile, FileFinishBulkDelete, "Generic File Bulk Deletion Complete", Collection),
    "GenericFileIndex" => (GenericFile, FileRead, "Generic Files", Collection),
    "GenericFileInitDelete" => (GenericFile, FileRequestDelete, "Generic File - Begin Deletion", Member),
    "GenericFileInitRestore" => (GenericFile, FileRestore, "Generic File - Begin Restoration", Member),
    "GenericFileNew" => (GenericFile, FileCreate, "New Generic File", Collection),
    "GenericFileRequestDelete" => (GenericFile, FileRequestDelete, "Generic File - Request Deletion", Member),
    "GenericFileRequestRestore" => (GenericFile, FileRestore, "Generic File - Request Restoration", Member),
    "GenericFileShow" => (GenericFile, FileRead, "Generic File Detail", Member),
    "GenericFileUpdate" => (GenericFile, FileUpdate, "Update Generic File", Member),
    "InstitutionCreate" => (Institution, InstitutionCreate, "Create Institution", Collection),
    "InstitutionDelete" => (Institution, InstitutionDelete, "Deactivate Institution", Member),
    "InstitutionEdit" => (Institution, InstitutionUpdate, "Edit Institution", Member),
    "InstitutionIndex" => (Institution, InstitutionList, "Institutions", Collection),
    "InstitutionNew" => (Institution, InstitutionCreate, "New Institution", Collection),
    "InstitutionShow" => (Institution, InstitutionRead, "Institution Detail", Member),
    "InstitutionUndelete" => (Institution, InstitutionUpdate, "Reactivate Institution", Member),
    "InstitutionUpdate" => (Institution, InstitutionUpdate, "Update Institution", Member),
    "IntellectualObjectCreate" => (IntellectualObject, IntellectualObjectCreate, "Create Intellectual Object", Collection),
    "IntellectualObjectDelete" => (IntellectualObject, IntellectualObjectDelete, "Delete Intellectual Object", Member),
    // Addressed by object id, but lists the object's events.
    "IntellectualObjectEvents" => (IntellectualObject, EventRead, "PREMIS Events", Member),
    // Addressed by object id, but lists the object's files.
    "IntellectualObjectFiles" => (IntellectualObject, FileRead, "Object Files", Member),
    "IntellectualObjectFinishBulkDelete" => (IntellectualObject, IntellectualObjectFinishBulkDelete, "Intellectual Object - Finish Bulk Delete", Collection),
    "IntellectualObjectIndex" => (IntellectualObject, IntellectualObjectRead, "Intellectual Objects", Collection),
    "IntellectualObjectInitDelete" => (IntellectualObject, IntellectualObjectRequestDelete, "Initialize Object Deletion", Member),
    "IntellectualObjectInitRestore" => (IntellectualObject, IntellectualObjectRestore, "Initialize Object Restoration", Member),
    "IntellectualObjectNew" => (IntellectualObject, IntellectualObjectCreate, "New Intellectual Object", Collection),
    "IntellectualObjectRequestDelete" => (IntellectualObject, IntellectualObjectRequestDelete, "Request Object Deletion", Member),
    "IntellectualObjectRequestRestore" => (IntellectualObject, IntellectualObjectRestore, "Request Object Restoration", Member),
    "IntellectualObjectShow" => (IntellectualObject, IntellectualObjectRead, "Intellectual Object Detail", Member),
    "IntellectualObjectUpdate" => (IntellectualObject, IntellectualObjectUpdate, "Update Intellectual Object", Member),
    "PremisEventCreate" => (PremisEvent, EventCreate, "Create PREMIS Event", Collection),
    "PremisEventIndex" => (PremisEvent, EventRead, "PREMIS Events", Collection),
    "PremisEventShow" => (PremisEvent, EventRead, "PREMIS Event Detail", Member),
    "PremisEventShowXHR" => (PremisEvent, EventRead, "PREMIS Event Detail", Member),
    "ReportShow" => (Report, ReportRead, "Reports", Collection),
    "StorageRecordCreate" => (StorageRecord, StorageRecordCreate, "Create Storage Record", Collection),
    "StorageRecordDelete" => (StorageRecord, StorageRecordDelete, "Delete Storage Record", Member),
    "StorageRecordIndex" => (StorageRecord, StorageRecordRead, "Storage Records", Collection),
    "StorageRecordNew" => (StorageRecord, StorageRecordCreate, "New Storage Record", Collection),
    "StorageRecordShow" => (StorageRecord, StorageRecordRead, "Storage Record Detail", Member),
    "StorageRecordUpdate" => (StorageRecord, StorageRecordUpdate, "Update Storage Record", Member),
    "UserChangePassword" => (User, UserUpdateSelf, "Change Password", Collection),
    "UserComplete2FASetup" => (User, UserComplete2FASetup, "Setup Two-Factor Authentication", Collection),
    "UserConfirmPhone" => (User, UserConfirmPhone, "Confirm Phone Number", Collection),
    "UserCreate" => (User, UserCreate, "Create User", Collection),
    "UserDelete" => (User, UserDelete, "Deactivate User", Member),
    "UserDeleteSelf" => (User, UserDeleteSelf, "Deactivate Your Account", Collection),
    "UserEdit" => (User, UserUpdate, "Edit User", Member),
    "UserGenerateBackupCodes" => (User, UserGenerateBackupCodes, "Create Two-Factor Backup Codes", Collection),
    "UserGetAPIKey" => (User, UserUpdateSelf, "Generate API Key", Collection),
    "UserIndex" => (User, UserRead, "Users", Collection),
    "UserInit2FASetup" => (User, UserInit2FASetup, "Start Two-Factor Setup", Collection),
    "UserInitPasswordReset" => (User, UserUpdate, "Reset Password", Member),
    "UserMyAccount" => (User, UserUpdateSelf, "My Account", Collection),
    "UserNew" => (User, UserCreate, "New User", Collection),
    "UserReadSelf" => (User, UserReadSelf, "User Detail", Collection),
    "UserShow" => (User, UserRead, "User Detail", Member),
    "UserShowChangePassword" => (User, UserUpdateSelf, "Change Password", Collection),
    "UserSignIn" => (User, UserSignIn, "Sign In", Collection),
    "UserSignOut" => (User, UserSignOut, "Sign Out", Collection),
    "UserTwoFactorChoose" => (User, UserTwoFactorChoose, "Choose Two-Factor Method", Collection),
    "UserTwoFactorGenerateSMS" => (User, UserTwoFactorGenerateSMS, "Generate SMS Message", Collection),
    "UserTwoFactorPush" => (User, UserTwoFactorPush, "Send Push Message", Collection),
    "UserTwoFactorResend" => (User, UserTwoFactorResend, "Resend Two-Factor Token", Collection),
    "UserTwoFactorVerify" => (User, UserTwoFactorVerify, "Verify Two-Factor Authentication Method", Collection),
    "UserUndelete" => (User, UserUpdate, "Reactivate User", Member),
    "UserUpdate" => (User, UserUpdate, "Update User", Member),
    "UserUpdateXHR" => (User, UserUpdate, "Update User", Member),
    "UserUpdateSelf" => (User, UserUpdateSelf, "Update User", Collection),
    "WorkItemCreate" => (WorkItem, WorkItemCreate, "Create Work Item", Collection),
    "WorkItemDelete" => (WorkItem, WorkItemDelete, "Delete Work Item", Member),
    "WorkItemEdit" => (WorkItem, WorkItemUpdate, "Edit Work Item", Member),
    "WorkItemIndex" => (WorkItem, WorkItemRead, "Work Items", Collection),
    "WorkItemNew" => (WorkItem, WorkItemCreate, "New Work Item", Collection),
    "WorkItemRequeue" => (WorkItem, WorkItemRequeue, "Requeue Work Item", Member),
    "WorkItemShow" => (WorkItem, WorkItemRead, "Work Item Detail", Member),
    "WorkItemShowRequeue" => (WorkItem, WorkItemRequeue, "Requeue Work Item", Member),
    "WorkItemUpdate" => (WorkItem, WorkItemUpdate, "Update Work Item", Member),
}

/// The dispatch key for a possibly qualified handler name:
/// `web::GenericFileShow`, `web.GenericFileShow` and `GenericFileShow` all
/// become `GenericFileShow`.
pub fn dispatch_key(handler: &str) -> &str {
    let tail = handler.rsplit("::").next().unwrap_or(handler);
    tail.rsplit('.').next().unwrap_or(tail)
}

/// Immutable lookup from handler name to [`ActionMeta`].
#[derive(Debug, Clone)]
pub struct ActionMap {
    entries: HashMap<String, ActionMeta>,
}

impl ActionMap {
    /// The registry's built-in action table.
    pub fn standard() -> Self {
        Self {
            entries: ACTIONS
                .iter()
                .map(|(name, meta)| (name.to_string(), *meta))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with_action(mut self, handler: &str, meta: ActionMeta) -> Self {
        self.entries.insert(dispatch_key(handler).to_string(), meta);
        self
    }

    /// Look up a handler by (possibly qualified) name.
    pub fn get(&self, handler: &str) -> Option<&ActionMeta> {
        self.entries.get(dispatch_key(handler))
    }

    /// Every handler in `handlers` with no mapping, in input order.
    ///
    /// Run this over the router's handler list before serving traffic.
    pub fn unmapped<'a>(&self, handlers: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        handlers
            .into_iter()
            .filter(|h| self.get(h).is_none())
            .map(str::to_string)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionMeta)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ActionMap {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_core::Ownership;
    use std::collections::HashSet;

    #[test]
    fn qualified_handler_names_resolve_to_last_segment() {
        assert_eq!(dispatch_key("web::GenericFileShow"), "GenericFileShow");
        assert_eq!(dispatch_key("github.com/x/web.GenericFileShow"), "GenericFileShow");
        assert_eq!(dispatch_key("GenericFileShow"), "GenericFileShow");

        let map = ActionMap::standard();
        let meta = map.get("registry::web::ChecksumShow").unwrap();
        assert_eq!(meta.resource_type, ResourceType::Checksum);
        assert_eq!(meta.permission, Permission::ChecksumRead);
        assert_eq!(meta.scope, ActionScope::Member);
    }

    #[test]
    fn handler_names_are_unique() {
        let names: HashSet<&str> = ACTIONS.iter().map(|(n, _)| *n).collect();
        assert_eq!(names.len(), ACTIONS.len());
        assert_eq!(ActionMap::standard().len(), ACTIONS.len());
    }

    #[test]
    fn unowned_resources_only_have_collection_actions() {
        for (name, meta) in ActionMap::standard().iter() {
            if meta.resource_type.ownership() == Ownership::Unowned {
                assert_eq!(meta.scope, ActionScope::Collection, "{name}");
            }
        }
    }

    #[test]
    fn self_account_actions_never_take_a_row_id() {
        for (name, meta) in ActionMap::standard().iter() {
            if meta.permission.is_self_account() {
                assert_eq!(meta.scope, ActionScope::Collection, "{name}");
            }
        }
    }

    #[test]
    fn unmapped_reports_missing_handlers_in_order() {
        let map = ActionMap::standard();
        let missing = map.unmapped(["UserShow", "NsqAdmin", "web.WorkItemIndex", "FooBar"]);
        assert_eq!(missing, vec!["NsqAdmin".to_string(), "FooBar".to_string()]);
    }
}
