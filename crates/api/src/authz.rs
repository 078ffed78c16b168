//! Resource authorization gate.
//!
//! Every gated request runs one pipeline:
//! `ParseRoute → LookupRequiredPermission → ResolveOwnerTenant → Check`,
//! ending in exactly one of Approved, Denied or Error. Nothing is approved
//! until the owning institution is known.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use registry_auth::{AuthorizationSubject, Permission, PermissionTable};
use registry_core::{InstitutionId, ResourceId, ResourceType};

use crate::actions::{ActionMap, ActionMeta, ActionScope, dispatch_key};
use crate::config::GateConfig;
use crate::context::RouteParams;
use crate::resolver::{ResolveError, ResourceTenantResolver};

#[derive(Debug, Error)]
pub enum AuthorizationError {
    #[error("malformed route for {action}: {reason}")]
    MalformedRoute { action: String, reason: String },

    #[error("no permission mapping for action '{action}'")]
    MissingPermissionMapping { action: String },

    #[error("resource lookup failed: {0}")]
    ResourceLookup(#[source] ResolveError),

    #[error("permission '{permission}' denied for {action} (institution {resource_institution_id})")]
    PermissionDenied {
        action: String,
        permission: Permission,
        resource_institution_id: InstitutionId,
    },
}

/// Terminal state of one authorization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationOutcome {
    Approved,
    Denied,
    Error,
}

/// Everything the gate learned about one request, kept for the handler and
/// for logging. Discarded at the end of the request.
#[derive(Debug)]
pub struct ResourceAuthorization {
    pub request_id: Uuid,
    pub action: String,
    pub resource_type: Option<ResourceType>,
    pub resource_id: Option<ResourceId>,
    pub resolved_institution_id: Option<InstitutionId>,
    pub permission: Option<Permission>,
    pub title: Option<&'static str>,
    pub checked: bool,
    pub approved: bool,
    pub error: Option<AuthorizationError>,
}

impl ResourceAuthorization {
    fn start(handler: &str) -> Self {
        Self {
            request_id: Uuid::now_v7(),
            action: dispatch_key(handler).to_string(),
            resource_type: None,
            resource_id: None,
            resolved_institution_id: None,
            permission: None,
            title: None,
            checked: false,
            approved: false,
            error: None,
        }
    }

    pub fn outcome(&self) -> AuthorizationOutcome {
        match &self.error {
            None if self.checked && self.approved => AuthorizationOutcome::Approved,
            Some(AuthorizationError::PermissionDenied { .. }) => AuthorizationOutcome::Denied,
            _ => AuthorizationOutcome::Error,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.outcome() == AuthorizationOutcome::Approved
    }

    /// Consume the record, keeping it only when the request may proceed.
    pub fn into_result(mut self) -> Result<Self, AuthorizationError> {
        match self.error.take() {
            Some(err) => Err(err),
            None if self.checked && self.approved => Ok(self),
            // A pipeline that ended without a check must never pass.
            None => Err(AuthorizationError::MissingPermissionMapping {
                action: self.action.clone(),
            }),
        }
    }
}

/// Where the governing institution of a request comes from.
enum Target {
    Row(ResourceId),
    Institution(InstitutionId),
}

/// The per-request authorization gate.
///
/// Holds only read-only shared state, so one gate serves every request.
pub struct AuthorizationGate<R> {
    table: Arc<PermissionTable>,
    actions: Arc<ActionMap>,
    resolver: R,
    config: GateConfig,
}

impl<R: ResourceTenantResolver> AuthorizationGate<R> {
    pub fn new(
        table: Arc<PermissionTable>,
        actions: Arc<ActionMap>,
        resolver: R,
        config: GateConfig,
    ) -> Self {
        Self {
            table,
            actions,
            resolver,
            config,
        }
    }

    /// Build the grant table eagerly and refuse to start if any of the
    /// router's handlers lacks a permission mapping.
    pub fn bootstrap<'a>(
        resolver: R,
        config: GateConfig,
        handlers: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, AuthorizationError> {
        let actions = ActionMap::standard();
        let unmapped = actions.unmapped(handlers);
        if !unmapped.is_empty() {
            tracing::error!(handlers = ?unmapped, "handlers without permission mapping");
            return Err(AuthorizationError::MissingPermissionMapping {
                action: unmapped.join(", "),
            });
        }
        Ok(Self::new(
            Arc::new(PermissionTable::new()),
            Arc::new(actions),
            resolver,
            config,
        ))
    }

    pub fn table(&self) -> &PermissionTable {
        &self.table
    }

    pub fn actions(&self) -> &ActionMap {
        &self.actions
    }

    /// Run the authorization pipeline for one request.
    ///
    /// # Panics
    ///
    /// When the handler has no mapping and `panic_on_missing_mapping` is set.
    pub async fn authorize(
        &self,
        subject: &AuthorizationSubject,
        route: &RouteParams,
    ) -> ResourceAuthorization {
        let mut auth = ResourceAuthorization::start(route.handler());
        if let Err(err) = self.run(&mut auth, subject, route).await {
            self.log_failure(&auth, subject, &err);
            auth.error = Some(err);
        } else {
            tracing::debug!(
                request_id = %auth.request_id,
                action = %auth.action,
                actor_id = %subject.user_id,
                permission = ?auth.permission,
                resource_institution_id = ?auth.resolved_institution_id,
                "authorization approved"
            );
        }
        auth
    }

    async fn run(
        &self,
        auth: &mut ResourceAuthorization,
        subject: &AuthorizationSubject,
        route: &RouteParams,
    ) -> Result<(), AuthorizationError> {
        let meta = self.lookup(auth)?;
        auth.resource_type = Some(meta.resource_type);
        auth.title = Some(meta.title);

        let target = parse_route(auth, &meta, subject, route)?;

        let owner = match target {
            Target::Institution(inst) => inst,
            Target::Row(id) => self
                .resolver
                .resolve(meta.resource_type, id)
                .await
                .map_err(AuthorizationError::ResourceLookup)?,
        };
        auth.resolved_institution_id = Some(owner);

        let permission = required_permission(&meta, subject, auth.resource_id);
        auth.permission = Some(permission);

        auth.approved = self.table.has_permission(subject, permission, owner);
        auth.checked = true;
        if !auth.approved {
            return Err(AuthorizationError::PermissionDenied {
                action: auth.action.clone(),
                permission,
                resource_institution_id: owner,
            });
        }
        Ok(())
    }

    fn lookup(&self, auth: &ResourceAuthorization) -> Result<ActionMeta, AuthorizationError> {
        match self.actions.get(&auth.action) {
            Some(meta) => Ok(*meta),
            None => {
                tracing::error!(
                    request_id = %auth.request_id,
                    action = %auth.action,
                    "no permission mapping for action"
                );
                if self.config.panic_on_missing_mapping {
                    panic!("no permission mapping for action '{}'", auth.action);
                }
                Err(AuthorizationError::MissingPermissionMapping {
                    action: auth.action.clone(),
                })
            }
        }
    }

    fn log_failure(
        &self,
        auth: &ResourceAuthorization,
        subject: &AuthorizationSubject,
        err: &AuthorizationError,
    ) {
        match err {
            AuthorizationError::PermissionDenied { .. } => tracing::warn!(
                request_id = %auth.request_id,
                action = %auth.action,
                actor_id = %subject.user_id,
                actor_institution_id = %subject.institution_id,
                resource_type = ?auth.resource_type,
                resource_id = ?auth.resource_id,
                resource_institution_id = ?auth.resolved_institution_id,
                permission = ?auth.permission,
                "permission denied"
            ),
            AuthorizationError::ResourceLookup(e) if e.is_not_found() => tracing::info!(
                request_id = %auth.request_id,
                action = %auth.action,
                resource_type = ?auth.resource_type,
                resource_id = ?auth.resource_id,
                "resource not found"
            ),
            AuthorizationError::ResourceLookup(e) => tracing::error!(
                request_id = %auth.request_id,
                action = %auth.action,
                resource_type = ?auth.resource_type,
                resource_id = ?auth.resource_id,
                error = %e,
                "resource lookup failed"
            ),
            AuthorizationError::MalformedRoute { reason, .. } => tracing::debug!(
                request_id = %auth.request_id,
                action = %auth.action,
                reason = %reason,
                "malformed route"
            ),
            // Logged in `lookup`, before the optional panic.
            AuthorizationError::MissingPermissionMapping { .. } => {}
        }
    }
}

fn parse_route(
    auth: &mut ResourceAuthorization,
    meta: &ActionMeta,
    subject: &AuthorizationSubject,
    route: &RouteParams,
) -> Result<Target, AuthorizationError> {
    let action = auth.action.clone();
    let malformed = |reason: String| AuthorizationError::MalformedRoute {
        action: action.clone(),
        reason,
    };

    match meta.scope {
        ActionScope::Member => {
            let raw = route.id().ok_or_else(|| malformed("missing id".to_string()))?;
            let id: ResourceId = raw
                .parse()
                .map_err(|_| malformed(format!("non-numeric id '{raw}'")))?;
            auth.resource_id = Some(id);
            if meta.resource_type == ResourceType::Institution {
                // Institution rows are their own tenant.
                return Ok(Target::Institution(id.as_institution()));
            }
            Ok(Target::Row(id))
        }
        ActionScope::Collection => match route.institution_id() {
            Some(raw) => raw
                .parse::<InstitutionId>()
                .map(Target::Institution)
                .map_err(|_| malformed(format!("non-numeric institution_id '{raw}'"))),
            None => Ok(Target::Institution(subject.institution_id)),
        },
    }
}

/// Users acting on their own account are checked against the `*Self`
/// variant of the mapped permission.
fn required_permission(
    meta: &ActionMeta,
    subject: &AuthorizationSubject,
    resource_id: Option<ResourceId>,
) -> Permission {
    let acting_on_self = meta.resource_type == ResourceType::User
        && resource_id.is_some_and(|id| id.as_user() == subject.user_id);
    if acting_on_self {
        meta.permission.self_variant().unwrap_or(meta.permission)
    } else {
        meta.permission
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::InMemoryResourceStore;
    use proptest::prelude::*;
    use registry_auth::Role;
    use registry_core::UserId;

    fn subject(role: Role, user: i64, inst: i64) -> AuthorizationSubject {
        AuthorizationSubject::new(UserId::new(user), role, InstitutionId::new(inst))
    }

    fn rid(id: i64) -> ResourceId {
        ResourceId::new(id)
    }

    fn gate(store: Arc<InMemoryResourceStore>) -> AuthorizationGate<Arc<InMemoryResourceStore>> {
        AuthorizationGate::new(
            Arc::new(PermissionTable::new()),
            Arc::new(ActionMap::standard()),
            store,
            GateConfig::production(),
        )
    }

    fn seeded() -> Arc<InMemoryResourceStore> {
        let store = InMemoryResourceStore::new();
        store.insert_institution(InstitutionId::new(2));
        store.insert_institution(InstitutionId::new(3));
        store.insert_owned(ResourceType::IntellectualObject, rid(20), InstitutionId::new(2));
        store.insert_owned(ResourceType::IntellectualObject, rid(30), InstitutionId::new(3));
        store.insert_owned(ResourceType::GenericFile, rid(300), InstitutionId::new(3));
        store.insert_file_child(ResourceType::Checksum, rid(3000), rid(300));
        store.insert_owned(ResourceType::User, rid(7), InstitutionId::new(2));
        store.insert_owned(ResourceType::User, rid(8), InstitutionId::new(2));
        Arc::new(store)
    }

    #[tokio::test]
    async fn inst_admin_may_restore_only_own_institutions_objects() {
        let gate = gate(seeded());
        let admin = subject(Role::InstAdmin, 7, 2);

        let own = gate
            .authorize(&admin, &RouteParams::new("IntellectualObjectRequestRestore").with_id("20"))
            .await;
        assert_eq!(own.outcome(), AuthorizationOutcome::Approved);
        assert_eq!(own.permission, Some(Permission::IntellectualObjectRestore));
        assert_eq!(own.resolved_institution_id, Some(InstitutionId::new(2)));

        let other = gate
            .authorize(&admin, &RouteParams::new("IntellectualObjectRequestRestore").with_id("30"))
            .await;
        assert_eq!(other.outcome(), AuthorizationOutcome::Denied);
        assert!(other.checked);
        assert!(!other.approved);
    }

    #[tokio::test]
    async fn checksum_is_governed_by_its_parent_file() {
        let store = seeded();
        let gate = gate(store.clone());
        let admin = subject(Role::InstAdmin, 7, 2);

        let auth = gate
            .authorize(&admin, &RouteParams::new("web.ChecksumShow").with_id("3000"))
            .await;
        assert_eq!(auth.outcome(), AuthorizationOutcome::Denied);
        assert_eq!(auth.resolved_institution_id, Some(InstitutionId::new(3)));
        assert_eq!(
            store.lookups(),
            vec![
                (ResourceType::Checksum, rid(3000)),
                (ResourceType::GenericFile, rid(300)),
            ]
        );
    }

    #[tokio::test]
    async fn missing_mapping_is_an_error_not_a_denial() {
        let store = seeded();
        let gate = gate(store.clone());
        let auth = gate
            .authorize(&subject(Role::SysAdmin, 1, 1), &RouteParams::new("NsqAdmin").with_id("1"))
            .await;
        assert_eq!(auth.outcome(), AuthorizationOutcome::Error);
        assert!(!auth.checked);
        assert!(matches!(
            auth.error,
            Some(AuthorizationError::MissingPermissionMapping { .. })
        ));
        // Nothing was looked up for an unmapped action.
        assert!(store.lookups().is_empty());
    }

    #[tokio::test]
    #[should_panic(expected = "no permission mapping")]
    async fn missing_mapping_panics_when_configured_to_fail_loud() {
        let gate = AuthorizationGate::new(
            Arc::new(PermissionTable::new()),
            Arc::new(ActionMap::standard()),
            seeded(),
            GateConfig {
                environment: "development".into(),
                panic_on_missing_mapping: true,
            },
        );
        gate.authorize(&subject(Role::SysAdmin, 1, 1), &RouteParams::new("Unregistered"))
            .await;
    }

    #[tokio::test]
    async fn member_routes_need_a_numeric_id() {
        let gate = gate(seeded());
        let user = subject(Role::InstUser, 7, 2);
        for route in [
            RouteParams::new("GenericFileShow"),
            RouteParams::new("GenericFileShow").with_id("abc"),
            RouteParams::new("GenericFileShow").with_id(" "),
        ] {
            let auth = gate.authorize(&user, &route).await;
            assert_eq!(auth.outcome(), AuthorizationOutcome::Error);
            assert!(matches!(
                auth.error,
                Some(AuthorizationError::MalformedRoute { .. })
            ));
        }
    }

    #[tokio::test]
    async fn unknown_rows_are_lookup_errors() {
        let gate = gate(seeded());
        let auth = gate
            .authorize(&subject(Role::SysAdmin, 1, 1), &RouteParams::new("WorkItemShow").with_id("404"))
            .await;
        assert_eq!(auth.outcome(), AuthorizationOutcome::Error);
        assert!(matches!(
            auth.error,
            Some(AuthorizationError::ResourceLookup(ref e)) if e.is_not_found()
        ));
    }

    #[tokio::test]
    async fn institution_routes_use_the_id_as_tenant() {
        let gate = gate(seeded());
        let admin = subject(Role::InstAdmin, 7, 2);
        let own = gate
            .authorize(&admin, &RouteParams::new("InstitutionShow").with_id("2"))
            .await;
        assert!(own.is_approved());
        let other = gate
            .authorize(&admin, &RouteParams::new("InstitutionEdit").with_id("3"))
            .await;
        assert_eq!(other.outcome(), AuthorizationOutcome::Denied);
    }

    #[tokio::test]
    async fn collection_routes_default_to_the_callers_institution() {
        let gate = gate(seeded());
        let user = subject(Role::InstUser, 7, 2);

        let own = gate.authorize(&user, &RouteParams::new("GenericFileIndex")).await;
        assert!(own.is_approved());
        assert_eq!(own.resolved_institution_id, Some(InstitutionId::new(2)));

        let other = gate
            .authorize(&user, &RouteParams::new("GenericFileIndex").with_institution_id("3"))
            .await;
        assert_eq!(other.outcome(), AuthorizationOutcome::Denied);

        let sys = subject(Role::SysAdmin, 1, 1);
        let any = gate
            .authorize(&sys, &RouteParams::new("GenericFileIndex").with_institution_id("3"))
            .await;
        assert!(any.is_approved());
    }

    #[tokio::test]
    async fn users_editing_themselves_need_the_self_permission() {
        let gate = gate(seeded());
        let user = subject(Role::InstUser, 7, 2);

        let own = gate
            .authorize(&user, &RouteParams::new("UserShow").with_id("7"))
            .await;
        assert_eq!(own.permission, Some(Permission::UserReadSelf));
        assert!(own.is_approved());

        let colleague = gate
            .authorize(&user, &RouteParams::new("UserEdit").with_id("8"))
            .await;
        assert_eq!(colleague.permission, Some(Permission::UserUpdate));
        assert_eq!(colleague.outcome(), AuthorizationOutcome::Denied);
    }

    #[tokio::test]
    async fn audit_records_cannot_be_changed_even_by_sys_admins() {
        let gate = gate(seeded());
        let auth = gate
            .authorize(&subject(Role::SysAdmin, 1, 1), &RouteParams::new("ChecksumUpdate").with_id("3000"))
            .await;
        assert_eq!(auth.outcome(), AuthorizationOutcome::Denied);
    }

    #[tokio::test]
    async fn into_result_only_passes_approved_requests() {
        let gate = gate(seeded());
        let user = subject(Role::InstUser, 7, 2);
        assert!(gate
            .authorize(&user, &RouteParams::new("IntellectualObjectShow").with_id("20"))
            .await
            .into_result()
            .is_ok());
        let err = gate
            .authorize(&user, &RouteParams::new("IntellectualObjectShow").with_id("30"))
            .await
            .into_result()
            .unwrap_err();
        assert!(matches!(err, AuthorizationError::PermissionDenied { .. }));
    }

    fn role() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a member route is approved exactly when the checker approves
        /// the resolved owner, and never approved otherwise.
        #[test]
        fn gate_agrees_with_the_checker(role in role(), actor_inst in 0i64..4, owner_inst in 0i64..4) {
            let store = InMemoryResourceStore::new();
            store.insert_owned(ResourceType::WorkItem, rid(1), InstitutionId::new(owner_inst));
            let gate = gate(Arc::new(store));
            let actor = subject(role, 100, actor_inst);

            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let auth = rt.block_on(gate.authorize(&actor, &RouteParams::new("WorkItemUpdate").with_id("1")));

            let expected = gate
                .table()
                .has_permission(&actor, Permission::WorkItemUpdate, InstitutionId::new(owner_inst));
            prop_assert_eq!(auth.is_approved(), expected);
            prop_assert!(auth.checked);
        }
    }

    #[test]
    fn bootstrap_refuses_unmapped_handlers() {
        let result = AuthorizationGate::bootstrap(
            InMemoryResourceStore::new(),
            GateConfig::production(),
            ["UserShow", "NsqAdmin"],
        );
        assert!(matches!(
            result,
            Err(AuthorizationError::MissingPermissionMapping { ref action }) if action == "NsqAdmin"
        ));
        assert!(AuthorizationGate::bootstrap(
            InMemoryResourceStore::new(),
            GateConfig::production(),
            ["UserShow", "web::WorkItemIndex"],
        )
        .is_ok());
    }
}
