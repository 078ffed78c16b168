//! `registry-authz`: inspect the permission table and action map.
//!
//! ```text
//! registry-authz routes
//! registry-authz grants <role>
//! registry-authz explain <role> <permission> <actor_institution_id> <owner_institution_id>
//! ```

use anyhow::{Context, bail};
use serde_json::json;

use registry_api::ActionMap;
use registry_auth::{AuthorizationSubject, Permission, PermissionTable, Role};
use registry_core::{InstitutionId, UserId};

fn main() -> anyhow::Result<()> {
    registry_observability::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let table = PermissionTable::new();

    let output = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["routes"] => {
            let mut routes: Vec<_> = ActionMap::standard()
                .iter()
                .map(|(name, meta)| json!({ "handler": name, "action": meta }))
                .collect();
            routes.sort_by(|a, b| a["handler"].as_str().cmp(&b["handler"].as_str()));
            json!(routes)
        }
        ["grants", role] => {
            let role = Role::parse(role);
            json!({ "role": role, "permissions": table.granted(role) })
        }
        ["explain", role, permission, actor, owner] => {
            let permission: Permission = permission.parse()?;
            let actor: InstitutionId = actor.parse().context("actor_institution_id")?;
            let owner: InstitutionId = owner.parse().context("owner_institution_id")?;
            let subject = AuthorizationSubject::new(UserId::new(0), Role::parse(role), actor);
            serde_json::to_value(table.explain(&subject, permission, owner))?
        }
        _ => bail!(
            "usage: registry-authz routes | grants <role> | explain <role> <permission> <actor_institution_id> <owner_institution_id>"
        ),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
