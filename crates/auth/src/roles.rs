use core::convert::Infallible;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role identifier used for RBAC.
///
/// The set is closed. Any role name the registry does not recognise (including
/// a deactivated account's blank role) parses to [`Role::None`], which is
/// granted nothing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Cross-institution system administrator.
    SysAdmin,
    InstAdmin,
    InstUser,
    #[default]
    None,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SysAdmin, Role::InstAdmin, Role::InstUser, Role::None];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SysAdmin => "admin",
            Role::InstAdmin => "institutional_admin",
            Role::InstUser => "institutional_user",
            Role::None => "none",
        }
    }

    /// Parse a stored role name; unrecognised names map to `Role::None`.
    pub fn parse(name: &str) -> Role {
        match name {
            "admin" => Role::SysAdmin,
            "institutional_admin" => Role::InstAdmin,
            "institutional_user" => Role::InstUser,
            _ => Role::None,
        }
    }

    /// Whether grants for this role apply across institution boundaries.
    pub fn is_elevated(self) -> bool {
        self == Role::SysAdmin
    }
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Role::parse(s))
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::parse(&value)
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
