//! Strongly-typed identifiers used across the registry.
//!
//! Rows are keyed by 64-bit integers in storage, so ids are integer newtypes
//! rather than UUIDs. Zero is a legal value; it is what an unset id parses to
//! in the legacy routes and must never match a real institution.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Identifier of an institution (the tenant boundary).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstitutionId(i64);

/// Identifier of a user (actor identity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

/// Identifier of an arbitrary resource row (file, object, checksum, ...).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| CoreError::invalid_id(format!("{}: '{}': {}", $name, s, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(InstitutionId, "InstitutionId");
impl_int_newtype!(UserId, "UserId");
impl_int_newtype!(ResourceId, "ResourceId");

impl ResourceId {
    /// Reinterpret this id as an institution id (institution routes carry
    /// the tenant id in their `id` segment).
    pub const fn as_institution(self) -> InstitutionId {
        InstitutionId(self.0)
    }

    /// Reinterpret this id as a user id (self-account checks).
    pub const fn as_user(self) -> UserId {
        UserId(self.0)
    }
}
