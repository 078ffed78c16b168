//! Resource types known to the registry and how each one is owned.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Closed set of resource types that routes can address.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceType {
    Alert,
    Checksum,
    Dashboard,
    DeletionRequest,
    DepositStats,
    GenericFile,
    Institution,
    IntellectualObject,
    PremisEvent,
    Report,
    StorageRecord,
    User,
    WorkItem,
}

/// Where the governing institution id of a resource row lives.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Ownership {
    /// The row is the institution itself.
    Institution,
    /// The row carries an `institution_id` column.
    Direct,
    /// The row has no institution column; its parent generic file governs it.
    ViaGenericFile,
    /// Not backed by a row (dashboards, reports). Only collection routes apply.
    Unowned,
}

impl ResourceType {
    pub const ALL: [ResourceType; 13] = [
        ResourceType::Alert,
        ResourceType::Checksum,
        ResourceType::Dashboard,
        ResourceType::DeletionRequest,
        ResourceType::DepositStats,
        ResourceType::GenericFile,
        ResourceType::Institution,
        ResourceType::IntellectualObject,
        ResourceType::PremisEvent,
        ResourceType::Report,
        ResourceType::StorageRecord,
        ResourceType::User,
        ResourceType::WorkItem,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Alert => "Alert",
            ResourceType::Checksum => "Checksum",
            ResourceType::Dashboard => "Dashboard",
            ResourceType::DeletionRequest => "DeletionRequest",
            ResourceType::DepositStats => "DepositStats",
            ResourceType::GenericFile => "GenericFile",
            ResourceType::Institution => "Institution",
            ResourceType::IntellectualObject => "IntellectualObject",
            ResourceType::PremisEvent => "PremisEvent",
            ResourceType::Report => "Report",
            ResourceType::StorageRecord => "StorageRecord",
            ResourceType::User => "User",
            ResourceType::WorkItem => "WorkItem",
        }
    }

    pub fn ownership(self) -> Ownership {
        match self {
            ResourceType::Institution => Ownership::Institution,
            ResourceType::Checksum | ResourceType::StorageRecord => Ownership::ViaGenericFile,
            ResourceType::Dashboard | ResourceType::DepositStats | ResourceType::Report => {
                Ownership::Unowned
            }
            ResourceType::Alert
            | ResourceType::DeletionRequest
            | ResourceType::GenericFile
            | ResourceType::IntellectualObject
            | ResourceType::PremisEvent
            | ResourceType::User
            | ResourceType::WorkItem => Ownership::Direct,
        }
    }
}

impl core::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::UnknownResourceType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for t in ResourceType::ALL {
            assert_eq!(t.as_str().parse::<ResourceType>().unwrap(), t);
        }
        assert!("Nope".parse::<ResourceType>().is_err());
    }

    #[test]
    fn checksums_and_storage_records_are_owned_through_their_file() {
        assert_eq!(ResourceType::Checksum.ownership(), Ownership::ViaGenericFile);
        assert_eq!(ResourceType::StorageRecord.ownership(), Ownership::ViaGenericFile);
        assert_eq!(ResourceType::GenericFile.ownership(), Ownership::Direct);
    }
}
