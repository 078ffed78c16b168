//! Per-resource filter and sort allow-lists.
//!
//! A list view only ever compiles keys found here. Keys are stored in their
//! normalized `(column, operator)` form, so `identifier` and `identifier__eq`
//! are the same entry.

use std::collections::{HashMap, HashSet};

use registry_core::ResourceType;

use crate::filter::{split_key, Operator};
use crate::{FilterError, ValueKind, parse_filter};

const ALERT_FILTERS: &[&str] = &[
    "created_at__gteq",
    "created_at__lteq",
    "institution_id",
    "type",
    "user_id",
];

const CHECKSUM_FILTERS: &[&str] = &[
    "algorithm",
    "date_time__gteq",
    "date_time__lteq",
    "digest",
    "generic_file_id",
    "generic_file_identifier",
    "institution_id",
    "intellectual_object_id",
    "state",
];

const DELETION_REQUEST_FILTERS: &[&str] = &[
    "institution_id",
    "requested_at__gteq",
    "requested_at__lteq",
    "stage",
    "status",
];

const GENERIC_FILE_FILTERS: &[&str] = &[
    "created_at__gteq",
    "created_at__lteq",
    "identifier",
    "institution_id",
    "intellectual_object_id",
    "last_fixity_check__gteq",
    "last_fixity_check__lteq",
    "size__gteq",
    "size__lteq",
    "state",
    "storage_option",
    "updated_at__gteq",
    "updated_at__lteq",
    "uuid",
];

const INSTITUTION_FILTERS: &[&str] = &["name__contains", "type"];

const INTELLECTUAL_OBJECT_FILTERS: &[&str] = &[
    "access",
    "alt_identifier",
    "bag_group_identifier",
    "bag_name",
    "bagit_profile_identifier",
    "created_at__gteq",
    "created_at__lteq",
    "etag",
    "file_count__gteq",
    "file_count__lteq",
    "identifier",
    "institution_id",
    "institution_parent_id",
    "internal_sender_description",
    "internal_sender_identifier",
    "size__gteq",
    "size__lteq",
    "source_organization",
    "state",
    "storage_option",
    "updated_at__gteq",
    "updated_at__lteq",
];

const PREMIS_EVENT_FILTERS: &[&str] = &[
    "date_time__gteq",
    "date_time__lteq",
    "event_type",
    "generic_file_id",
    "generic_file_id__is_null",
    "generic_file_identifier",
    "identifier",
    "institution_id",
    "intellectual_object_id",
    "intellectual_object_identifier",
    "outcome",
];

const STORAGE_RECORD_FILTERS: &[&str] = &["generic_file_id"];

const USER_FILTERS: &[&str] = &[
    "deactivated_at__is_null",
    "deactivated_at__not_null",
    "email__contains",
    "institution_id",
    "name__contains",
    "role",
];

const WORK_ITEM_FILTERS: &[&str] = &[
    "action__in",
    "alt_identifier",
    "bag_date__gteq",
    "bag_date__lteq",
    "bag_group_identifier",
    "bagit_profile_identifier",
    "bucket",
    "date_processed__gteq",
    "date_processed__lteq",
    "etag",
    "generic_file_identifier",
    "institution_id",
    "name",
    "needs_admin_review",
    "node__not_null",
    "object_identifier",
    "size__gteq",
    "size__lteq",
    "stage__in",
    "status__in",
    "storage_option",
    "user",
];

/// Storage type of a built-in filter column, by naming convention.
fn column_kind(column: &str) -> ValueKind {
    match column {
        "id" | "size" | "file_count" => ValueKind::Integer,
        "needs_admin_review" => ValueKind::Boolean,
        "date_time" | "bag_date" | "date_processed" | "last_fixity_check" => ValueKind::Timestamp,
        c if c.ends_with("_id") => ValueKind::Integer,
        c if c.ends_with("_at") => ValueKind::Timestamp,
        _ => ValueKind::Text,
    }
}

const COMMON_SORTS: &[&str] = &["id", "created_at", "updated_at"];

fn sorts_for(resource: ResourceType) -> &'static [&'static str] {
    match resource {
        ResourceType::Alert => &["type", "user_id"],
        ResourceType::Checksum => &["algorithm", "date_time", "generic_file_id"],
        ResourceType::DeletionRequest => &["requested_at", "stage", "status"],
        ResourceType::GenericFile => &["identifier", "size", "state", "last_fixity_check"],
        ResourceType::Institution => &["name", "identifier", "type"],
        ResourceType::IntellectualObject => &["identifier", "bag_name", "size", "file_count", "state"],
        ResourceType::PremisEvent => &["date_time", "event_type", "identifier", "outcome"],
        ResourceType::StorageRecord => &["generic_file_id"],
        ResourceType::User => &["name", "email", "role"],
        ResourceType::WorkItem => &[
            "name",
            "date_processed",
            "bag_date",
            "action",
            "stage",
            "status",
            "size",
        ],
        ResourceType::Dashboard | ResourceType::DepositStats | ResourceType::Report => &[],
    }
}

fn filters_for(resource: ResourceType) -> &'static [&'static str] {
    match resource {
        ResourceType::Alert => ALERT_FILTERS,
        ResourceType::Checksum => CHECKSUM_FILTERS,
        ResourceType::DeletionRequest => DELETION_REQUEST_FILTERS,
        ResourceType::GenericFile => GENERIC_FILE_FILTERS,
        ResourceType::Institution => INSTITUTION_FILTERS,
        ResourceType::IntellectualObject => INTELLECTUAL_OBJECT_FILTERS,
        ResourceType::PremisEvent => PREMIS_EVENT_FILTERS,
        ResourceType::StorageRecord => STORAGE_RECORD_FILTERS,
        ResourceType::User => USER_FILTERS,
        ResourceType::WorkItem => WORK_ITEM_FILTERS,
        ResourceType::Dashboard | ResourceType::DepositStats | ResourceType::Report => &[],
    }
}

/// The closed set of filter keys and sort columns one list view accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterAllowList {
    filters: HashMap<(String, Operator), ValueKind>,
    sortable: HashSet<String>,
}

impl FilterAllowList {
    /// An allow-list that accepts nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in allow-list for a resource's list view.
    pub fn for_resource(resource: ResourceType) -> Self {
        let filters = filters_for(resource)
            .iter()
            .filter_map(|key| normalize(key))
            .map(|(column, op)| {
                let kind = column_kind(&column);
                ((column, op), kind)
            })
            .collect();
        let sortable = COMMON_SORTS
            .iter()
            .chain(sorts_for(resource))
            .map(|c| c.to_string())
            .collect();
        Self { filters, sortable }
    }

    /// Build an allow-list from raw `column__operator` keys. Values bind as text
    /// unless [`with_kind`](Self::with_kind) says otherwise.
    pub fn from_keys(keys: &[&str]) -> Result<Self, FilterError> {
        let mut filters = HashMap::with_capacity(keys.len());
        for key in keys {
            let pd = parse_filter(key, Vec::new())?;
            filters.insert((pd.column().to_string(), pd.operator()), ValueKind::Text);
        }
        Ok(Self {
            filters,
            sortable: HashSet::new(),
        })
    }

    pub fn with_sortable<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.sortable.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Set the value kind of every entry filtering on `column`.
    pub fn with_kind(mut self, column: &str, kind: ValueKind) -> Self {
        for ((c, _), k) in self.filters.iter_mut() {
            if c == column {
                *k = kind;
            }
        }
        self
    }

    pub fn permits(&self, column: &str, operator: Operator) -> bool {
        self.kind_of(column, operator).is_some()
    }

    /// The value kind of a permitted filter, `None` if it is not permitted.
    pub fn kind_of(&self, column: &str, operator: Operator) -> Option<ValueKind> {
        self.filters.get(&(column.to_string(), operator)).copied()
    }

    /// Whether a raw query-string key names a permitted filter.
    pub fn permits_key(&self, key: &str) -> bool {
        normalize(key).is_some_and(|entry| self.filters.contains_key(&entry))
    }

    pub fn can_sort(&self, column: &str) -> bool {
        self.sortable.contains(column)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }
}

fn normalize(key: &str) -> Option<(String, Operator)> {
    let (column, raw_op) = split_key(key);
    if column.is_empty() {
        return None;
    }
    Operator::parse(raw_op).map(|op| (column.to_string(), op))
}
