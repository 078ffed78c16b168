//! Filter collection: many raw query-string pairs folded into one [`Query`].

use serde::Serialize;

use crate::{FilterAllowList, FilterError, PredicateDescriptor, Query, SortDirection, parse_filter};

/// Query-string keys that carry paging and sorting, not filters.
pub const RESERVED_KEYS: [&str; 3] = ["sort", "page", "per_page"];

/// One `sort=column__direction` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    /// Parse `column__direction`. A missing or unrecognized direction means ascending.
    pub fn parse(spec: &str) -> Self {
        let (column, dir) = match spec.split_once(crate::KEY_SEPARATOR) {
            Some((column, dir)) => (column, dir.parse::<SortDirection>().unwrap_or_default()),
            None => (spec, SortDirection::Asc),
        };
        Self {
            column: column.to_string(),
            direction: dir,
        }
    }
}

/// Builder that turns untrusted filter and sort params into a [`Query`].
///
/// Every key is checked against the collection's [`FilterAllowList`] before
/// it is parsed into a predicate.
#[derive(Debug, Clone)]
pub struct FilterCollection {
    allow_list: FilterAllowList,
    filters: Vec<PredicateDescriptor>,
    sorts: Vec<SortSpec>,
}

impl FilterCollection {
    pub fn new(allow_list: FilterAllowList) -> Self {
        Self {
            allow_list,
            filters: Vec::new(),
            sorts: Vec::new(),
        }
    }

    pub fn allow_list(&self) -> &FilterAllowList {
        &self.allow_list
    }

    /// Add one filter. Blank values are dropped first; a filter left with no
    /// values is absent and skipped, not rejected.
    pub fn add(
        &mut self,
        key: &str,
        mut values: Vec<String>,
    ) -> Result<Option<&PredicateDescriptor>, FilterError> {
        values.retain(|v| !v.is_empty());
        let pd = parse_filter(key, values)?;
        let kind = self
            .allow_list
            .kind_of(pd.column(), pd.operator())
            .ok_or_else(|| FilterError::DisallowedFilter {
                key: key.to_string(),
            })?;
        if pd.values().is_empty() {
            return Ok(None);
        }
        pd.validate_values(kind)?;
        self.filters.push(pd);
        Ok(self.filters.last())
    }

    /// Add one `column__direction` sort. The column must be sortable.
    pub fn add_order_by(&mut self, spec: &str) -> Result<(), FilterError> {
        let sort = SortSpec::parse(spec);
        if !self.allow_list.can_sort(&sort.column) {
            return Err(FilterError::DisallowedSort {
                column: sort.column,
            });
        }
        self.sorts.push(sort);
        Ok(())
    }

    pub fn has_explicit_sorting(&self) -> bool {
        !self.sorts.is_empty()
    }

    pub fn filters(&self) -> &[PredicateDescriptor] {
        &self.filters
    }

    pub fn sorts(&self) -> &[SortSpec] {
        &self.sorts
    }

    /// First value of the retained filter added under `key`, or `""`.
    pub fn value_of(&self, key: &str) -> &str {
        self.values_of(key).first().map_or("", String::as_str)
    }

    /// All values of the retained filter added under `key`.
    pub fn values_of(&self, key: &str) -> &[String] {
        self.filters
            .iter()
            .find(|pd| pd.key() == key)
            .map(PredicateDescriptor::values)
            .unwrap_or_default()
    }

    /// Compile every retained filter, then every sort, into a fresh query.
    pub fn to_query(&self) -> Result<Query, FilterError> {
        let mut query = Query::new();
        for pd in &self.filters {
            let kind = self.allow_list.kind_of(pd.column(), pd.operator()).unwrap_or_default();
            pd.add_typed_to_query(&mut query, kind)?;
        }
        for sort in &self.sorts {
            query.order_by(&sort.column, sort.direction);
        }
        Ok(query)
    }

    /// Reject query keys that are neither permitted filters nor reserved
    /// paging/sorting keys. Offending keys are reported in input order.
    pub fn validate_keys<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Result<(), FilterError> {
        let mut invalid: Vec<String> = Vec::new();
        for key in keys {
            if RESERVED_KEYS.contains(&key) || self.allow_list.permits_key(key) {
                continue;
            }
            if !invalid.iter().any(|k| k == key) {
                invalid.push(key.to_string());
            }
        }
        if invalid.is_empty() {
            Ok(())
        } else {
            tracing::debug!(keys = ?invalid, "rejected filter keys");
            Err(FilterError::UnknownParams(invalid))
        }
    }

    /// Build a collection from decoded query-string pairs.
    ///
    /// Repeated keys are grouped (in order of first appearance). `sort` pairs
    /// become sort specs; `page`/`per_page` are left to the pager.
    pub fn from_query_pairs<K, V>(
        allow_list: FilterAllowList,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, FilterError>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
        let mut sorts = Vec::new();
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.into();
            match key {
                "sort" => sorts.push(value),
                "page" | "per_page" => {}
                _ => match grouped.iter_mut().find(|(k, _)| k.as_str() == key) {
                    Some((_, values)) => values.push(value),
                    None => grouped.push((key.to_string(), vec![value])),
                },
            }
        }

        let mut fc = Self::new(allow_list);
        for (key, values) in grouped {
            fc.add(&key, values)?;
        }
        for spec in &sorts {
            fc.add_order_by(spec)?;
        }
        Ok(fc)
    }
}
