//! Page/per-page handling for list views.

use serde::Serialize;

use crate::FilterError;

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagerConfig {
    pub default_per_page: u64,
    pub max_per_page: u64,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            default_per_page: DEFAULT_PER_PAGE,
            max_per_page: MAX_PER_PAGE,
        }
    }
}

impl PagerConfig {
    /// Read `REGISTRY_DEFAULT_PER_PAGE` / `REGISTRY_MAX_PER_PAGE`, falling back
    /// to the defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let read = |name: &str, fallback: u64| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(fallback)
        };
        let max_per_page = read("REGISTRY_MAX_PER_PAGE", MAX_PER_PAGE);
        let default_per_page = read("REGISTRY_DEFAULT_PER_PAGE", DEFAULT_PER_PAGE).min(max_per_page);
        Self {
            default_per_page,
            max_per_page,
        }
    }
}

/// Paging state for one list request, plus the links a UI needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pager {
    pub page: u64,
    pub per_page: u64,
    pub query_offset: u64,
    pub item_first: u64,
    pub item_last: u64,
    pub total_items: u64,
    pub items_in_result_set: u64,
    pub previous_link: Option<String>,
    pub next_link: Option<String>,
    #[serde(skip)]
    path: String,
    #[serde(skip)]
    other_params: Vec<(String, String)>,
}

impl Pager {
    /// Read `page` and `per_page` from decoded query pairs. Both default when
    /// absent or blank; `per_page` is capped at `config.max_per_page`. A page
    /// whose offset would not fit a signed 64-bit offset is rejected.
    pub fn new<K, V>(
        path: &str,
        query_pairs: impl IntoIterator<Item = (K, V)>,
        config: PagerConfig,
    ) -> Result<Self, FilterError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut page = 1;
        let mut raw_page = String::new();
        let mut per_page = config.default_per_page;
        let mut other_params = Vec::new();
        for (key, value) in query_pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "page" | "per_page" if value.trim().is_empty() => {}
                "page" => {
                    page = positive(value)?;
                    raw_page = value.to_string();
                }
                "per_page" => per_page = positive(value)?.min(config.max_per_page),
                _ => other_params.push((key.to_string(), value.to_string())),
            }
        }
        let query_offset = (page - 1)
            .checked_mul(per_page)
            .filter(|offset| *offset <= i64::MAX as u64)
            .ok_or(FilterError::InvalidPage(raw_page))?;
        Ok(Self {
            page,
            per_page,
            query_offset,
            item_first: query_offset.saturating_add(1),
            item_last: 0,
            total_items: 0,
            items_in_result_set: 0,
            previous_link: None,
            next_link: None,
            path: path.to_string(),
            other_params,
        })
    }

    /// Record the result counts and compute the last item and the links.
    pub fn set_counts(&mut self, total_items: u64, items_in_result_set: u64) {
        self.total_items = total_items;
        self.items_in_result_set = items_in_result_set;
        if items_in_result_set == 0 {
            self.item_first = 0;
        }
        self.item_last = self.query_offset.saturating_add(items_in_result_set);
        self.previous_link = (self.page > 1).then(|| self.link(self.page - 1));
        self.next_link = (self.item_last < total_items).then(|| self.link(self.page.saturating_add(1)));
    }

    fn link(&self, page: u64) -> String {
        let mut link = format!("{}?page={page}&per_page={}", self.path, self.per_page);
        for (key, value) in &self.other_params {
            link.push('&');
            link.push_str(&urlencoding::encode(key));
            link.push('=');
            link.push_str(&urlencoding::encode(value));
        }
        link
    }
}

fn positive(value: &str) -> Result<u64, FilterError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| FilterError::InvalidPage(value.to_string()))
}
