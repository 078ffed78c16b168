//! `registry-query`: compiles untrusted `column__operator=value` filters into
//! parameterized predicates.
//!
//! Layering:
//! - [`filter`] parses one raw key into a [`PredicateDescriptor`] (no allow-listing).
//! - [`allow_list`] holds the per-resource keys a list view accepts.
//! - [`collection`] folds many raw pairs into a [`Query`], enforcing the allow-list.
//! - [`query`] / [`predicate`] render the WHERE clause and its ordered params.
//! - [`executor`] is the seam to whatever runs the compiled query.

pub mod allow_list;
pub mod collection;
pub mod error;
pub mod executor;
pub mod filter;
pub mod pagination;
pub mod predicate;
pub mod query;

pub use allow_list::FilterAllowList;
pub use collection::{FilterCollection, SortSpec, RESERVED_KEYS};
pub use error::{ExecutorError, FilterError};
pub use executor::{QueryExecutor, RecordingExecutor, SelectStatement};
pub use filter::{parse_filter, Operator, PredicateDescriptor, KEY_SEPARATOR};
pub use pagination::{Pager, PagerConfig};
pub use predicate::{CompareOp, Param, Predicate, ValueKind};
pub use query::{OrderBy, Query, SortDirection};
