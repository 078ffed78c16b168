//! Filter parser: one raw query-string key into a typed descriptor.
//!
//! Keys look like `column__operator`; a key with no separator means `eq`.
//! The operator set is closed. The column is taken verbatim, so callers must
//! check it against an allow-list (see [`FilterCollection`](crate::FilterCollection)).

use serde::Serialize;

use crate::predicate::{CompareOp, ValueKind};
use crate::{FilterError, Param, Query};

pub const KEY_SEPARATOR: &str = "__";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gteq,
    Lt,
    Lteq,
    StartsWith,
    Contains,
    In,
    NotIn,
    IsNull,
    NotNull,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Gteq,
        Operator::Lt,
        Operator::Lteq,
        Operator::StartsWith,
        Operator::Contains,
        Operator::In,
        Operator::NotIn,
        Operator::IsNull,
        Operator::NotNull,
    ];

    pub fn parse(raw: &str) -> Option<Operator> {
        Operator::ALL.into_iter().find(|op| op.as_str() == raw)
    }

    /// The operator as it appears in a query-string key.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Gteq => "gteq",
            Operator::Lt => "lt",
            Operator::Lteq => "lteq",
            Operator::StartsWith => "starts_with",
            Operator::Contains => "contains",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::IsNull => "is_null",
            Operator::NotNull => "not_null",
        }
    }

    /// The operator as it appears in rendered SQL.
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Gteq => ">=",
            Operator::Lt => "<",
            Operator::Lteq => "<=",
            Operator::StartsWith | Operator::Contains => "ILIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::NotNull => "IS NOT NULL",
        }
    }

    /// Whether the operator ignores the submitted values.
    pub fn is_unary(self) -> bool {
        matches!(self, Operator::IsNull | Operator::NotNull)
    }

    fn compare_op(self) -> Option<CompareOp> {
        match self {
            Operator::Eq => Some(CompareOp::Eq),
            Operator::Ne => Some(CompareOp::Ne),
            Operator::Gt => Some(CompareOp::Gt),
            Operator::Gteq => Some(CompareOp::Gteq),
            Operator::Lt => Some(CompareOp::Lt),
            Operator::Lteq => Some(CompareOp::Lteq),
            Operator::StartsWith | Operator::Contains => Some(CompareOp::ILike),
            Operator::In | Operator::NotIn | Operator::IsNull | Operator::NotNull => None,
        }
    }
}

impl core::fmt::Display for Operator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Split a raw key into `(column, operator)` without validating the operator.
pub(crate) fn split_key(key: &str) -> (&str, &str) {
    key.split_once(KEY_SEPARATOR)
        .unwrap_or((key, Operator::Eq.as_str()))
}

/// One parsed `column__operator=values` pair. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateDescriptor {
    key: String,
    column: String,
    operator: Operator,
    values: Vec<String>,
}

/// Parse one raw query parameter.
pub fn parse_filter(key: &str, values: Vec<String>) -> Result<PredicateDescriptor, FilterError> {
    let (column, raw_op) = split_key(key);
    if column.is_empty() {
        return Err(FilterError::MalformedKey {
            key: key.to_string(),
        });
    }
    let operator = Operator::parse(raw_op).ok_or_else(|| FilterError::UnknownOperator {
        key: key.to_string(),
        operator: raw_op.to_string(),
    })?;

    Ok(PredicateDescriptor {
        key: key.to_string(),
        column: column.to_string(),
        operator,
        values,
    })
}

impl PredicateDescriptor {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn raw_operator(&self) -> &'static str {
        self.operator.as_str()
    }

    pub fn rendered_operator(&self) -> &'static str {
        self.operator.as_sql()
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Fold this filter into `query`, binding every value as text.
    pub fn add_to_query(&self, query: &mut Query) -> Result<(), FilterError> {
        self.add_typed_to_query(query, ValueKind::Text)
    }

    /// Fold this filter into `query`, converting values to `kind` first.
    ///
    /// `starts_with` / `contains` always bind text patterns.
    pub fn add_typed_to_query(&self, query: &mut Query, kind: ValueKind) -> Result<(), FilterError> {
        match self.operator {
            Operator::IsNull => {
                query.is_null(&self.column);
            }
            Operator::NotNull => {
                query.is_not_null(&self.column);
            }
            Operator::In => {
                query.where_in(&self.column, self.params(kind)?);
            }
            Operator::NotIn => {
                query.where_not_in(&self.column, self.params(kind)?);
            }
            Operator::StartsWith => {
                let pattern = format!("{}%", escape_like(self.first_value()?));
                query.and_where(&self.column, CompareOp::ILike, pattern);
            }
            Operator::Contains => {
                let pattern = format!("%{}%", escape_like(self.first_value()?));
                query.and_where(&self.column, CompareOp::ILike, pattern);
            }
            op => {
                let value = self.convert(kind, self.first_value()?)?;
                if let Some(cmp) = op.compare_op() {
                    query.and_where(&self.column, cmp, value);
                }
            }
        }
        Ok(())
    }

    /// Check that every value converts to `kind`, without touching a query.
    pub fn validate_values(&self, kind: ValueKind) -> Result<(), FilterError> {
        match self.operator {
            Operator::IsNull | Operator::NotNull | Operator::StartsWith | Operator::Contains => Ok(()),
            _ => self.params(kind).map(|_| ()),
        }
    }

    fn first_value(&self) -> Result<&str, FilterError> {
        self.values
            .first()
            .map(String::as_str)
            .ok_or_else(|| FilterError::MissingValue {
                key: self.key.clone(),
            })
    }

    fn convert(&self, kind: ValueKind, raw: &str) -> Result<Param, FilterError> {
        kind.convert(raw).ok_or_else(|| FilterError::InvalidValue {
            key: self.key.clone(),
            value: raw.to_string(),
        })
    }

    fn params(&self, kind: ValueKind) -> Result<Vec<Param>, FilterError> {
        if self.values.is_empty() {
            return Err(FilterError::MissingValue {
                key: self.key.clone(),
            });
        }
        self.values.iter().map(|v| self.convert(kind, v)).collect()
    }
}

/// Escape LIKE wildcards so user text matches literally.
fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
