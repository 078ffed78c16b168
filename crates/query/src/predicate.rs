//! Typed predicate AST and its `?`-placeholder renderer.
//!
//! Column names are rendered verbatim and must come from an allow-list.
//! Values never reach the SQL text; each one becomes a `?` and is pushed onto
//! the parameter list in the same walk, so placeholder order and parameter
//! order cannot drift apart.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use registry_core::{InstitutionId, UserId};

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Param {
    Int(i64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Text(value)
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Int(value)
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Bool(value)
    }
}

impl From<DateTime<Utc>> for Param {
    fn from(value: DateTime<Utc>) -> Self {
        Param::Timestamp(value)
    }
}

impl From<InstitutionId> for Param {
    fn from(value: InstitutionId) -> Self {
        Param::Int(value.get())
    }
}

impl From<UserId> for Param {
    fn from(value: UserId) -> Self {
        Param::Int(value.get())
    }
}

/// The storage type of a filterable column, used to bind client strings as
/// typed parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    #[default]
    Text,
    Integer,
    Boolean,
    Timestamp,
}

impl ValueKind {
    /// Convert one raw query-string value. `None` if it does not parse.
    ///
    /// Timestamps accept RFC 3339 or a bare `YYYY-MM-DD` date (midnight UTC).
    pub fn convert(self, raw: &str) -> Option<Param> {
        if self == ValueKind::Text {
            return Some(Param::Text(raw.to_string()));
        }
        let raw = raw.trim();
        match self {
            ValueKind::Text => Some(Param::Text(raw.to_string())),
            ValueKind::Integer => raw.parse::<i64>().ok().map(Param::Int),
            ValueKind::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Some(Param::Bool(true)),
                "false" | "f" | "0" => Some(Param::Bool(false)),
                _ => None,
            },
            ValueKind::Timestamp => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                })
                .map(Param::Timestamp),
        }
    }
}

/// Binary comparison operators a predicate may render.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gteq,
    Lt,
    Lteq,
    ILike,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gteq => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lteq => "<=",
            CompareOp::ILike => "ILIKE",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    fn joiner(self) -> &'static str {
        match self {
            BoolOp::And => " AND ",
            BoolOp::Or => " OR ",
        }
    }
}

/// One `column op value` term inside a composite group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Term {
    pub column: String,
    pub op: CompareOp,
    pub value: Param,
}

/// One top-level condition of a query. Top-level conditions are ANDed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Predicate {
    Compare(Term),
    IsNull { column: String },
    IsNotNull { column: String },
    Group { op: BoolOp, terms: Vec<Term> },
    Between {
        column: String,
        low: Param,
        high: Param,
        inclusive: bool,
    },
    In {
        column: String,
        values: Vec<Param>,
        negated: bool,
    },
}

impl Predicate {
    /// Append this predicate's SQL to `sql` and its values to `params`.
    pub fn render(&self, sql: &mut String, params: &mut Vec<Param>) {
        match self {
            Predicate::Compare(term) => {
                sql.push('(');
                render_term(term, sql, params);
                sql.push(')');
            }
            Predicate::IsNull { column } => {
                sql.push_str(&format!("({column} IS NULL)"));
            }
            Predicate::IsNotNull { column } => {
                sql.push_str(&format!("({column} IS NOT NULL)"));
            }
            Predicate::Group { op, terms } => {
                sql.push('(');
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(op.joiner());
                    }
                    render_term(term, sql, params);
                }
                sql.push(')');
            }
            Predicate::Between {
                column,
                low,
                high,
                inclusive,
            } => {
                let (lo, hi) = if *inclusive { (">=", "<=") } else { (">", "<") };
                sql.push_str(&format!("({column} {lo} ? AND {column} {hi} ?)"));
                params.push(low.clone());
                params.push(high.clone());
            }
            Predicate::In {
                column,
                values,
                negated,
            } => {
                let op = if *negated { "NOT IN" } else { "IN" };
                let placeholders = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!("({column} {op} ({placeholders}))"));
                params.extend(values.iter().cloned());
            }
        }
    }
}

fn render_term(term: &Term, sql: &mut String, params: &mut Vec<Param>) {
    sql.push_str(&format!("{} {} ?", term.column, term.op.as_sql()));
    params.push(term.value.clone());
}
