//! Query compiler: an accumulator of predicates, ordering and paging.
//!
//! Conditions are kept as a predicate AST and rendered on demand, so the
//! WHERE clause and its parameter list always come out of the same walk.

use core::str::FromStr;

use serde::Serialize;

use crate::predicate::{BoolOp, CompareOp, Predicate, Term};
use crate::{ExecutorError, FilterError, Param, QueryExecutor, SelectStatement};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" | "ASC" => Ok(SortDirection::Asc),
            "desc" | "DESC" => Ok(SortDirection::Desc),
            other => Err(FilterError::InvalidDirection(other.to_string())),
        }
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl core::fmt::Display for OrderBy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.column, self.direction.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    conditions: Vec<Predicate>,
    columns: Vec<String>,
    relations: Vec<String>,
    order_by: Vec<OrderBy>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(column op ?)`
    pub fn and_where(
        &mut self,
        column: &str,
        op: CompareOp,
        value: impl Into<Param>,
    ) -> &mut Self {
        self.conditions.push(Predicate::Compare(Term {
            column: column.to_string(),
            op,
            value: value.into(),
        }));
        self
    }

    pub fn is_null(&mut self, column: &str) -> &mut Self {
        self.conditions.push(Predicate::IsNull {
            column: column.to_string(),
        });
        self
    }

    pub fn is_not_null(&mut self, column: &str) -> &mut Self {
        self.conditions.push(Predicate::IsNotNull {
            column: column.to_string(),
        });
        self
    }

    /// One grouped fragment of `columns[i] ops[i] ?` terms joined by OR.
    ///
    /// Does nothing when the three slices are empty or differ in length.
    pub fn or<V: Into<Param> + Clone>(
        &mut self,
        columns: &[&str],
        ops: &[CompareOp],
        values: &[V],
    ) -> &mut Self {
        self.group(BoolOp::Or, columns, ops, values)
    }

    /// Like [`or`](Self::or), joined by AND.
    pub fn and<V: Into<Param> + Clone>(
        &mut self,
        columns: &[&str],
        ops: &[CompareOp],
        values: &[V],
    ) -> &mut Self {
        self.group(BoolOp::And, columns, ops, values)
    }

    fn group<V: Into<Param> + Clone>(
        &mut self,
        op: BoolOp,
        columns: &[&str],
        ops: &[CompareOp],
        values: &[V],
    ) -> &mut Self {
        if values.is_empty() || columns.len() != values.len() || ops.len() != values.len() {
            return self;
        }
        let terms = columns
            .iter()
            .zip(ops)
            .zip(values)
            .map(|((column, op), value)| Term {
                column: column.to_string(),
                op: *op,
                value: value.clone().into(),
            })
            .collect();
        self.conditions.push(Predicate::Group { op, terms });
        self
    }

    /// `(column >= ? AND column <= ?)`
    pub fn between_inclusive(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.between(column, low.into(), high.into(), true)
    }

    /// `(column > ? AND column < ?)`
    pub fn between_exclusive(
        &mut self,
        column: &str,
        low: impl Into<Param>,
        high: impl Into<Param>,
    ) -> &mut Self {
        self.between(column, low.into(), high.into(), false)
    }

    fn between(&mut self, column: &str, low: Param, high: Param, inclusive: bool) -> &mut Self {
        self.conditions.push(Predicate::Between {
            column: column.to_string(),
            low,
            high,
            inclusive,
        });
        self
    }

    /// `(column IN (?, ...))`; does nothing for an empty value list.
    pub fn where_in<V: Into<Param>>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.in_list(column, values, false)
    }

    /// `(column NOT IN (?, ...))`; does nothing for an empty value list.
    pub fn where_not_in<V: Into<Param>>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> &mut Self {
        self.in_list(column, values, true)
    }

    fn in_list<V: Into<Param>>(
        &mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
        negated: bool,
    ) -> &mut Self {
        let values: Vec<Param> = values.into_iter().map(Into::into).collect();
        if !values.is_empty() {
            self.conditions.push(Predicate::In {
                column: column.to_string(),
                values,
                negated,
            });
        }
        self
    }

    pub fn order_by(&mut self, column: &str, direction: SortDirection) -> &mut Self {
        self.order_by.push(OrderBy {
            column: column.to_string(),
            direction,
        });
        self
    }

    /// Append an ORDER BY entry written as `"column"` or `"column direction"`.
    ///
    /// Anything other than `asc`/`desc` after the column is rejected.
    pub fn order_by_spec(&mut self, spec: &str) -> Result<&mut Self, FilterError> {
        let mut parts = spec.split_whitespace();
        let column = parts
            .next()
            .ok_or_else(|| FilterError::InvalidDirection(spec.to_string()))?;
        let direction = match parts.next() {
            Some(dir) => dir.parse()?,
            None => SortDirection::Asc,
        };
        if parts.next().is_some() {
            return Err(FilterError::InvalidDirection(spec.to_string()));
        }
        Ok(self.order_by(column, direction))
    }

    pub fn columns<S: Into<String>>(&mut self, columns: impl IntoIterator<Item = S>) -> &mut Self {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn relations<S: Into<String>>(
        &mut self,
        relations: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.relations = relations.into_iter().map(Into::into).collect();
        self
    }

    /// Set the row limit. Zero or a negative value (the `-1` sentinel) clears it.
    pub fn limit(&mut self, limit: i64) -> &mut Self {
        self.limit = u64::try_from(limit).ok().filter(|l| *l > 0);
        self
    }

    /// Set the row offset. A negative value (the `-1` sentinel) clears it.
    pub fn offset(&mut self, offset: i64) -> &mut Self {
        self.offset = u64::try_from(offset).ok();
        self
    }

    pub fn get_limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn get_offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn get_order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn get_columns(&self) -> &[String] {
        &self.columns
    }

    pub fn get_relations(&self) -> &[String] {
        &self.relations
    }

    pub fn conditions(&self) -> &[Predicate] {
        &self.conditions
    }

    /// Render `(WHERE clause, params)`. The clause is empty when there are no conditions.
    pub fn render(&self) -> (String, Vec<Param>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        for (i, cond) in self.conditions.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            cond.render(&mut sql, &mut params);
        }
        (sql, params)
    }

    pub fn where_clause(&self) -> String {
        self.render().0
    }

    pub fn params(&self) -> Vec<Param> {
        self.render().1
    }

    /// Build the statement handed to an executor for `source` (a table or view
    /// name chosen by code, never by the client).
    pub fn statement(&self, source: &str) -> SelectStatement {
        let (where_clause, params) = self.render();
        SelectStatement {
            source: source.to_string(),
            where_clause,
            params,
            columns: self.columns.clone(),
            relations: self.relations.clone(),
            order_by: self.order_by.iter().map(ToString::to_string).collect(),
            limit: self.limit,
            offset: self.offset,
        }
    }

    pub async fn select<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        source: &str,
    ) -> Result<Vec<E::Row>, ExecutorError> {
        executor.select(&self.statement(source)).await
    }

    /// Select the first matching row, or [`ExecutorError::NotFound`].
    pub async fn select_one<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        source: &str,
    ) -> Result<E::Row, ExecutorError> {
        let mut single = self.clone();
        single.limit(1);
        executor
            .select(&single.statement(source))
            .await?
            .into_iter()
            .next()
            .ok_or(ExecutorError::NotFound)
    }

    /// Count matching rows, ignoring ordering and paging.
    pub async fn count<E: QueryExecutor + ?Sized>(
        &self,
        executor: &E,
        source: &str,
    ) -> Result<u64, ExecutorError> {
        let (where_clause, params) = self.render();
        let stmt = SelectStatement {
            source: source.to_string(),
            where_clause,
            params,
            columns: Vec::new(),
            relations: self.relations.clone(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        };
        executor.count(&stmt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_query_renders_empty_clause() {
        let q = Query::new();
        assert_eq!(q.where_clause(), "");
        assert!(q.params().is_empty());
    }

    #[test]
    fn fragments_are_anded_in_call_order() {
        let mut q = Query::new();
        q.and_where("institution_id", CompareOp::Eq, 2i64)
            .between_inclusive("size", 10i64, 20i64)
            .where_in("state", ["A", "D"])
            .or(&["name", "identifier"], &[CompareOp::Eq, CompareOp::Eq], &["x", "y"]);
        assert_eq!(
            q.where_clause(),
            "(institution_id = ?) AND (size >= ? AND size <= ?) AND (state IN (?, ?)) AND (name = ? OR identifier = ?)"
        );
        assert_eq!(
            q.params(),
            vec![
                Param::Int(2),
                Param::Int(10),
                Param::Int(20),
                Param::from("A"),
                Param::from("D"),
                Param::from("x"),
                Param::from("y"),
            ]
        );
    }

    #[test]
    fn mismatched_or_empty_groups_are_ignored() {
        let mut q = Query::new();
        q.or(&["a", "b"], &[CompareOp::Eq], &["1", "2"])
            .and::<&str>(&[], &[], &[])
            .where_in::<&str>("state", [])
            .where_not_in::<&str>("state", []);
        assert_eq!(q.where_clause(), "");
    }

    #[test]
    fn between_exclusive_uses_strict_bounds() {
        let mut q = Query::new();
        q.between_exclusive("size", 1i64, 9i64);
        assert_eq!(q.where_clause(), "(size > ? AND size < ?)");
    }

    #[test]
    fn sentinel_limits_are_not_emitted() {
        let mut q = Query::new();
        q.limit(-1).offset(-1);
        assert_eq!(q.get_limit(), None);
        assert_eq!(q.get_offset(), None);
        q.limit(25).offset(0);
        assert_eq!(q.get_limit(), Some(25));
        assert_eq!(q.get_offset(), Some(0));
        q.limit(0);
        assert_eq!(q.get_limit(), None);
    }

    #[test]
    fn order_by_spec_rejects_unknown_directions() {
        let mut q = Query::new();
        q.order_by_spec("updated_at desc").unwrap();
        q.order_by_spec("name").unwrap();
        assert!(q.order_by_spec("name; DROP TABLE users").is_err());
        assert!(q.order_by_spec("name sideways").is_err());
        let rendered: Vec<String> = q.get_order_by().iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["updated_at desc", "name asc"]);
    }

    #[derive(Debug, Clone)]
    enum Call {
        Where(i64),
        Null,
        NotNull,
        Or(usize),
        And(usize),
        Between,
        BetweenExclusive,
        In(usize),
        NotIn(usize),
    }

    fn call() -> impl Strategy<Value = Call> {
        prop_oneof![
            any::<i64>().prop_map(Call::Where),
            Just(Call::Null),
            Just(Call::NotNull),
            (0usize..4).prop_map(Call::Or),
            (0usize..4).prop_map(Call::And),
            Just(Call::Between),
            Just(Call::BetweenExclusive),
            (0usize..5).prop_map(Call::In),
            (0usize..5).prop_map(Call::NotIn),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: placeholders in the clause always equal the params, in any call order.
        #[test]
        fn placeholder_count_matches_params(calls in prop::collection::vec(call(), 0..12)) {
            let mut q = Query::new();
            for c in &calls {
                match c {
                    Call::Where(v) => { q.and_where("a", CompareOp::Gt, *v); }
                    Call::Null => { q.is_null("b"); }
                    Call::NotNull => { q.is_not_null("b"); }
                    Call::Or(n) => {
                        let cols = vec!["c"; *n];
                        let ops = vec![CompareOp::Ne; *n];
                        let vals: Vec<i64> = (0..*n as i64).collect();
                        q.or(&cols, &ops, &vals);
                    }
                    Call::And(n) => {
                        let cols = vec!["g"; *n];
                        let ops = vec![CompareOp::Lteq; *n];
                        let vals: Vec<String> = (0..*n).map(|i| i.to_string()).collect();
                        q.and(&cols, &ops, &vals);
                    }
                    Call::Between => { q.between_inclusive("d", 1i64, 2i64); }
                    Call::BetweenExclusive => { q.between_exclusive("d", 1i64, 9i64); }
                    Call::In(n) => { q.where_in("e", (0..*n as i64).collect::<Vec<_>>()); }
                    Call::NotIn(n) => { q.where_not_in("f", (0..*n as i64).collect::<Vec<_>>()); }
                }
            }
            let (clause, params) = q.render();
            prop_assert_eq!(clause.matches('?').count(), params.len());
            if q.conditions().is_empty() {
                prop_assert_eq!(clause, "");
            }
        }
    }
}
