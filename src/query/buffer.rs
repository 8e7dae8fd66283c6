//! SQL text accumulator with its ordered bound values.

use serde::Serialize;

use crate::searchxml::{Operator, Relation};

/// SQL parameter value for prepared statements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    /// Text parameter (names, patterns, ISO dates)
    Text(String),
    /// Integer parameter (ids, ratings, sizes)
    Integer(i64),
    /// Floating point parameter (coordinates, apertures)
    Real(f64),
}

impl From<i32> for SqlParam {
    fn from(value: i32) -> Self {
        SqlParam::Integer(value as i64)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Integer(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        SqlParam::Real(value)
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(value)
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

/// SQL fragment under construction. Every `?` pushed must be matched by
/// exactly one [`bind`](SqlBuffer::bind), in the same order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlBuffer {
    sql: String,
    values: Vec<SqlParam>,
}

impl SqlBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_str(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    pub fn bind(&mut self, value: impl Into<SqlParam>) {
        self.values.push(value.into());
    }

    /// Combining keyword for `op`, unary form when `is_first`.
    pub fn add_operator(&mut self, op: Operator, is_first: bool) {
        self.sql.push_str(op.to_sql(is_first));
    }

    pub fn add_relation(&mut self, relation: Relation) {
        self.sql.push_str(relation.to_sql());
    }

    /// Constant that leaves the enclosing expression unchanged under `op`.
    pub fn add_no_effect_content(&mut self, op: Operator) {
        self.sql.push_str(op.no_effect_sql());
    }

    /// `?,?,?` for an `IN (...)` list.
    pub fn add_placeholders(&mut self, count: usize) {
        self.sql.push_str(&bound_value_placeholders(count));
    }

    /// Move another fragment and its values to the end of this one.
    pub fn append(&mut self, other: SqlBuffer) {
        self.sql.push_str(&other.sql);
        self.values.extend(other.values);
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[SqlParam] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty() && self.values.is_empty()
    }

    /// Number of `?` placeholders in the text.
    pub fn placeholder_count(&self) -> usize {
        self.sql.matches('?').count()
    }

    pub fn into_parts(self) -> (String, Vec<SqlParam>) {
        (self.sql, self.values)
    }
}

/// Comma separated placeholders without spaces.
pub fn bound_value_placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}
