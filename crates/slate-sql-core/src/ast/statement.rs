//! SELECT statement AST.
//!
//! The AST is an owned snapshot of a [`Query`](crate::Query). It serializes
//! to a tree of primitive values so it can be handed to an execution engine
//! or logged.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::builder::ConditionValue;
use crate::compiler::SqlCompiler;

/// Order direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    /// Ascending order (default).
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl OrderDirection {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// The single ORDER BY entry of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column to order by.
    pub column: String,
    /// Direction.
    pub direction: OrderDirection,
}

/// `JOIN <table> ON <on_left> = <on_right>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClause {
    /// The joined table.
    pub table: String,
    /// Column from the context before the join.
    pub on_left: String,
    /// Column from the joined table.
    pub on_right: String,
}

/// A selected column, optionally renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectColumn {
    /// Physical column name.
    pub column: String,
    /// Output name, if different from the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl SelectColumn {
    /// Returns the name this column has in the result set.
    #[must_use]
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.column)
    }
}

impl fmt::Display for SelectColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {alias}", self.column),
            None => f.write_str(&self.column),
        }
    }
}

/// One WHERE entry: a column and its condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Column the condition applies to.
    pub column: String,
    /// Literal or operator set.
    pub value: ConditionValue,
}

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "select")]
pub struct SelectStatement {
    /// Base table.
    pub table: String,
    /// Selected columns; empty means all columns.
    #[serde(default)]
    pub columns: Vec<SelectColumn>,
    /// WHERE conditions in insertion order, joined with AND.
    #[serde(default, rename = "where")]
    pub where_clause: Vec<Condition>,
    /// ORDER BY.
    #[serde(default)]
    pub order_by: Option<OrderBy>,
    /// LIMIT.
    #[serde(default)]
    pub limit: Option<u64>,
    /// OFFSET.
    #[serde(default)]
    pub offset: Option<u64>,
    /// JOIN clauses in insertion order.
    #[serde(default)]
    pub joins: Vec<JoinClause>,
}

impl SelectStatement {
    /// Creates `SELECT * FROM <table>`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            where_clause: Vec::new(),
            order_by: None,
            limit: None,
            offset: None,
            joins: Vec::new(),
        }
    }

    /// Converts the statement to a JSON tree.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Reads a statement back from a JSON tree.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a serialized statement.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&SqlCompiler::render(self))
    }
}
