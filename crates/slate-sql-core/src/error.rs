//! Error types for query construction and compilation.

use crate::schema::ColumnType;

/// Coarse classification of a [`QueryError`].
///
/// Callers that only care about the category of a failure (for example to
/// map it onto an API status) can match on this instead of the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A table or column name does not exist in the schema context.
    Schema,
    /// A literal or operand disagrees with the column's declared type.
    TypeMismatch,
    /// An operator set is malformed.
    InvalidCondition,
    /// The query was compiled before a table was chosen.
    MissingTable,
    /// The query was compiled without a selection in strict mode.
    MissingColumns,
}

/// Errors raised by the builder, the registry and the compiler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// The table is not registered.
    #[error("unknown table '{table}'")]
    UnknownTable {
        /// The offending table name.
        table: String,
    },

    /// A join names a table that is not registered.
    #[error("unknown join table '{table}' for table context [{context}]")]
    UnknownJoinTable {
        /// The offending table name.
        table: String,
        /// The tables in scope before the join, comma separated.
        context: String,
    },

    /// The column does not exist in the active table context.
    #[error("unknown column '{column}' in table context [{context}]")]
    UnknownColumn {
        /// The offending column name.
        column: String,
        /// The tables in scope, comma separated (`<none>` before `from`).
        context: String,
    },

    /// A table was registered twice.
    #[error("table '{0}' is registered more than once")]
    DuplicateTable(String),

    /// A table declares the same column twice.
    #[error("column '{column}' is declared more than once in table '{table}'")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Repeated column name.
        column: String,
    },

    /// An alias mapping uses the same alias twice.
    #[error("alias '{0}' is used more than once in the selection")]
    DuplicateAlias(String),

    /// A joined table brings a column whose name is already in scope with
    /// another type.
    #[error(
        "joining '{table}' brings column '{column}' as {joined} but it is already in scope as {existing}"
    )]
    JoinColumnConflict {
        /// The joined table.
        table: String,
        /// The colliding column name.
        column: String,
        /// Type of the column already in scope.
        existing: ColumnType,
        /// Type declared by the joined table.
        joined: ColumnType,
    },

    /// A WHERE literal or operand has the wrong type.
    #[error("type mismatch on column '{column}': expected {expected}, received {received}")]
    TypeMismatch {
        /// Column name.
        column: String,
        /// Declared column type.
        expected: ColumnType,
        /// Inline rendering of the received value.
        received: String,
    },

    /// A WHERE operator set is malformed.
    #[error("invalid condition on column '{column}': {reason}")]
    InvalidCondition {
        /// Column name.
        column: String,
        /// What is wrong with the condition.
        reason: String,
    },

    /// `to_ast` / `to_sql` called before `from`.
    #[error("cannot compile a query without a FROM table")]
    MissingTable,

    /// Strict mode requires an explicit selection.
    #[error("query on table '{table}' has no selected columns")]
    MissingColumns {
        /// The base table of the query.
        table: String,
    },
}

impl QueryError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTable { .. }
            | Self::UnknownJoinTable { .. }
            | Self::UnknownColumn { .. }
            | Self::DuplicateTable(_)
            | Self::DuplicateColumn { .. }
            | Self::DuplicateAlias(_)
            | Self::JoinColumnConflict { .. } => ErrorKind::Schema,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::InvalidCondition { .. } => ErrorKind::InvalidCondition,
            Self::MissingTable => ErrorKind::MissingTable,
            Self::MissingColumns { .. } => ErrorKind::MissingColumns,
        }
    }

    pub(crate) fn unknown_table(table: &str) -> Self {
        Self::UnknownTable {
            table: table.to_string(),
        }
    }

    pub(crate) fn invalid_condition(column: &str, reason: impl Into<String>) -> Self {
        Self::InvalidCondition {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
