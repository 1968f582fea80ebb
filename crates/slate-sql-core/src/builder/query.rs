//! Immutable, schema-checked SELECT builder.
//!
//! Every transition borrows the receiver and returns a fresh [`Query`]; no
//! value is ever modified after it has been returned. Clause data is held
//! behind [`Arc`], so a successor shares everything it did not change with
//! its predecessor and clones stay cheap.
//!
//! Names are validated eagerly against the active table context: the base
//! table chosen by [`Query::from`] plus every table added by [`Query::join`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::condition::ConditionValue;
use super::value::SqlValue;
use crate::ast::{Condition, JoinClause, OrderBy, OrderDirection, SelectColumn, SelectStatement};
use crate::compiler::SqlCompiler;
use crate::error::{QueryError, Result};
use crate::result::ResultShape;
use crate::schema::{ColumnType, SchemaRegistry, TableSchema};

/// Options carried by a root builder and inherited by every successor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// Reject compiling a query that has no explicit selection instead of
    /// falling back to `*`.
    pub require_columns: bool,
}

/// What a query selects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// `*`.
    #[default]
    All,
    /// Column names, in order, duplicates kept.
    Columns(Vec<String>),
    /// `(alias, column)` pairs, in order.
    Aliased(Vec<(String, String)>),
}

impl Selection {
    fn to_ast(&self) -> Vec<SelectColumn> {
        match self {
            Self::All => Vec::new(),
            Self::Columns(columns) => columns
                .iter()
                .map(|column| SelectColumn {
                    column: column.clone(),
                    alias: None,
                })
                .collect(),
            Self::Aliased(pairs) => pairs
                .iter()
                .map(|(alias, column)| SelectColumn {
                    column: column.clone(),
                    alias: Some(alias.clone()),
                })
                .collect(),
        }
    }
}

/// Columns in scope for validation.
#[derive(Debug, Clone, Default)]
struct TableContext {
    tables: Vec<String>,
    columns: Vec<(String, ColumnType)>,
}

impl TableContext {
    fn of(schema: &TableSchema) -> Self {
        Self {
            tables: vec![schema.name().to_string()],
            columns: schema.columns().to_vec(),
        }
    }

    fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    fn describe(&self) -> String {
        if self.tables.is_empty() {
            String::from("<none>")
        } else {
            self.tables.join(", ")
        }
    }

    fn require(&self, column: &str) -> Result<ColumnType> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, ty)| *ty)
            .ok_or_else(|| QueryError::UnknownColumn {
                column: column.to_string(),
                context: self.describe(),
            })
    }

    /// Union with a joined table. A name already in scope with the same type
    /// is merged; with another type it is a conflict.
    fn joined(&self, schema: &TableSchema) -> Result<Self> {
        let mut next = self.clone();
        next.tables.push(schema.name().to_string());
        for (name, ty) in schema.columns() {
            match self.columns.iter().find(|(existing, _)| existing == name) {
                Some((_, existing)) if existing == ty => {}
                Some((_, existing)) => {
                    return Err(QueryError::JoinColumnConflict {
                        table: schema.name().to_string(),
                        column: name.clone(),
                        existing: *existing,
                        joined: *ty,
                    });
                }
                None => next.columns.push((name.clone(), *ty)),
            }
        }
        Ok(next)
    }
}

/// An immutable query state.
///
/// The root value (see [`Query::root`]) has no table and no clauses; it can
/// be cloned and extended from any number of call sites or threads.
///
/// ```rust
/// use slate_sql_core::schema::{ColumnType, SchemaRegistry, TableSchema};
///
/// let registry = SchemaRegistry::builder()
///     .table(
///         TableSchema::new("users")
///             .column("id", ColumnType::Number)
///             .column("email", ColumnType::String),
///     )
///     .build()
///     .unwrap();
///
/// let sql = registry
///     .query()
///     .from("users")?
///     .select(["id", "email"])?
///     .where_clause([("id", 123.into())])?
///     .to_sql()?;
/// assert_eq!(sql, "SELECT id, email FROM users WHERE id = 123;");
/// # Ok::<(), slate_sql_core::QueryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    registry: Arc<SchemaRegistry>,
    options: QueryOptions,
    table: Option<String>,
    context: Arc<TableContext>,
    selection: Arc<Selection>,
    conditions: Arc<[Condition]>,
    order_by: Option<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    joins: Arc<[JoinClause]>,
}

impl Query {
    /// Creates the root builder for a registry.
    #[must_use]
    pub fn root(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            options: QueryOptions::default(),
            table: None,
            context: Arc::default(),
            selection: Arc::default(),
            conditions: Arc::from(Vec::new()),
            order_by: None,
            limit: None,
            offset: None,
            joins: Arc::from(Vec::new()),
        }
    }

    /// Returns a copy of this query using `options`.
    #[must_use]
    pub fn with_options(&self, options: QueryOptions) -> Self {
        Self {
            options,
            ..self.clone()
        }
    }

    /// Sets the base table and clears every clause.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownTable`] if `table` is not registered.
    pub fn from(&self, table: &str) -> Result<Self> {
        let schema = self
            .registry
            .table(table)
            .ok_or_else(|| QueryError::unknown_table(table))?;
        tracing::debug!(table, "query from");
        Ok(Self {
            table: Some(table.to_string()),
            context: Arc::new(TableContext::of(schema)),
            ..Self::root(Arc::clone(&self.registry)).with_options(self.options)
        })
    }

    /// Replaces the selection with a list of columns.
    ///
    /// Order is preserved and duplicates are kept. An empty list selects all
    /// columns.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownColumn`] for a column outside the table context.
    pub fn select<I, S>(&self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = columns
            .into_iter()
            .map(|column| {
                let column = column.as_ref();
                self.context.require(column).map(|_| column.to_string())
            })
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(columns = columns.len(), "query select");
        let selection = if columns.is_empty() {
            Selection::All
        } else {
            Selection::Columns(columns)
        };
        Ok(Self {
            selection: Arc::new(selection),
            ..self.clone()
        })
    }

    /// Replaces the selection with `(alias, column)` pairs, rendered as
    /// `column AS alias`.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownColumn`] for a column outside the table context,
    /// [`QueryError::DuplicateAlias`] when an alias repeats.
    pub fn select_as<I, A, C>(&self, mapping: I) -> Result<Self>
    where
        I: IntoIterator<Item = (A, C)>,
        A: Into<String>,
        C: AsRef<str>,
    {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for (alias, column) in mapping {
            let alias = alias.into();
            let column = column.as_ref();
            self.context.require(column)?;
            if pairs.iter().any(|(existing, _)| *existing == alias) {
                return Err(QueryError::DuplicateAlias(alias));
            }
            pairs.push((alias, column.to_string()));
        }
        tracing::debug!(aliases = pairs.len(), "query select_as");
        let selection = if pairs.is_empty() {
            Selection::All
        } else {
            Selection::Aliased(pairs)
        };
        Ok(Self {
            selection: Arc::new(selection),
            ..self.clone()
        })
    }

    /// Replaces the WHERE conditions.
    ///
    /// Conditions render in the order given. A column given twice keeps its
    /// first position and its last value.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownColumn`], [`QueryError::TypeMismatch`] or
    /// [`QueryError::InvalidCondition`].
    pub fn where_clause<I, K>(&self, conditions: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, ConditionValue)>,
        K: Into<String>,
    {
        let mut entries: Vec<Condition> = Vec::new();
        for (column, value) in conditions {
            let column = column.into();
            let ty = self.context.require(&column)?;
            value.validate(&column, ty)?;
            match entries.iter_mut().find(|c| c.column == column) {
                Some(existing) => existing.value = value,
                None => entries.push(Condition { column, value }),
            }
        }
        tracing::debug!(conditions = entries.len(), "query where");
        Ok(Self {
            conditions: Arc::from(entries),
            ..self.clone()
        })
    }

    /// Appends `JOIN table ON left = right` and widens the table context
    /// with the joined table's columns.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownJoinTable`], [`QueryError::UnknownColumn`] when
    /// `left` is not in the current context or `right` is not in `table`,
    /// [`QueryError::JoinColumnConflict`] when a shared column name has
    /// different types.
    pub fn join(&self, table: &str, left: &str, right: &str) -> Result<Self> {
        let schema = self
            .registry
            .table(table)
            .ok_or_else(|| QueryError::UnknownJoinTable {
                table: table.to_string(),
                context: self.context.describe(),
            })?;
        self.context.require(left)?;
        if schema.column_type(right).is_none() {
            return Err(QueryError::UnknownColumn {
                column: right.to_string(),
                context: table.to_string(),
            });
        }
        let context = self.context.joined(schema)?;
        tracing::debug!(table, left, right, "query join");

        let mut joins = self.joins.to_vec();
        joins.push(JoinClause {
            table: table.to_string(),
            on_left: left.to_string(),
            on_right: right.to_string(),
        });
        Ok(Self {
            context: Arc::new(context),
            joins: Arc::from(joins),
            ..self.clone()
        })
    }

    /// Replaces the ORDER BY clause.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownColumn`] for a column outside the table context.
    pub fn order_by(&self, column: &str, direction: OrderDirection) -> Result<Self> {
        self.context.require(column)?;
        tracing::debug!(column, direction = direction.as_str(), "query order_by");
        Ok(Self {
            order_by: Some(OrderBy {
                column: column.to_string(),
                direction,
            }),
            ..self.clone()
        })
    }

    /// `ORDER BY column ASC`.
    ///
    /// # Errors
    ///
    /// See [`Self::order_by`].
    pub fn order_by_asc(&self, column: &str) -> Result<Self> {
        self.order_by(column, OrderDirection::Asc)
    }

    /// `ORDER BY column DESC`.
    ///
    /// # Errors
    ///
    /// See [`Self::order_by`].
    pub fn order_by_desc(&self, column: &str) -> Result<Self> {
        self.order_by(column, OrderDirection::Desc)
    }

    /// Replaces the LIMIT.
    #[must_use]
    pub fn limit(&self, n: u64) -> Self {
        Self {
            limit: Some(n),
            ..self.clone()
        }
    }

    /// Replaces the OFFSET.
    #[must_use]
    pub fn offset(&self, n: u64) -> Self {
        Self {
            offset: Some(n),
            ..self.clone()
        }
    }

    /// Snapshots the query as an AST.
    ///
    /// # Errors
    ///
    /// [`QueryError::MissingTable`] before [`Self::from`];
    /// [`QueryError::MissingColumns`] in strict mode without a selection.
    pub fn to_ast(&self) -> Result<SelectStatement> {
        let table = self.table.as_ref().ok_or(QueryError::MissingTable)?;
        if self.options.require_columns && *self.selection == Selection::All {
            return Err(QueryError::MissingColumns {
                table: table.clone(),
            });
        }
        Ok(SelectStatement {
            table: table.clone(),
            columns: self.selection.to_ast(),
            where_clause: self.conditions.to_vec(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
            joins: self.joins.to_vec(),
        })
    }

    /// Compiles the query to SQL with inline literals.
    ///
    /// # Errors
    ///
    /// See [`Self::to_ast`].
    pub fn to_sql(&self) -> Result<String> {
        self.to_ast().map(|ast| SqlCompiler::render(&ast))
    }

    /// Compiles the query to SQL with `?` placeholders plus the bound values.
    ///
    /// # Errors
    ///
    /// See [`Self::to_ast`].
    pub fn to_sql_parameterized(&self) -> Result<(String, Vec<SqlValue>)> {
        self.to_ast().map(|ast| SqlCompiler::render_parameterized(&ast))
    }

    /// Derives the output fields a matching engine would return.
    ///
    /// # Errors
    ///
    /// [`QueryError::MissingTable`] before [`Self::from`].
    pub fn result_shape(&self) -> Result<ResultShape> {
        if self.table.is_none() {
            return Err(QueryError::MissingTable);
        }
        Ok(ResultShape::resolve(self.context.columns(), &self.selection))
    }

    /// Returns the base table, if set.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Returns the current selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Returns the columns in scope, base table first.
    #[must_use]
    pub fn context_columns(&self) -> &[(String, ColumnType)] {
        self.context.columns()
    }

    /// Returns the options in effect.
    #[must_use]
    pub const fn options(&self) -> QueryOptions {
        self.options
    }

    /// Returns the registry this query validates against.
    #[must_use]
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::op;
    use crate::error::ErrorKind;

    fn root() -> Query {
        SchemaRegistry::builder()
            .table(
                TableSchema::new("users")
                    .column("id", ColumnType::Number)
                    .column("email", ColumnType::String)
                    .column("createdAt", ColumnType::Date),
            )
            .table(
                TableSchema::new("posts")
                    .column("id", ColumnType::Number)
                    .column("userId", ColumnType::Number)
                    .column("title", ColumnType::String)
                    .column("createdAt", ColumnType::Date),
            )
            .table(
                TableSchema::new("flags")
                    .column("id", ColumnType::String)
                    .column("enabled", ColumnType::Boolean),
            )
            .build()
            .unwrap()
            .query()
    }

    #[test]
    fn test_from_resets_clauses() {
        let q = root()
            .from("users")
            .unwrap()
            .select(["id"])
            .unwrap()
            .limit(3)
            .from("posts")
            .unwrap();
        assert_eq!(q.to_sql().unwrap(), "SELECT * FROM posts;");
    }

    #[test]
    fn test_from_keeps_options() {
        let strict = root().with_options(QueryOptions {
            require_columns: true,
        });
        let q = strict.from("users").unwrap();
        assert!(q.options().require_columns);
        assert_eq!(q.to_sql().unwrap_err().kind(), ErrorKind::MissingColumns);
    }

    #[test]
    fn test_unknown_table() {
        let err = root().from("nonexistent_table").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_unknown_column_names_context() {
        let err = root()
            .from("users")
            .unwrap()
            .select(["nickname"])
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownColumn {
                column: String::from("nickname"),
                context: String::from("users"),
            }
        );
    }

    #[test]
    fn test_select_before_from_is_schema_error() {
        let err = root().select(["id"]).unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownColumn {
                column: String::from("id"),
                context: String::from("<none>"),
            }
        );
    }

    #[test]
    fn test_root_to_sql_missing_table() {
        assert_eq!(root().to_sql().unwrap_err(), QueryError::MissingTable);
        assert_eq!(root().limit(1).to_ast().unwrap_err(), QueryError::MissingTable);
    }

    #[test]
    fn test_empty_select_means_all() {
        let q = root().from("users").unwrap().select(["id"]).unwrap();
        let q = q.select(Vec::<String>::new()).unwrap();
        assert_eq!(*q.selection(), Selection::All);
    }

    #[test]
    fn test_select_keeps_duplicates() {
        let sql = root()
            .from("users")
            .unwrap()
            .select(["id", "id"])
            .unwrap()
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT id, id FROM users;");
    }

    #[test]
    fn test_select_as() {
        let sql = root()
            .from("users")
            .unwrap()
            .select_as([("userId", "id"), ("emailAddress", "email")])
            .unwrap()
            .to_sql()
            .unwrap();
        assert_eq!(
            sql,
            "SELECT id AS userId, email AS emailAddress FROM users;"
        );
    }

    #[test]
    fn test_select_as_duplicate_alias() {
        let err = root()
            .from("users")
            .unwrap()
            .select_as([("a", "id"), ("a", "email")])
            .unwrap_err();
        assert_eq!(err, QueryError::DuplicateAlias(String::from("a")));
    }

    #[test]
    fn test_where_type_mismatch() {
        let err = root()
            .from("users")
            .unwrap()
            .where_clause([("id", "not-a-number".into())])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_where_unknown_column() {
        let err = root()
            .from("users")
            .unwrap()
            .where_clause([("foo", 123.into())])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_where_duplicate_key_last_value_first_position() {
        let sql = root()
            .from("users")
            .unwrap()
            .where_clause([
                ("id", ConditionValue::from(1)),
                ("email", "a@b.c".into()),
                ("id", op().gt(5).into()),
            ])
            .unwrap()
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE id > 5 AND email = 'a@b.c';");
    }

    #[test]
    fn test_join_widens_context() {
        let q = root()
            .from("users")
            .unwrap()
            .join("posts", "id", "userId")
            .unwrap();
        let names: Vec<&str> = q
            .context_columns()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "email", "createdAt", "userId", "title"]);
        assert!(q.where_clause([("title", "x".into())]).is_ok());
    }

    #[test]
    fn test_join_unknown_table_names_context() {
        let err = root()
            .from("users")
            .unwrap()
            .join("comments", "id", "userId")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(
            err,
            QueryError::UnknownJoinTable {
                table: String::from("comments"),
                context: String::from("users"),
            }
        );
        assert_eq!(
            err.to_string(),
            "unknown join table 'comments' for table context [users]"
        );
    }

    #[test]
    fn test_join_left_must_be_in_context() {
        let err = root()
            .from("users")
            .unwrap()
            .join("posts", "userId", "id")
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownColumn {
                column: String::from("userId"),
                context: String::from("users"),
            }
        );
    }

    #[test]
    fn test_join_right_must_be_in_joined_table() {
        let err = root()
            .from("users")
            .unwrap()
            .join("posts", "id", "email")
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownColumn {
                column: String::from("email"),
                context: String::from("posts"),
            }
        );
    }

    #[test]
    fn test_join_type_conflict() {
        let err = root()
            .from("users")
            .unwrap()
            .join("flags", "id", "enabled")
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::JoinColumnConflict {
                table: String::from("flags"),
                column: String::from("id"),
                existing: ColumnType::Number,
                joined: ColumnType::String,
            }
        );
    }

    #[test]
    fn test_order_by_replaces() {
        let sql = root()
            .from("users")
            .unwrap()
            .order_by_desc("createdAt")
            .unwrap()
            .order_by_asc("email")
            .unwrap()
            .to_sql()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users ORDER BY email ASC;");
    }

    #[test]
    fn test_parameterized() {
        let (sql, params) = root()
            .from("users")
            .unwrap()
            .where_clause([("email", "x@y.z".into())])
            .unwrap()
            .to_sql_parameterized()
            .unwrap();
        assert_eq!(sql, "SELECT * FROM users WHERE email = ?;");
        assert_eq!(params, vec![crate::builder::SqlValue::from("x@y.z")]);
    }

    #[test]
    fn test_query_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Query>();
    }
}
