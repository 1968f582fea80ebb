//! Static schema registry.
//!
//! The registry maps table names to their ordered column sets. It is built
//! once, wrapped in an [`Arc`], and only ever read afterwards: every
//! [`Query`](crate::Query) derived from the same root shares it.
//!
//! Tables are usually declared with `#[derive(Table)]` from
//! `slate-sql-derive`, which implements the [`Table`] trait below.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::builder::Query;
use crate::error::{QueryError, Result};

/// Primitive type tag of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// Integer or floating point number.
    Number,
    /// Text.
    String,
    /// Point in time (rendered as RFC 3339, UTC).
    Date,
    /// `TRUE` / `FALSE`.
    Boolean,
}

impl ColumnType {
    /// Returns the lowercase tag name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Date => "date",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for statically declared tables.
///
/// Implemented by the `#[derive(Table)]` macro.
pub trait Table {
    /// The SQL table name.
    const NAME: &'static str;

    /// Columns in declaration order.
    const COLUMNS: &'static [(&'static str, ColumnType)];

    /// Returns the runtime schema of this table.
    #[must_use]
    fn schema() -> TableSchema {
        Self::COLUMNS
            .iter()
            .fold(TableSchema::new(Self::NAME), |schema, (name, ty)| {
                schema.column(*name, *ty)
            })
    }
}

/// A table name with its ordered column set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    columns: Vec<(String, ColumnType)>,
}

impl TableSchema {
    /// Creates a schema with no columns.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.push((name.into(), ty));
        self
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    /// Returns the type of a column, if the table has it.
    #[must_use]
    pub fn column_type(&self, column: &str) -> Option<ColumnType> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, ty)| *ty)
    }

    fn check_unique_columns(&self) -> Result<()> {
        for (i, (name, _)) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|(other, _)| other == name) {
                return Err(QueryError::DuplicateColumn {
                    table: self.name.clone(),
                    column: name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Read-only mapping from table name to [`TableSchema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: BTreeMap<String, TableSchema>,
}

impl SchemaRegistry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Returns the registered table names, sorted.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Returns the schema of a table.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Returns the columns of a table in declaration order.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownTable`] if the table is not registered.
    pub fn columns_of(&self, name: &str) -> Result<&[(String, ColumnType)]> {
        self.table(name)
            .map(TableSchema::columns)
            .ok_or_else(|| QueryError::unknown_table(name))
    }

    /// Returns whether a table is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Returns the root builder for this registry.
    #[must_use]
    pub fn query(self: &Arc<Self>) -> Query {
        Query::root(Arc::clone(self))
    }
}

/// Builder for [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    tables: Vec<TableSchema>,
}

impl RegistryBuilder {
    /// Registers a statically declared table.
    #[must_use]
    pub fn register<T: Table>(self) -> Self {
        self.table(T::schema())
    }

    /// Registers a table schema.
    #[must_use]
    pub fn table(mut self, schema: TableSchema) -> Self {
        self.tables.push(schema);
        self
    }

    /// Validates the tables and freezes the registry.
    ///
    /// # Errors
    ///
    /// Fails when a table name is registered twice or a table declares the
    /// same column twice.
    pub fn build(self) -> Result<Arc<SchemaRegistry>> {
        let mut tables = BTreeMap::new();
        for schema in self.tables {
            schema.check_unique_columns()?;
            if tables.contains_key(schema.name()) {
                return Err(QueryError::DuplicateTable(schema.name));
            }
            tables.insert(schema.name.clone(), schema);
        }
        tracing::debug!(tables = tables.len(), "schema registry built");
        Ok(Arc::new(SchemaRegistry { tables }))
    }
}
