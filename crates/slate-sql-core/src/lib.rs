//! # slate-sql-core
//!
//! A schema-checked, immutable SELECT query builder.
//!
//! This crate provides:
//! - A static [`SchemaRegistry`] of tables and typed columns
//! - An immutable [`Query`] builder that validates every table, column and
//!   literal at the call that introduces it
//! - A serializable AST ([`SelectStatement`]) and a deterministic SQL
//!   compiler ([`SqlCompiler`])
//! - A [`ResultShape`] resolver and a timeout-bounded boundary to an external
//!   [`ExecutionEngine`]
//!
//! ## Building Queries
//!
//! ```rust
//! use slate_sql_core::builder::op;
//! use slate_sql_core::schema::{ColumnType, SchemaRegistry, TableSchema};
//!
//! let registry = SchemaRegistry::builder()
//!     .table(
//!         TableSchema::new("users")
//!             .column("id", ColumnType::Number)
//!             .column("email", ColumnType::String),
//!     )
//!     .table(
//!         TableSchema::new("posts")
//!             .column("id", ColumnType::Number)
//!             .column("userId", ColumnType::Number)
//!             .column("title", ColumnType::String),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let sql = registry
//!     .query()
//!     .from("users")?
//!     .join("posts", "id", "userId")?
//!     .select(["email", "title"])?
//!     .where_clause([("id", op().gt(10).into())])?
//!     .order_by_asc("title")?
//!     .limit(5)
//!     .to_sql()?;
//!
//! assert_eq!(
//!     sql,
//!     "SELECT email, title FROM users JOIN posts ON id = userId \
//!      WHERE id > 10 ORDER BY title ASC LIMIT 5;"
//! );
//! # Ok::<(), slate_sql_core::QueryError>(())
//! ```
//!
//! ## Errors Surface Early
//!
//! ```rust
//! use slate_sql_core::schema::{ColumnType, SchemaRegistry, TableSchema};
//! use slate_sql_core::ErrorKind;
//!
//! let registry = SchemaRegistry::builder()
//!     .table(TableSchema::new("users").column("id", ColumnType::Number))
//!     .build()
//!     .unwrap();
//!
//! let users = registry.query().from("users").unwrap();
//! let err = users.where_clause([("id", "abc".into())]).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::TypeMismatch);
//! ```
//!
//! ## Inline Literals
//!
//! [`Query::to_sql`] inlines literals, quoting strings with embedded quotes
//! doubled. It is meant for logging and trusted engines; use
//! [`Query::to_sql_parameterized`] or hand the AST to the engine otherwise.

pub mod ast;
pub mod builder;
pub mod compiler;
pub mod engine;
pub mod error;
pub mod result;
pub mod schema;

pub use ast::{OrderDirection, SelectStatement};
pub use builder::{op, ConditionValue, Query, QueryOptions, SqlValue};
pub use compiler::SqlCompiler;
pub use engine::{ExecuteError, ExecuteOptions, ExecutionEngine};
pub use error::{ErrorKind, QueryError, Result};
pub use result::{OutputField, RawRow, ResultShape, Row};
pub use schema::{ColumnType, SchemaRegistry, Table, TableSchema};
