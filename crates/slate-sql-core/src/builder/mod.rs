//! Schema-checked SELECT builder.
//!
//! A [`Query`] is an immutable state. Each transition validates its input
//! against the schema registry and returns a new state, leaving the receiver
//! untouched, so a partially built query can be reused as a template.
//!
//! # Example
//!
//! ```rust
//! use slate_sql_core::builder::op;
//! use slate_sql_core::schema::{ColumnType, SchemaRegistry, TableSchema};
//!
//! let registry = SchemaRegistry::builder()
//!     .table(
//!         TableSchema::new("posts")
//!             .column("id", ColumnType::Number)
//!             .column("userId", ColumnType::Number)
//!             .column("title", ColumnType::String),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let base = registry.query().from("posts")?;
//! let sql = base
//!     .where_clause([("userId", op().eq(42).into()), ("id", op().in_list([1, 2, 3]).into())])?
//!     .to_sql()?;
//! assert_eq!(sql, "SELECT * FROM posts WHERE userId = 42 AND id IN (1, 2, 3);");
//!
//! // `base` itself is unchanged.
//! assert_eq!(base.to_sql()?, "SELECT * FROM posts;");
//! # Ok::<(), slate_sql_core::QueryError>(())
//! ```

mod condition;
mod query;
pub mod value;

pub use condition::{op, ConditionValue, InvalidOperators, Operator, OperatorKind, OperatorSet};
pub use query::{Query, QueryOptions, Selection};
pub use value::SqlValue;
