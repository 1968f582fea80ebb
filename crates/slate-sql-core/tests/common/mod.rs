#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use slate_sql_core::schema::SchemaRegistry;
use slate_sql_core::Query;
use slate_sql_derive::Table;

#[derive(Debug, Clone, Table)]
#[table(name = "users")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[column(name = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Table)]
#[table(name = "posts")]
pub struct Post {
    pub id: i64,
    #[column(name = "userId")]
    pub user_id: i64,
    pub title: String,
    #[column(name = "createdAt")]
    pub created_at: DateTime<Utc>,
}

pub fn registry() -> Arc<SchemaRegistry> {
    SchemaRegistry::builder()
        .register::<UserTable>()
        .register::<PostTable>()
        .build()
        .unwrap_or_else(|e| panic!("Failed to build registry: {e}"))
}

pub fn root() -> Query {
    registry().query()
}

/// Asserts that the compiled SQL matches and that compiling the AST
/// separately yields the same string.
pub fn assert_sql(query: &Query, expected: &str) {
    let sql = query
        .to_sql()
        .unwrap_or_else(|e| panic!("Failed to compile: {e}"));
    assert_eq!(sql, expected);
    let ast = query.to_ast().unwrap();
    assert_eq!(
        slate_sql_core::SqlCompiler::render(&ast),
        sql,
        "Round-trip failed for: {expected}"
    );
}
