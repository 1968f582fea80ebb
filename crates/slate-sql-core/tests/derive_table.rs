//! Tests for the `#[derive(Table)]` macro output.
//!
//! These tests verify that the derive macro generates:
//! - `{Struct}Table` implementing the `Table` trait
//! - Column types inferred from field types or set explicitly
//! - Column name accessors on both table and row types

use chrono::{NaiveDate, NaiveDateTime};
use slate_sql_core::schema::{ColumnType, SchemaRegistry, Table};
use slate_sql_core::ErrorKind;
use slate_sql_derive::Table;

// =============================================================================
// Test: Basic struct with default table name (snake_case)
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
pub struct AuditEntry {
    pub id: u32,
    pub actor: String,
    pub score: f64,
    pub archived: bool,
    pub logged_on: NaiveDate,
}

#[test]
fn test_default_table_name() {
    assert_eq!(AuditEntryTable::NAME, "audit_entry");
    assert_eq!(AuditEntryTable::table_name(), "audit_entry");
}

#[test]
fn test_inferred_column_types() {
    assert_eq!(
        AuditEntryTable::COLUMNS,
        &[
            ("id", ColumnType::Number),
            ("actor", ColumnType::String),
            ("score", ColumnType::Number),
            ("archived", ColumnType::Boolean),
            ("logged_on", ColumnType::Date),
        ]
    );
}

#[test]
fn test_accessors_on_row_type() {
    assert_eq!(AuditEntry::actor(), "actor");
    assert_eq!(AuditEntryTable::logged_on(), "logged_on");
    let _: AuditEntryTable = AuditEntry::table();
}

// =============================================================================
// Test: Renamed table and columns, optional fields, overrides
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
#[table(name = "sessions")]
pub struct Session {
    pub id: i64,
    #[column(name = "userId")]
    pub user_id: Option<i64>,
    #[column(name = "startedAt")]
    pub started_at: Option<NaiveDateTime>,
    #[column(name = "expiresAt", type = "date")]
    pub expires_at: i64,
    #[column(skip)]
    pub cached_token: Vec<u8>,
}

#[test]
fn test_renamed_columns() {
    assert_eq!(SessionTable::NAME, "sessions");
    assert_eq!(SessionTable::user_id(), "userId");
    assert_eq!(SessionTable::started_at(), "startedAt");
}

#[test]
fn test_option_and_override_types() {
    let schema = SessionTable::schema();
    assert_eq!(schema.name(), "sessions");
    assert_eq!(schema.column_type("userId"), Some(ColumnType::Number));
    assert_eq!(schema.column_type("startedAt"), Some(ColumnType::Date));
    assert_eq!(schema.column_type("expiresAt"), Some(ColumnType::Date));
}

#[test]
fn test_skipped_field_is_not_a_column() {
    assert_eq!(SessionTable::COLUMNS.len(), 4);
    assert_eq!(SessionTable::schema().column_type("cached_token"), None);
}

// =============================================================================
// Test: Registration
// =============================================================================

#[test]
fn test_register_derived_tables() {
    let registry = SchemaRegistry::builder()
        .register::<AuditEntryTable>()
        .register::<SessionTable>()
        .build()
        .unwrap();
    assert_eq!(
        registry.table_names().collect::<Vec<_>>(),
        vec!["audit_entry", "sessions"]
    );

    let sql = registry
        .query()
        .from(SessionTable::NAME)
        .unwrap()
        .select([SessionTable::id(), SessionTable::expires_at()])
        .unwrap()
        .to_sql()
        .unwrap();
    assert_eq!(sql, "SELECT id, expiresAt FROM sessions;");
}

#[test]
fn test_register_same_table_twice() {
    let err = SchemaRegistry::builder()
        .register::<SessionTable>()
        .register::<SessionTable>()
        .build()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}
