//! SQL text compiler.
//!
//! Renders a [`SelectStatement`] with a fixed clause order:
//!
//! ```text
//! SELECT <cols|*> FROM <table> [JOIN ...]* [WHERE ...] [ORDER BY ...] [LIMIT n] [OFFSET n];
//! ```
//!
//! Rendering is a pure function of the AST, so equal statements always
//! produce byte-identical SQL.

mod condition;

pub use condition::{compile_condition, compile_where};

use condition::{write_where, Bind, Inline, LiteralSink};

use crate::ast::SelectStatement;
use crate::builder::SqlValue;

/// Renders SELECT statements to SQL text.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlCompiler;

impl SqlCompiler {
    /// Renders with inline literals.
    ///
    /// **Warning**: the inline form is not safe against injection. Engines
    /// receiving untrusted input should use [`Self::render_parameterized`].
    #[must_use]
    pub fn render(stmt: &SelectStatement) -> String {
        Self::render_with(stmt, &mut Inline)
    }

    /// Renders with `?` placeholders and returns the operands in order.
    #[must_use]
    pub fn render_parameterized(stmt: &SelectStatement) -> (String, Vec<SqlValue>) {
        let mut sink = Bind::default();
        let sql = Self::render_with(stmt, &mut sink);
        (sql, sink.params)
    }

    fn render_with<S: LiteralSink>(stmt: &SelectStatement, sink: &mut S) -> String {
        let mut sql = String::from("SELECT ");

        if stmt.columns.is_empty() {
            sql.push('*');
        } else {
            for (i, column) in stmt.columns.iter().enumerate() {
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&column.to_string());
            }
        }

        sql.push_str(" FROM ");
        sql.push_str(&stmt.table);

        for join in &stmt.joins {
            sql.push_str(" JOIN ");
            sql.push_str(&join.table);
            sql.push_str(" ON ");
            sql.push_str(&join.on_left);
            sql.push_str(" = ");
            sql.push_str(&join.on_right);
        }

        if !stmt.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            write_where(&mut sql, &stmt.where_clause, sink);
        }

        if let Some(order) = &stmt.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.column);
            sql.push(' ');
            sql.push_str(order.direction.as_str());
        }

        if let Some(n) = stmt.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }

        if let Some(n) = stmt.offset {
            sql.push_str(&format!(" OFFSET {n}"));
        }

        sql.push(';');
        tracing::trace!(%sql, "rendered select");
        sql
    }
}
