//! Abstract Syntax Tree (AST) types for SELECT statements.

mod statement;

pub use statement::{
    Condition, JoinClause, OrderBy, OrderDirection, SelectColumn, SelectStatement,
};
