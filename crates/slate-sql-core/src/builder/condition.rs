//! WHERE condition values.
//!
//! A condition is either a bare literal (equality) or a set of comparison
//! operators applied to the same column.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value::SqlValue;
use crate::error::{QueryError, Result};
use crate::schema::ColumnType;

/// Starts an empty operator set.
///
/// ```rust
/// use slate_sql_core::builder::op;
///
/// let range = op().gte(10).lt(20);
/// assert_eq!(range.len(), 2);
/// ```
#[must_use]
pub fn op() -> OperatorSet {
    OperatorSet::default()
}

/// Operator kinds, in canonical rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperatorKind {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `IN (...)`
    In,
}

impl OperatorKind {
    /// Returns the SQL token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::In => "IN",
        }
    }
}

/// One comparison with its operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "operand", rename_all = "snake_case")]
pub enum Operator {
    /// Equal.
    Eq(SqlValue),
    /// Not equal.
    Ne(SqlValue),
    /// Greater than.
    Gt(SqlValue),
    /// Greater than or equal.
    Gte(SqlValue),
    /// Less than.
    Lt(SqlValue),
    /// Less than or equal.
    Lte(SqlValue),
    /// Membership in a list, rendered in the given order.
    In(Vec<SqlValue>),
}

impl Operator {
    /// Returns the kind of this operator.
    #[must_use]
    pub const fn kind(&self) -> OperatorKind {
        match self {
            Self::Eq(_) => OperatorKind::Eq,
            Self::Ne(_) => OperatorKind::Ne,
            Self::Gt(_) => OperatorKind::Gt,
            Self::Gte(_) => OperatorKind::Gte,
            Self::Lt(_) => OperatorKind::Lt,
            Self::Lte(_) => OperatorKind::Lte,
            Self::In(_) => OperatorKind::In,
        }
    }

    /// Returns the operand values.
    #[must_use]
    pub fn operands(&self) -> &[SqlValue] {
        match self {
            Self::Eq(v) | Self::Ne(v) | Self::Gt(v) | Self::Gte(v) | Self::Lt(v) | Self::Lte(v) => {
                std::slice::from_ref(v)
            }
            Self::In(values) => values,
        }
    }
}

/// At most one operator of each kind, kept in canonical order.
///
/// Setting an operator that is already present replaces its operand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Operator>", into = "Vec<Operator>")]
pub struct OperatorSet {
    ops: Vec<Operator>,
}

impl OperatorSet {
    fn with(mut self, op: Operator) -> Self {
        let kind = op.kind();
        match self.ops.binary_search_by_key(&kind, Operator::kind) {
            Ok(i) => self.ops[i] = op,
            Err(i) => self.ops.insert(i, op),
        }
        self
    }

    /// Adds `= value`.
    #[must_use]
    pub fn eq(self, value: impl Into<SqlValue>) -> Self {
        self.with(Operator::Eq(value.into()))
    }

    /// Adds `<> value`.
    #[must_use]
    pub fn ne(self, value: impl Into<SqlValue>) -> Self {
        self.with(Operator::Ne(value.into()))
    }

    /// Adds `> value`.
    #[must_use]
    pub fn gt(self, value: impl Into<SqlValue>) -> Self {
        self.with(Operator::Gt(value.into()))
    }

    /// Adds `>= value`.
    #[must_use]
    pub fn gte(self, value: impl Into<SqlValue>) -> Self {
        self.with(Operator::Gte(value.into()))
    }

    /// Adds `< value`.
    #[must_use]
    pub fn lt(self, value: impl Into<SqlValue>) -> Self {
        self.with(Operator::Lt(value.into()))
    }

    /// Adds `<= value`.
    #[must_use]
    pub fn lte(self, value: impl Into<SqlValue>) -> Self {
        self.with(Operator::Lte(value.into()))
    }

    /// Adds `IN (values...)`.
    #[must_use]
    pub fn in_list<I, V>(self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        self.with(Operator::In(values.into_iter().map(Into::into).collect()))
    }

    /// Returns the operators in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = &Operator> {
        self.ops.iter()
    }

    /// Returns the number of operators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns whether no operator is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A deserialized operator list that cannot form a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidOperators {
    /// No operator at all.
    #[error("invalid condition: operator set is empty")]
    Empty,
    /// An `IN` operator without values.
    #[error("invalid condition: IN list is empty")]
    EmptyInList,
}

impl TryFrom<Vec<Operator>> for OperatorSet {
    type Error = InvalidOperators;

    fn try_from(ops: Vec<Operator>) -> std::result::Result<Self, Self::Error> {
        if ops.is_empty() {
            return Err(InvalidOperators::Empty);
        }
        if ops
            .iter()
            .any(|op| matches!(op, Operator::In(values) if values.is_empty()))
        {
            return Err(InvalidOperators::EmptyInList);
        }
        Ok(ops.into_iter().fold(Self::default(), Self::with))
    }
}

impl From<OperatorSet> for Vec<Operator> {
    fn from(set: OperatorSet) -> Self {
        set.ops
    }
}

/// The value side of a WHERE condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConditionValue {
    /// `column = literal`.
    Literal(SqlValue),
    /// One fragment per operator, joined with `AND`.
    Operators(OperatorSet),
}

impl ConditionValue {
    /// Checks this condition against the declared type of `column`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::TypeMismatch`] when a literal or operand does not
    /// conform to `ty`, and [`QueryError::InvalidCondition`] for an empty
    /// operator set or an empty `IN` list.
    pub fn validate(&self, column: &str, ty: ColumnType) -> Result<()> {
        match self {
            Self::Literal(value) => check_operand(column, ty, value),
            Self::Operators(set) => {
                if set.is_empty() {
                    return Err(QueryError::invalid_condition(
                        column,
                        "operator set is empty",
                    ));
                }
                for op in set.iter() {
                    if let Operator::In(values) = op {
                        if values.is_empty() {
                            return Err(QueryError::invalid_condition(column, "IN list is empty"));
                        }
                    }
                    for value in op.operands() {
                        check_operand(column, ty, value)?;
                    }
                }
                Ok(())
            }
        }
    }
}

fn check_operand(column: &str, ty: ColumnType, value: &SqlValue) -> Result<()> {
    if value.conforms_to(ty) {
        Ok(())
    } else {
        Err(QueryError::TypeMismatch {
            column: column.to_string(),
            expected: ty,
            received: value.to_sql_inline(),
        })
    }
}

impl From<OperatorSet> for ConditionValue {
    fn from(set: OperatorSet) -> Self {
        Self::Operators(set)
    }
}

impl From<SqlValue> for ConditionValue {
    fn from(value: SqlValue) -> Self {
        Self::Literal(value)
    }
}

macro_rules! impl_literal_condition {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for ConditionValue {
                fn from(v: $ty) -> Self {
                    Self::Literal(SqlValue::from(v))
                }
            }
        )+
    };
}

impl_literal_condition!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    &str,
    String,
    DateTime<Utc>,
    NaiveDateTime,
    NaiveDate
);
