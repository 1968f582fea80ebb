//! WHERE condition compiler.

use crate::ast::Condition;
use crate::builder::{ConditionValue, Operator, SqlValue};

/// Destination for literal operands while rendering.
pub(crate) trait LiteralSink {
    fn push_literal(&mut self, out: &mut String, value: &SqlValue);
}

/// Writes literals inline.
pub(crate) struct Inline;

impl LiteralSink for Inline {
    fn push_literal(&mut self, out: &mut String, value: &SqlValue) {
        out.push_str(&value.to_sql_inline());
    }
}

/// Writes placeholders and collects the operands in order.
#[derive(Default)]
pub(crate) struct Bind {
    pub(crate) params: Vec<SqlValue>,
}

impl LiteralSink for Bind {
    fn push_literal(&mut self, out: &mut String, value: &SqlValue) {
        out.push_str(SqlValue::placeholder());
        self.params.push(value.clone());
    }
}

/// Renders one column condition with inline literals.
///
/// ```rust
/// use slate_sql_core::builder::op;
/// use slate_sql_core::compiler::compile_condition;
///
/// let sql = compile_condition("age", &op().gte(18).lt(65).into());
/// assert_eq!(sql, "age >= 18 AND age < 65");
/// ```
#[must_use]
pub fn compile_condition(column: &str, value: &ConditionValue) -> String {
    let mut out = String::new();
    write_condition(&mut out, column, value, &mut Inline);
    out
}

/// Renders a WHERE body, `None` when there are no conditions.
#[must_use]
pub fn compile_where(conditions: &[Condition]) -> Option<String> {
    if conditions.is_empty() {
        return None;
    }
    let mut out = String::new();
    write_where(&mut out, conditions, &mut Inline);
    Some(out)
}

pub(crate) fn write_where<S: LiteralSink>(out: &mut String, conditions: &[Condition], sink: &mut S) {
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            out.push_str(" AND ");
        }
        write_condition(out, &condition.column, &condition.value, sink);
    }
}

fn write_condition<S: LiteralSink>(
    out: &mut String,
    column: &str,
    value: &ConditionValue,
    sink: &mut S,
) {
    match value {
        ConditionValue::Literal(literal) => {
            out.push_str(column);
            out.push_str(" = ");
            sink.push_literal(out, literal);
        }
        ConditionValue::Operators(set) => {
            for (i, op) in set.iter().enumerate() {
                if i > 0 {
                    out.push_str(" AND ");
                }
                out.push_str(column);
                out.push(' ');
                out.push_str(op.kind().as_str());
                out.push(' ');
                match op {
                    Operator::In(values) => {
                        out.push('(');
                        for (j, v) in values.iter().enumerate() {
                            if j > 0 {
                                out.push_str(", ");
                            }
                            sink.push_literal(out, v);
                        }
                        out.push(')');
                    }
                    Operator::Eq(v)
                    | Operator::Ne(v)
                    | Operator::Gt(v)
                    | Operator::Gte(v)
                    | Operator::Lt(v)
                    | Operator::Lte(v) => sink.push_literal(out, v),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::op;
    use chrono::{TimeZone, Utc};

    fn cond(column: &str, value: impl Into<ConditionValue>) -> Condition {
        Condition {
            column: String::from(column),
            value: value.into(),
        }
    }

    #[test]
    fn test_literal_condition() {
        assert_eq!(compile_condition("id", &123.into()), "id = 123");
        assert_eq!(
            compile_condition("email", &"a@b.c".into()),
            "email = 'a@b.c'"
        );
        assert_eq!(compile_condition("active", &true.into()), "active = TRUE");
    }

    #[test]
    fn test_every_operator() {
        let set = op().eq(1).ne(2).gt(3).gte(4).lt(5).lte(6).in_list([7, 8]);
        assert_eq!(
            compile_condition("n", &set.into()),
            "n = 1 AND n <> 2 AND n > 3 AND n >= 4 AND n < 5 AND n <= 6 AND n IN (7, 8)"
        );
    }

    #[test]
    fn test_date_range() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            compile_condition("createdAt", &op().gt(from).lt(to).into()),
            "createdAt > '2024-01-01T00:00:00.000Z' AND createdAt < '2025-01-01T00:00:00.000Z'"
        );
    }

    #[test]
    fn test_in_list_keeps_given_order() {
        assert_eq!(
            compile_condition("id", &op().in_list([3, 1, 2]).into()),
            "id IN (3, 1, 2)"
        );
    }

    #[test]
    fn test_where_insertion_order() {
        let conditions = vec![
            cond("userId", op().eq(42)),
            cond("id", op().in_list([1, 2, 3])),
        ];
        assert_eq!(
            compile_where(&conditions).as_deref(),
            Some("userId = 42 AND id IN (1, 2, 3)")
        );
        assert_eq!(compile_where(&[]), None);
    }

    #[test]
    fn test_bind_sink_collects_params() {
        let conditions = vec![
            cond("email", "x'y"),
            cond("id", op().gt(1).in_list([5, 6])),
        ];
        let mut out = String::new();
        let mut sink = Bind::default();
        write_where(&mut out, &conditions, &mut sink);
        assert_eq!(out, "email = ? AND id > ? AND id IN (?, ?)");
        assert_eq!(
            sink.params,
            vec![
                SqlValue::from("x'y"),
                SqlValue::Int(1),
                SqlValue::Int(5),
                SqlValue::Int(6)
            ]
        );
    }
}
