//! SQL literal values.
//!
//! [`SqlValue`] is both the operand type of WHERE conditions and the cell type
//! of rows returned by an execution engine.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

/// A SQL literal.
///
/// Inline rendering (see [`SqlValue::to_sql_inline`]) is a textual
/// convenience. Engines handling untrusted input should bind the values
/// collected by [`SqlCompiler::render_parameterized`](crate::SqlCompiler::render_parameterized)
/// instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SqlValue {
    /// NULL value. Only valid in result rows.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// UTC timestamp.
    Date(DateTime<Utc>),
}

impl SqlValue {
    /// Returns the column type this value belongs to, `None` for NULL.
    #[must_use]
    pub const fn column_type(&self) -> Option<ColumnType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ColumnType::Boolean),
            Self::Int(_) | Self::Float(_) => Some(ColumnType::Number),
            Self::Text(_) => Some(ColumnType::String),
            Self::Date(_) => Some(ColumnType::Date),
        }
    }

    /// Returns whether this value can be compared against a column of type
    /// `ty`. NULL and non-finite floats never conform.
    #[must_use]
    pub fn conforms_to(&self, ty: ColumnType) -> bool {
        match self {
            Self::Float(f) if !f.is_finite() => false,
            other => other.column_type() == Some(ty),
        }
    }

    /// Returns whether this value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the SQL representation for inline use.
    ///
    /// Strings and dates are single-quoted with embedded quotes doubled,
    /// dates use RFC 3339 in UTC with millisecond precision.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => quote(s),
            Self::Date(d) => quote(&d.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    /// Returns the parameter placeholder.
    #[must_use]
    pub const fn placeholder() -> &'static str {
        "?"
    }
}

fn quote(s: &str) -> String {
    let escaped = s.replace('\'', "''");
    format!("'{escaped}'")
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_inline())
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(v: $ty) -> Self {
                    Self::Int(i64::from(v))
                }
            }
        )+
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(String::from(v))
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::Date(v.and_utc())
    }
}

/// Dates without a time of day are taken at midnight UTC.
impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v.and_time(NaiveTime::default()).and_utc())
    }
}

impl<T: Into<Self>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
