//! Result shape resolution and row projection.
//!
//! A [`ResultShape`] is derived statically from a query's table context and
//! selection. It names every output field, the physical column it comes from
//! and that column's type, and projects the raw rows an engine returns onto
//! those fields.

use std::collections::HashMap;

use chrono::SecondsFormat;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::builder::{Selection, SqlValue};
use crate::schema::ColumnType;

/// A row as returned by an engine, keyed by physical column name.
pub type RawRow = HashMap<String, SqlValue>;

/// One output field of a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputField {
    /// Name in the result set (the alias, or the column itself).
    pub name: String,
    /// Originating column.
    pub column: String,
    /// Declared type of the originating column.
    pub column_type: ColumnType,
}

/// A raw row value that does not match its declared column type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("row field '{field}' expected {expected}, received {received}")]
pub struct RowShapeError {
    /// Output field name.
    pub field: String,
    /// Declared column type.
    pub expected: ColumnType,
    /// The offending value, rendered inline.
    pub received: String,
}

/// Ordered output fields of a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultShape {
    fields: Vec<OutputField>,
}

impl ResultShape {
    /// Resolves the output fields of `selection` over `columns`.
    ///
    /// "All columns" yields every column in context order. A column selected
    /// twice yields one field at its first position.
    pub(crate) fn resolve(columns: &[(String, ColumnType)], selection: &Selection) -> Self {
        let type_of = |column: &str| {
            columns
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, ty)| *ty)
        };

        let mut shape = Self::default();
        match selection {
            Selection::All => {
                for (name, ty) in columns {
                    shape.push(name, name, *ty);
                }
            }
            Selection::Columns(selected) => {
                for column in selected {
                    if let Some(ty) = type_of(column) {
                        shape.push(column, column, ty);
                    }
                }
            }
            Selection::Aliased(pairs) => {
                for (alias, column) in pairs {
                    if let Some(ty) = type_of(column) {
                        shape.push(alias, column, ty);
                    }
                }
            }
        }
        shape
    }

    fn push(&mut self, name: &str, column: &str, column_type: ColumnType) {
        if self.field(name).is_none() {
            self.fields.push(OutputField {
                name: name.to_string(),
                column: column.to_string(),
                column_type,
            });
        }
    }

    /// Returns the fields in output order.
    #[must_use]
    pub fn fields(&self) -> &[OutputField] {
        &self.fields
    }

    /// Returns the output field names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Looks up a field by output name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&OutputField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the number of output fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns whether there are no output fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Projects a raw row onto this shape.
    ///
    /// Missing columns become [`SqlValue::Null`].
    ///
    /// # Errors
    ///
    /// Returns [`RowShapeError`] when a non-null value does not conform to
    /// its column type.
    pub fn project(&self, raw: &RawRow) -> Result<Row, RowShapeError> {
        let mut cells = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = raw.get(&field.column).cloned().unwrap_or(SqlValue::Null);
            if !value.is_null() && !value.conforms_to(field.column_type) {
                return Err(RowShapeError {
                    field: field.name.clone(),
                    expected: field.column_type,
                    received: value.to_sql_inline(),
                });
            }
            cells.push((field.name.clone(), value));
        }
        Ok(Row { cells })
    }
}

/// A projected row: output field names to values, in field order.
///
/// Serializes to a flat map of plain values, e.g.
/// `{"id":1,"email":"a@b.c","createdAt":"2024-01-01T00:00:00.000Z"}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, SqlValue)>,
}

impl Row {
    /// Returns the value of an output field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.cells
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Iterates `(field, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns whether the row has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

struct PlainValue<'a>(&'a SqlValue);

impl Serialize for PlainValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            SqlValue::Null => serializer.serialize_unit(),
            SqlValue::Bool(b) => serializer.serialize_bool(*b),
            SqlValue::Int(n) => serializer.serialize_i64(*n),
            SqlValue::Float(f) => serializer.serialize_f64(*f),
            SqlValue::Text(s) => serializer.serialize_str(s),
            SqlValue::Date(d) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, &PlainValue(value))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn context() -> Vec<(String, ColumnType)> {
        vec![
            (String::from("id"), ColumnType::Number),
            (String::from("email"), ColumnType::String),
            (String::from("createdAt"), ColumnType::Date),
        ]
    }

    fn raw(pairs: &[(&str, SqlValue)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_all_columns_in_context_order() {
        let shape = ResultShape::resolve(&context(), &Selection::All);
        assert_eq!(
            shape.names().collect::<Vec<_>>(),
            vec!["id", "email", "createdAt"]
        );
    }

    #[test]
    fn test_duplicates_collapse_first_position() {
        let selection = Selection::Columns(vec![
            String::from("email"),
            String::from("id"),
            String::from("email"),
        ]);
        let shape = ResultShape::resolve(&context(), &selection);
        assert_eq!(shape.names().collect::<Vec<_>>(), vec!["email", "id"]);
    }

    #[test]
    fn test_alias_maps_to_column() {
        let selection = Selection::Aliased(vec![(String::from("userId"), String::from("id"))]);
        let shape = ResultShape::resolve(&context(), &selection);
        assert_eq!(
            shape.fields(),
            &[OutputField {
                name: String::from("userId"),
                column: String::from("id"),
                column_type: ColumnType::Number,
            }]
        );
    }

    #[test]
    fn test_project_fills_missing_with_null() {
        let shape = ResultShape::resolve(&context(), &Selection::All);
        let row = shape.project(&raw(&[("id", SqlValue::Int(7))])).unwrap();
        assert_eq!(row.get("id"), Some(&SqlValue::Int(7)));
        assert_eq!(row.get("email"), Some(&SqlValue::Null));
        assert_eq!(row.len(), 3);
    }

    #[test]
    fn test_project_rejects_wrong_type() {
        let shape = ResultShape::resolve(&context(), &Selection::All);
        let err = shape
            .project(&raw(&[("email", SqlValue::Int(7))]))
            .unwrap_err();
        assert_eq!(
            err,
            RowShapeError {
                field: String::from("email"),
                expected: ColumnType::String,
                received: String::from("7"),
            }
        );
    }

    #[test]
    fn test_row_serializes_in_field_order() {
        let selection = Selection::Aliased(vec![
            (String::from("when"), String::from("createdAt")),
            (String::from("address"), String::from("email")),
        ]);
        let shape = ResultShape::resolve(&context(), &selection);
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let row = shape
            .project(&raw(&[
                ("createdAt", SqlValue::Date(created)),
                ("email", SqlValue::from("a@b.c")),
                ("id", SqlValue::Int(1)),
            ]))
            .unwrap();
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"when":"2024-01-01T00:00:00.000Z","address":"a@b.c"}"#
        );
    }
}
