//! Generic row-to-record mapping.
//!
//! One engine entered once per rowset: discover columns, resolve each column
//! to a destination field through the active [`Naming`] convention, then
//! consume rows into the requested destination shape. The legal shapes are
//! separately-typed entry points — single record (strict), list of records,
//! list of boxed records, and generic ordered maps (dynamic or textual).
//!
//! A result column with no matching destination field fails the whole fetch;
//! silent data loss is considered worse than a loud failure. The reverse is
//! strict too: a destination field no selected column maps to is not
//! zero-filled — make it `Option` or give it `#[serde(default)]` when
//! fetching a column subset.
//!
//! The destination's field table comes from serde: a probe deserializer
//! captures the `fields` slice the derived `Deserialize` impl passes to
//! `deserialize_struct`, so no per-entity registration is needed.

use crate::builder::FieldMap;
use crate::driver::{Column, RawValue, Rows, TypeTag};
use crate::error::{Error, Result};
use crate::naming::Naming;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A row as raw text: column name -> wire text, `None` for SQL NULL.
pub type TextRow = BTreeMap<String, Option<String>>;

/// Recover the serde field list of a struct record type.
///
/// Fails with [`Error::UnsupportedShape`] when `T` does not deserialize as a
/// struct (tuples, maps, scalars, sequences).
pub(crate) fn record_fields<T: DeserializeOwned>() -> Result<&'static [&'static str]> {
    struct Probe<'a>(&'a mut Option<&'static [&'static str]>);

    impl<'de> serde::de::Deserializer<'de> for Probe<'_> {
        type Error = serde::de::value::Error;

        fn deserialize_struct<V>(
            self,
            _name: &'static str,
            fields: &'static [&'static str],
            _visitor: V,
        ) -> std::result::Result<V::Value, Self::Error>
        where
            V: serde::de::Visitor<'de>,
        {
            *self.0 = Some(fields);
            Err(serde::de::Error::custom("record field probe"))
        }

        fn deserialize_any<V>(self, _visitor: V) -> std::result::Result<V::Value, Self::Error>
        where
            V: serde::de::Visitor<'de>,
        {
            Err(serde::de::Error::custom("record field probe"))
        }

        serde::forward_to_deserialize_any! {
            bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
            bytes byte_buf option unit unit_struct newtype_struct seq tuple
            tuple_struct map enum identifier ignored_any
        }
    }

    let mut fields = None;
    let _ = T::deserialize(Probe(&mut fields));
    fields.ok_or_else(|| {
        Error::UnsupportedShape(format!(
            "destination '{}' is not a struct record",
            std::any::type_name::<T>()
        ))
    })
}

/// Build the column-index -> field lookup for a destination record type.
///
/// Each column resolves through `column_to_field`, falling back to the
/// reverse direction (`field_to_column(field) == column`) so that both
/// snake_case Rust structs and Pascal-renamed ones resolve under the default
/// convention. Any unresolved column is a hard mapping error.
fn resolve(
    columns: &[Column],
    fields: &'static [&'static str],
    naming: &Naming,
) -> Result<Vec<&'static str>> {
    let mut reverse: BTreeMap<String, &'static str> = BTreeMap::new();
    for field in fields {
        reverse.insert(naming.field_to_column(field), field);
    }
    let mut resolved = Vec::with_capacity(columns.len());
    for column in columns {
        let candidate = naming.column_to_field(&column.name);
        let found = fields
            .iter()
            .copied()
            .find(|field| *field == candidate)
            .or_else(|| reverse.get(column.name.as_str()).copied());
        match found {
            Some(field) => resolved.push(field),
            None => {
                return Err(Error::mapping(
                    &column.name,
                    "no matching record field",
                ));
            }
        }
    }
    Ok(resolved)
}

/// Decode a raw driver scalar using the column's reported type family.
///
/// Byte-strings tagged decimal/float are parsed as floating point; other
/// byte-strings become text. NULL maps to JSON null, the explicit absent
/// marker — `Option` destination fields receive `None`, and a NULL into a
/// non-nullable field surfaces as a mapping error rather than a silent zero.
fn decode(column: &Column, raw: RawValue) -> Result<Value> {
    let value = match raw {
        RawValue::Null => Value::Null,
        RawValue::Int(v) => Value::from(v),
        RawValue::UInt(v) => Value::from(v),
        RawValue::Double(v) => float_value(v),
        RawValue::Bytes(bytes) => {
            let text = String::from_utf8(bytes)
                .map_err(|e| Error::mapping(&column.name, format!("invalid UTF-8: {e}")))?;
            match column.type_tag {
                TypeTag::Decimal | TypeTag::Float => {
                    let parsed: f64 = text.parse().map_err(|e| {
                        Error::mapping(
                            &column.name,
                            format!("cannot parse '{text}' as float: {e}"),
                        )
                    })?;
                    float_value(parsed)
                }
                _ => Value::String(text),
            }
        }
    };
    Ok(value)
}

fn float_value(v: f64) -> Value {
    // non-finite floats have no JSON representation
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

fn record_from_row<T: DeserializeOwned>(
    columns: &[Column],
    resolved: &[&'static str],
    raw: Vec<RawValue>,
) -> Result<T> {
    let mut object = Map::with_capacity(columns.len());
    for ((column, field), value) in columns.iter().zip(resolved).zip(raw) {
        object.insert((*field).to_string(), decode(column, value)?);
    }
    serde_json::from_value(Value::Object(object))
        .map_err(|e| Error::mapping(std::any::type_name::<T>(), e.to_string()))
}

/// Strict single-record fetch: zero rows is [`Error::NoRows`].
pub(crate) fn fetch_one<T: DeserializeOwned>(rows: &mut dyn Rows, naming: &Naming) -> Result<T> {
    match fetch_first(rows, naming)? {
        Some(record) => Ok(record),
        None => Err(Error::NoRows),
    }
}

/// Lenient single-record fetch: zero rows is `None`, not an error.
///
/// Only the selected columns are bound. A destination field no column maps
/// to is never zero-filled: it must be `Option` or carry `#[serde(default)]`,
/// otherwise the fetch fails with a mapping error naming the field.
pub(crate) fn fetch_first<T: DeserializeOwned>(
    rows: &mut dyn Rows,
    naming: &Naming,
) -> Result<Option<T>> {
    let fields = record_fields::<T>()?;
    let columns = rows.columns()?;
    let resolved = resolve(&columns, fields, naming)?;
    match rows.next_row()? {
        Some(raw) => Ok(Some(record_from_row(&columns, &resolved, raw)?)),
        None => Ok(None),
    }
}

/// List-of-records fetch: an empty rowset yields an empty vector.
pub(crate) fn fetch_all<T: DeserializeOwned>(
    rows: &mut dyn Rows,
    naming: &Naming,
) -> Result<Vec<T>> {
    let fields = record_fields::<T>()?;
    let columns = rows.columns()?;
    let resolved = resolve(&columns, fields, naming)?;
    let mut out = Vec::new();
    while let Some(raw) = rows.next_row()? {
        out.push(record_from_row(&columns, &resolved, raw)?);
    }
    Ok(out)
}

/// List-of-boxed-records fetch, for callers keeping records behind pointers.
pub(crate) fn fetch_all_boxed<T: DeserializeOwned>(
    rows: &mut dyn Rows,
    naming: &Naming,
) -> Result<Vec<Box<T>>> {
    Ok(fetch_all::<T>(rows, naming)?.into_iter().map(Box::new).collect())
}

fn row_to_map(columns: &[Column], raw: Vec<RawValue>) -> Result<FieldMap> {
    let mut map = FieldMap::new();
    for (column, value) in columns.iter().zip(raw) {
        map.insert(column.name.clone(), decode(column, value)?);
    }
    Ok(map)
}

/// First row as a generic map keyed by raw column name; `None` when empty.
pub(crate) fn first_map(rows: &mut dyn Rows) -> Result<Option<FieldMap>> {
    let columns = rows.columns()?;
    match rows.next_row()? {
        Some(raw) => Ok(Some(row_to_map(&columns, raw)?)),
        None => Ok(None),
    }
}

/// Every row as a generic map keyed by raw column name.
pub(crate) fn all_maps(rows: &mut dyn Rows) -> Result<Vec<FieldMap>> {
    let columns = rows.columns()?;
    let mut all = Vec::new();
    while let Some(raw) = rows.next_row()? {
        all.push(row_to_map(&columns, raw)?);
    }
    Ok(all)
}

fn raw_to_text(column: &Column, raw: RawValue) -> Result<Option<String>> {
    Ok(match raw {
        RawValue::Null => None,
        RawValue::Int(v) => Some(v.to_string()),
        RawValue::UInt(v) => Some(v.to_string()),
        RawValue::Double(v) => Some(v.to_string()),
        RawValue::Bytes(bytes) => Some(
            String::from_utf8(bytes)
                .map_err(|e| Error::mapping(&column.name, format!("invalid UTF-8: {e}")))?,
        ),
    })
}

fn row_to_text(columns: &[Column], raw: Vec<RawValue>) -> Result<TextRow> {
    let mut map = TextRow::new();
    for (column, value) in columns.iter().zip(raw) {
        map.insert(column.name.clone(), raw_to_text(column, value)?);
    }
    Ok(map)
}

/// First row preserving wire text; `None` when empty.
pub(crate) fn first_text(rows: &mut dyn Rows) -> Result<Option<TextRow>> {
    let columns = rows.columns()?;
    match rows.next_row()? {
        Some(raw) => Ok(Some(row_to_text(&columns, raw)?)),
        None => Ok(None),
    }
}

/// Every row preserving wire text.
pub(crate) fn all_text(rows: &mut dyn Rows) -> Result<Vec<TextRow>> {
    let columns = rows.columns()?;
    let mut all = Vec::new();
    while let Some(raw) = rows.next_row()? {
        all.push(row_to_text(&columns, raw)?);
    }
    Ok(all)
}

fn scan_i64(column: &Column, raw: RawValue) -> Result<i64> {
    match raw {
        RawValue::Null => Ok(0),
        RawValue::Int(v) => Ok(v),
        RawValue::UInt(v) => i64::try_from(v).map_err(|_| {
            Error::mapping(&column.name, format!("unsigned value {v} overflows i64"))
        }),
        RawValue::Bytes(bytes) => {
            let text = String::from_utf8(bytes)
                .map_err(|e| Error::mapping(&column.name, format!("invalid UTF-8: {e}")))?;
            text.trim().parse().map_err(|e| {
                Error::mapping(&column.name, format!("cannot parse '{text}' as integer: {e}"))
            })
        }
        RawValue::Double(_) => Err(Error::mapping(&column.name, "expected an integer column")),
    }
}

fn scan_f64(column: &Column, raw: RawValue) -> Result<f64> {
    match raw {
        RawValue::Null => Ok(0.0),
        RawValue::Int(v) => Ok(v as f64),
        RawValue::UInt(v) => Ok(v as f64),
        RawValue::Double(v) => Ok(v),
        RawValue::Bytes(bytes) => {
            let text = String::from_utf8(bytes)
                .map_err(|e| Error::mapping(&column.name, format!("invalid UTF-8: {e}")))?;
            text.trim().parse().map_err(|e| {
                Error::mapping(&column.name, format!("cannot parse '{text}' as float: {e}"))
            })
        }
    }
}

/// First row's first column as an integer; no row or NULL is 0.
pub(crate) fn first_i64(rows: &mut dyn Rows) -> Result<i64> {
    let columns = rows.columns()?;
    match rows.next_row()? {
        Some(raw) => match (columns.first(), raw.into_iter().next()) {
            (Some(column), Some(value)) => scan_i64(column, value),
            _ => Ok(0),
        },
        None => Ok(0),
    }
}

/// First row's first column as a float; no row or NULL is 0.0.
pub(crate) fn first_f64(rows: &mut dyn Rows) -> Result<f64> {
    let columns = rows.columns()?;
    match rows.next_row()? {
        Some(raw) => match (columns.first(), raw.into_iter().next()) {
            (Some(column), Some(value)) => scan_f64(column, value),
            _ => Ok(0.0),
        },
        None => Ok(0.0),
    }
}

/// Whether the rowset contains at least one row.
pub(crate) fn has_row(rows: &mut dyn Rows) -> Result<bool> {
    Ok(rows.next_row()?.is_some())
}
