use rusqlite::types::ValueRef;
use strata_core::{Context, Result, Value};

/// Engine value, untyped beyond the storage class. Conversion to the declared
/// type happens in the converter.
pub(crate) fn extract_value(value: ValueRef<'_>) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int64(Some(v)),
        ValueRef::Real(v) => Value::Float64(Some(v)),
        ValueRef::Text(v) => Value::Varchar(Some(
            String::from_utf8(v.to_vec()).context("Text column is not valid UTF-8")?,
        )),
        ValueRef::Blob(v) => Value::Blob(Some(v.into())),
    })
}
