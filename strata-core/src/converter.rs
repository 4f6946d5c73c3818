use crate::{AsValue, BindType, ColumnMeta, Result, TypedParameter, Value};
use rust_decimal::Decimal;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Coercion between engine values and application values.
pub trait Converter: Send {
    /// Parameter representation of an application value.
    fn to_parameter(&self, value: Value) -> TypedParameter;
    /// Application value of a raw engine value. `declared` is the typed NULL
    /// of the target field when the target declares one.
    fn to_native(&self, raw: Value, column: &ColumnMeta, declared: Option<&Value>) -> Result<Value>;
}

/// Converts according to the declared type of the target, falling back to
/// the declared SQL type of the column, else leaves the value untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConverter;

impl DefaultConverter {
    fn declared_from_column(column: &ColumnMeta) -> Option<Value> {
        let declared = column.declared_type.as_deref()?.to_ascii_uppercase();
        let result = if declared.starts_with("BOOL") {
            Value::Boolean(None)
        } else if declared == "DATE" {
            Value::Date(None)
        } else if declared == "TIME" {
            Value::Time(None)
        } else if declared.starts_with("TIMESTAMP WITH") || declared == "TIMESTAMPTZ" {
            Value::TimestampWithTimezone(None)
        } else if declared.starts_with("TIMESTAMP") || declared == "DATETIME" {
            Value::Timestamp(None)
        } else if declared.starts_with("DECIMAL") || declared.starts_with("NUMERIC") {
            Value::Decimal(None)
        } else if declared == "UUID" {
            Value::Uuid(None)
        } else {
            return None;
        };
        Some(result)
    }
}

impl Converter for DefaultConverter {
    fn to_parameter(&self, value: Value) -> TypedParameter {
        let bind_type = BindType::of(&value);
        TypedParameter::new(value, bind_type)
    }

    fn to_native(&self, raw: Value, column: &ColumnMeta, declared: Option<&Value>) -> Result<Value> {
        let from_column;
        let declared = match declared {
            Some(v) => v,
            None => match Self::declared_from_column(column) {
                Some(v) => {
                    from_column = v;
                    &from_column
                }
                None => return Ok(raw),
            },
        };
        if raw.is_null() {
            return Ok(declared.as_null());
        }
        if raw.same_type(declared) || matches!(declared, Value::Null) {
            return Ok(raw);
        }
        Ok(match declared {
            Value::Boolean(..) => bool::try_from_value(raw)?.as_value(),
            Value::Int32(..) => i32::try_from_value(raw)?.as_value(),
            Value::Int64(..) => i64::try_from_value(raw)?.as_value(),
            Value::Float64(..) => f64::try_from_value(raw)?.as_value(),
            Value::Decimal(..) => Decimal::try_from_value(raw)?.as_value(),
            Value::Varchar(..) => Value::Varchar(Some(raw.to_string())),
            Value::Blob(..) => Box::<[u8]>::try_from_value(raw)?.as_value(),
            Value::Date(..) => Date::try_from_value(raw)?.as_value(),
            Value::Time(..) => Time::try_from_value(raw)?.as_value(),
            Value::Timestamp(..) => PrimitiveDateTime::try_from_value(raw)?.as_value(),
            Value::TimestampWithTimezone(..) => OffsetDateTime::try_from_value(raw)?.as_value(),
            Value::Uuid(..) => Uuid::try_from_value(raw)?.as_value(),
            Value::Null => raw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{Converter, DefaultConverter};
    use crate::{BindType, ColumnMeta, Value};
    use time::macros::datetime;

    #[test]
    fn coerces_to_declared_type() {
        let converter = DefaultConverter;
        let column = ColumnMeta::new("flag");
        assert_eq!(
            converter
                .to_native(Value::Int64(Some(1)), &column, Some(&Value::Boolean(None)))
                .unwrap(),
            Value::Boolean(Some(true))
        );
        assert_eq!(
            converter
                .to_native(
                    Value::Varchar(Some("2020-02-02 02:02:02".into())),
                    &column,
                    Some(&Value::Timestamp(None))
                )
                .unwrap(),
            Value::Timestamp(Some(datetime!(2020-02-02 02:02:02)))
        );
        assert_eq!(
            converter
                .to_native(Value::Int64(Some(5)), &column, None)
                .unwrap(),
            Value::Int64(Some(5))
        );
    }

    #[test]
    fn falls_back_to_column_declared_type() {
        let column = ColumnMeta {
            name: "created".into(),
            declared_type: Some("datetime".into()),
        };
        assert_eq!(
            DefaultConverter
                .to_native(Value::Varchar(Some("2020-02-02 00:00:00".into())), &column, None)
                .unwrap(),
            Value::Timestamp(Some(datetime!(2020-02-02 00:00:00)))
        );
    }

    #[test]
    fn parameters_carry_bind_type() {
        assert_eq!(
            DefaultConverter.to_parameter(Value::Boolean(Some(false))).bind_type(),
            BindType::Boolean
        );
        assert_eq!(
            DefaultConverter.to_parameter(Value::Varchar(None)).bind_type(),
            BindType::Null
        );
    }
}
