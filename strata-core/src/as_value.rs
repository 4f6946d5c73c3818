use crate::{
    Error, Result, Value, parse_date, parse_time, parse_timestamp,
    parse_timestamp_with_timezone, truncate_long,
};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::{any, borrow::Cow, str::FromStr};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// Entity fields go through this trait in both directions: `as_value` when a
/// row is written, `try_from_value` when a row is hydrated. `as_empty_value`
/// is the typed NULL that acts as the declared type of a column.
///
/// # Examples
/// ```rust
/// use strata_core::{AsValue, Value};
/// let v = 42i64.as_value();
/// assert!(matches!(v, Value::Int64(Some(42))));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The NULL variant for this type.
    fn as_empty_value() -> Value;
    /// Owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Convert back from a [`Value`], accepting the canonical variant and the
    /// lossless alternatives a loosely typed engine may return.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn mismatch<T>(value: &Value) -> Error {
    Error::msg(format!(
        "Cannot convert {} value `{}` into {}",
        value.type_name(),
        truncate_long!(value.to_string()),
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value {
    ($source:ty, $destination:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $destination(None)
            }
            fn as_value(self) -> Value {
                $destination(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $destination(Some(v)) => Ok(v.into()),
                    $($pat_rest => $expr_rest,)*
                    #[allow(unreachable_patterns)]
                    v => Err(mismatch::<Self>(&v)),
                }
            }
        }
    };
}

impl_as_value!(
    bool,
    Value::Boolean,
    Value::Int32(Some(v)) => Ok(v != 0),
    Value::Int64(Some(v)) => Ok(v != 0),
);
impl_as_value!(
    i32,
    Value::Int32,
    Value::Int64(Some(v)) => i32::try_from(v).map_err(|_| mismatch::<i32>(&Value::Int64(Some(v)))),
    Value::Boolean(Some(v)) => Ok(v as i32),
);
impl_as_value!(
    i64,
    Value::Int64,
    Value::Int32(Some(v)) => Ok(v as i64),
    Value::Boolean(Some(v)) => Ok(v as i64),
);
impl_as_value!(
    f64,
    Value::Float64,
    Value::Int32(Some(v)) => Ok(v as f64),
    Value::Int64(Some(v)) => Ok(v as f64),
);
impl_as_value!(
    Decimal,
    Value::Decimal,
    Value::Int32(Some(v)) => Ok(Decimal::from(v)),
    Value::Int64(Some(v)) => Ok(Decimal::from(v)),
    Value::Float64(Some(v)) => Decimal::from_f64(v).ok_or_else(|| mismatch::<Decimal>(&Value::Float64(Some(v)))),
    Value::Varchar(Some(v)) => Decimal::from_str(&v).map_err(Error::new),
);
impl_as_value!(String, Value::Varchar);
impl_as_value!(
    Box<[u8]>,
    Value::Blob,
    Value::Varchar(Some(v)) => Ok(v.into_bytes().into_boxed_slice()),
);
impl_as_value!(
    Date,
    Value::Date,
    Value::Varchar(Some(v)) => parse_date(&v),
);
impl_as_value!(
    Time,
    Value::Time,
    Value::Varchar(Some(v)) => parse_time(&v),
);
impl_as_value!(
    PrimitiveDateTime,
    Value::Timestamp,
    Value::Varchar(Some(v)) => parse_timestamp(&v),
);
impl_as_value!(
    OffsetDateTime,
    Value::TimestampWithTimezone,
    Value::Varchar(Some(v)) => parse_timestamp_with_timezone(&v),
);
impl_as_value!(
    Uuid,
    Value::Uuid,
    Value::Varchar(Some(v)) => Uuid::parse_str(&v).map_err(Error::new),
    Value::Blob(Some(v)) => Uuid::from_slice(&v).map_err(Error::new),
);

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        <Box<[u8]> as AsValue>::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Cow<'static, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into_owned()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        String::try_from_value(value).map(Into::into)
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

impl<T: AsValue> AsValue for Box<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        (*self).as_value()
    }
    fn try_from_value(value: Value) -> Result<Self> {
        T::try_from_value(value).map(Box::new)
    }
}

#[cfg(test)]
mod tests {
    use crate::{AsValue, Value};
    use time::macros::datetime;

    #[test]
    fn loose_engine_values_convert() {
        assert!(bool::try_from_value(Value::Int64(Some(1))).unwrap());
        assert_eq!(i32::try_from_value(Value::Int64(Some(7))).unwrap(), 7);
        assert!(i32::try_from_value(Value::Int64(Some(i64::MAX))).is_err());
        assert_eq!(
            time::PrimitiveDateTime::try_from_value(Value::Varchar(Some(
                "2024-03-01 10:20:30".into()
            )))
            .unwrap(),
            datetime!(2024-03-01 10:20:30)
        );
    }

    #[test]
    fn null_into_option() {
        assert_eq!(Option::<i64>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i64>::as_empty_value(), Value::Int64(None));
        assert!(i64::try_from_value(Value::Int64(None)).is_err());
    }
}
