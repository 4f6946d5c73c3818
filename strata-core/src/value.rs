use rust_decimal::Decimal;
use std::fmt::{self, Display};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed cell exchanged with the database.
///
/// Every variant carries an `Option` payload: `Value::Int64(None)` is a NULL
/// that still remembers it is an integer, which is how entity columns
/// declare their type to the [`Converter`](crate::Converter).
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            _ => self.is_null() && other.is_null(),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            Value::Null
                | Value::Boolean(None)
                | Value::Int32(None)
                | Value::Int64(None)
                | Value::Float64(None)
                | Value::Decimal(None)
                | Value::Varchar(None)
                | Value::Blob(None)
                | Value::Date(None)
                | Value::Time(None)
                | Value::Timestamp(None)
                | Value::TimestampWithTimezone(None)
                | Value::Uuid(None)
        )
    }

    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    /// The typed NULL of the same variant.
    pub fn as_null(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(..) => Value::Decimal(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Blob(..) => Value::Blob(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(None),
            Value::Uuid(..) => Value::Uuid(None),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(..) => "BOOLEAN",
            Value::Int32(..) => "INTEGER",
            Value::Int64(..) => "BIGINT",
            Value::Float64(..) => "DOUBLE",
            Value::Decimal(..) => "DECIMAL",
            Value::Varchar(..) => "VARCHAR",
            Value::Blob(..) => "BLOB",
            Value::Date(..) => "DATE",
            Value::Time(..) => "TIME",
            Value::Timestamp(..) => "TIMESTAMP",
            Value::TimestampWithTimezone(..) => "TIMESTAMP WITH TIME ZONE",
            Value::Uuid(..) => "UUID",
        }
    }
}

/// Text form used when a value is bound as a string parameter.
impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            v if v.is_null() => Ok(()),
            Value::Boolean(Some(v)) => write!(f, "{}", *v as u8),
            Value::Int32(Some(v)) => write!(f, "{v}"),
            Value::Int64(Some(v)) => write!(f, "{v}"),
            Value::Float64(Some(v)) => write!(f, "{v}"),
            Value::Decimal(Some(v)) => write!(f, "{v}"),
            Value::Varchar(Some(v)) => f.write_str(v),
            Value::Blob(Some(v)) => f.write_str(&hex::encode_upper(v)),
            Value::Date(Some(v)) => f.write_str(&crate::format_date(v)),
            Value::Time(Some(v)) => f.write_str(&crate::format_time(v)),
            Value::Timestamp(Some(v)) => f.write_str(&crate::format_timestamp(v)),
            Value::TimestampWithTimezone(Some(v)) => {
                f.write_str(&crate::format_timestamp_with_timezone(v))
            }
            Value::Uuid(Some(v)) => write!(f, "{v}"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Value;

    #[test]
    fn typed_nulls_compare_equal() {
        assert_eq!(Value::Int64(None), Value::Null);
        assert_eq!(Value::Varchar(None), Value::Int32(None));
        assert_ne!(Value::Int64(Some(1)), Value::Int64(None));
        assert_ne!(Value::Int64(Some(1)), Value::Int32(Some(1)));
    }

    #[test]
    fn display_is_the_bound_text() {
        assert_eq!(Value::Boolean(Some(true)).to_string(), "1");
        assert_eq!(Value::Varchar(Some("abc".into())).to_string(), "abc");
        assert_eq!(Value::Null.to_string(), "");
    }
}
