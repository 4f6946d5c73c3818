use crate::Value;
use time::{OffsetDateTime, PrimitiveDateTime};

/// Source of "now" for timestamps and defaults.
///
/// Persistence calls read the clock once and reuse that instant for every
/// value they compute.
pub trait Clock: Send {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// `now` shaped as the declared type of a timestamp column.
pub fn timestamp_value(declared: &Value, now: OffsetDateTime) -> Value {
    match declared {
        Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(Some(now)),
        Value::Date(..) => Value::Date(Some(now.date())),
        Value::Time(..) => Value::Time(Some(now.time())),
        Value::Int64(..) => Value::Int64(Some(now.unix_timestamp())),
        Value::Varchar(..) => Value::Varchar(Some(crate::format_timestamp(
            &PrimitiveDateTime::new(now.date(), now.time()),
        ))),
        _ => Value::Timestamp(Some(PrimitiveDateTime::new(now.date(), now.time()))),
    }
}

#[cfg(test)]
mod tests {
    use super::timestamp_value;
    use crate::Value;
    use time::macros::{datetime, offset};

    #[test]
    fn shapes_now() {
        let now = datetime!(2024-05-06 07:08:09).assume_offset(offset!(UTC));
        assert_eq!(
            timestamp_value(&Value::Timestamp(None), now),
            Value::Timestamp(Some(datetime!(2024-05-06 07:08:09)))
        );
        assert_eq!(
            timestamp_value(&Value::Int64(None), now),
            Value::Int64(Some(now.unix_timestamp()))
        );
        assert_eq!(
            timestamp_value(&Value::Varchar(None), now),
            Value::Varchar(Some("2024-05-06 07:08:09".into()))
        );
    }
}
