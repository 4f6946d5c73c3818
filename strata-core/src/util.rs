use crate::{Error, Result};
use std::borrow::Cow;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::well_known::Rfc3339,
    macros::format_description,
};

const MAX_PRINTABLE: usize = 497;

/// Shortens long text (queries, values) before it goes into messages.
pub fn truncate(value: &str) -> Cow<'_, str> {
    if value.len() <= MAX_PRINTABLE {
        return Cow::Borrowed(value);
    }
    let mut end = MAX_PRINTABLE;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!("{}...", value[..end].trim_end()))
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        $crate::truncate(&$query)
    };
}

pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut first = true;
    for v in values {
        if !first {
            out.push_str(separator);
        }
        first = false;
        f(out, v);
    }
}

pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn format_date(value: &Date) -> String {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

pub fn format_time(value: &Time) -> String {
    let result = if value.nanosecond() == 0 {
        value.format(format_description!("[hour]:[minute]:[second]"))
    } else {
        value.format(format_description!("[hour]:[minute]:[second].[subsecond]"))
    };
    result.unwrap_or_default()
}

pub fn format_timestamp(value: &PrimitiveDateTime) -> String {
    format!("{} {}", format_date(&value.date()), format_time(&value.time()))
}

pub fn format_timestamp_with_timezone(value: &OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_default()
}

pub fn parse_date(value: &str) -> Result<Date> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|e| Error::new(e).context(format!("Cannot parse `{}` as a date", truncate(value))))
}

pub fn parse_time(value: &str) -> Result<Time> {
    Time::parse(
        value,
        format_description!("[hour]:[minute]:[second][optional [.[subsecond]]]"),
    )
    .map_err(|e| Error::new(e).context(format!("Cannot parse `{}` as a time", truncate(value))))
}

pub fn parse_timestamp(value: &str) -> Result<PrimitiveDateTime> {
    let separator = if value.contains('T') { "T" } else { " " };
    let Some((date, time)) = value.split_once(separator) else {
        return Err(Error::msg(format!(
            "Cannot parse `{}` as a timestamp",
            truncate(value)
        )));
    };
    Ok(PrimitiveDateTime::new(parse_date(date)?, parse_time(time)?))
}

pub fn parse_timestamp_with_timezone(value: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| {
        Error::new(e).context(format!(
            "Cannot parse `{}` as a timestamp with time zone",
            truncate(value)
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, time};

    #[test]
    fn truncate_respects_char_boundaries() {
        let long = "è".repeat(400);
        let result = truncate(&long);
        assert!(result.ends_with("..."));
        assert!(result.len() < long.len());
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn temporal_text_round_trip() {
        let value = datetime!(2025-01-31 23:59:01.25);
        assert_eq!(format_timestamp(&value), "2025-01-31 23:59:01.25");
        assert_eq!(parse_timestamp("2025-01-31 23:59:01.25").unwrap(), value);
        assert_eq!(parse_timestamp("2025-01-31T23:59:01.25").unwrap(), value);
        assert_eq!(format_time(&time!(08:00)), "08:00:00");
    }
}
