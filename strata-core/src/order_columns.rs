use crate::{Error, Result, SqlWriter, separated_by};
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn parse(value: &str) -> Result<Direction> {
        match value.trim().to_ascii_uppercase().as_str() {
            "" | "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            _ => Err(Error::msg(format!(
                "Unknown ordering direction `{}`, expected ASC or DESC",
                value
            ))),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered `column => direction` mapping used for `ORDER BY`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderColumns {
    columns: Vec<(String, Direction)>,
}

impl OrderColumns {
    /// Builds from `(column, direction)` pairs, directions in any case.
    /// A column repeated later overrides its earlier direction in place.
    pub fn new<C, D, I>(columns: I) -> Result<Self>
    where
        C: Into<String>,
        D: AsRef<str>,
        I: IntoIterator<Item = (C, D)>,
    {
        let mut result = Self::default();
        for (column, direction) in columns {
            result.push(column, Direction::parse(direction.as_ref())?);
        }
        Ok(result)
    }

    pub fn push(&mut self, column: impl Into<String>, direction: Direction) -> &mut Self {
        let column = column.into();
        match self.columns.iter_mut().find(|(c, _)| *c == column) {
            Some(existing) => existing.1 = direction,
            None => self.columns.push((column, direction)),
        }
        self
    }

    /// `None` for missing or empty input, the constructed mapping otherwise.
    pub fn value_of<T: IntoOrderColumns>(value: Option<T>) -> Result<Option<OrderColumns>> {
        let Some(value) = value else {
            return Ok(None);
        };
        let result = value.into_order_columns()?;
        Ok(if result.is_empty() { None } else { Some(result) })
    }

    /// Every direction flipped.
    pub fn reverse(&self) -> OrderColumns {
        OrderColumns {
            columns: self
                .columns
                .iter()
                .map(|(c, d)| (c.clone(), d.reverse()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<Direction> {
        self.columns
            .iter()
            .find_map(|(c, d)| (c == column).then_some(*d))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Direction)> {
        self.columns.iter().map(|(c, d)| (c.as_str(), *d))
    }

    /// Writes `"a" ASC, "b" DESC` using the dialect identifier quoting.
    pub fn write_query(&self, writer: &dyn SqlWriter, out: &mut String) {
        separated_by(
            out,
            self.iter(),
            |out, (column, direction)| {
                writer.write_identifier_quoted(out, column);
                out.push(' ');
                out.push_str(direction.as_str());
            },
            ", ",
        );
    }
}

/// Inputs accepted by [`OrderColumns::value_of`].
pub trait IntoOrderColumns {
    fn into_order_columns(self) -> Result<OrderColumns>;
}

impl IntoOrderColumns for OrderColumns {
    fn into_order_columns(self) -> Result<OrderColumns> {
        Ok(self)
    }
}

impl IntoOrderColumns for &OrderColumns {
    fn into_order_columns(self) -> Result<OrderColumns> {
        Ok(self.clone())
    }
}

impl<C: Into<String> + Clone, D: AsRef<str>> IntoOrderColumns for &[(C, D)] {
    fn into_order_columns(self) -> Result<OrderColumns> {
        OrderColumns::new(self.iter().map(|(c, d)| (c.clone(), d)))
    }
}

impl<C: Into<String>, D: AsRef<str>> IntoOrderColumns for Vec<(C, D)> {
    fn into_order_columns(self) -> Result<OrderColumns> {
        OrderColumns::new(self)
    }
}

impl<C: Into<String>, D: AsRef<str>, const N: usize> IntoOrderColumns for [(C, D); N] {
    fn into_order_columns(self) -> Result<OrderColumns> {
        OrderColumns::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{Direction, OrderColumns};

    #[test]
    fn normalizes_and_reverses() {
        let order = OrderColumns::new([("name", "asc"), ("age", "Desc")]).unwrap();
        assert_eq!(order.get("name"), Some(Direction::Asc));
        assert_eq!(order.get("age"), Some(Direction::Desc));
        let reversed = order.reverse();
        assert_eq!(reversed.get("name"), Some(Direction::Desc));
        assert_eq!(reversed.get("age"), Some(Direction::Asc));
        assert_eq!(reversed.reverse(), order);
    }

    #[test]
    fn value_of_empty_is_none() {
        assert_eq!(OrderColumns::value_of::<OrderColumns>(None).unwrap(), None);
        let empty: Vec<(String, String)> = Vec::new();
        assert_eq!(OrderColumns::value_of(Some(empty)).unwrap(), None);
        let order = OrderColumns::new([("id", "DESC")]).unwrap();
        assert_eq!(
            OrderColumns::value_of(Some(&order)).unwrap(),
            Some(order.clone())
        );
    }

    #[test]
    fn rejects_unknown_direction() {
        assert!(OrderColumns::new([("id", "sideways")]).is_err());
    }
}
