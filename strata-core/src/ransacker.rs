use crate::{ConditionFragment, Result, SqlWriter, Value, separated_by};
use std::collections::HashMap;

/// Field name to column name (or qualified expression) substitutions.
pub type Aliases = HashMap<String, String>;

/// Selection criteria for batch operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    /// `key => value` predicates joined with `AND`. A key is a field name with
    /// an optional `__operator` suffix, see [`DefaultRansacker`].
    Fields(Vec<(String, Value)>),
    /// A condition written by hand.
    Condition(ConditionFragment),
}

impl Criteria {
    /// Matches every row.
    pub fn all() -> Self {
        Criteria::Fields(Vec::new())
    }

    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut fields = match self {
            Criteria::Fields(v) => v,
            Criteria::Condition(..) => {
                log::warn!("Criteria::with called on a hand written condition, the condition is replaced");
                Vec::new()
            }
        };
        fields.push((key.into(), value.into()));
        Criteria::Fields(fields)
    }
}

impl From<ConditionFragment> for Criteria {
    fn from(value: ConditionFragment) -> Self {
        Criteria::Condition(value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Criteria {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Criteria::Fields(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Compiles criteria into a condition.
pub trait Ransacker: Send {
    fn build(
        &self,
        writer: &dyn SqlWriter,
        criteria: &Criteria,
        aliases: Option<&Aliases>,
    ) -> Result<ConditionFragment>;
}

const OPERATORS: &[&str] = &["eq", "ne", "lt", "le", "gt", "ge", "like", "null"];

/// Supported suffixes: none (`=`, `IS NULL` for null), `__ne`, `__lt`, `__le`,
/// `__gt`, `__ge`, `__like`, `__null` (boolean value). Any other suffix is part
/// of the field name.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRansacker;

impl Ransacker for DefaultRansacker {
    fn build(
        &self,
        writer: &dyn SqlWriter,
        criteria: &Criteria,
        aliases: Option<&Aliases>,
    ) -> Result<ConditionFragment> {
        let fields = match criteria {
            Criteria::Condition(condition) => return Ok(condition.clone()),
            Criteria::Fields(fields) => fields,
        };
        let mut sql = String::new();
        let mut params = Vec::new();
        separated_by(
            &mut sql,
            fields.iter().enumerate(),
            |out, (i, (key, value))| {
                let (field, operator) = match key.rsplit_once("__") {
                    Some((field, operator)) if OPERATORS.contains(&operator) => (field, operator),
                    _ => (key.as_str(), "eq"),
                };
                match aliases.and_then(|a| a.get(field)) {
                    Some(alias) => out.push_str(alias),
                    None => writer.write_identifier_quoted(out, field),
                }
                let name = format!("r{i}");
                let symbol = match operator {
                    "eq" if value.is_null() => {
                        out.push_str(" IS NULL");
                        return;
                    }
                    "ne" if value.is_null() => {
                        out.push_str(" IS NOT NULL");
                        return;
                    }
                    "null" => {
                        let is_null = !matches!(value, Value::Boolean(Some(false)));
                        out.push_str(if is_null { " IS NULL" } else { " IS NOT NULL" });
                        return;
                    }
                    "ne" => " <> ",
                    "lt" => " < ",
                    "le" => " <= ",
                    "gt" => " > ",
                    "ge" => " >= ",
                    "like" => " LIKE ",
                    _ => " = ",
                };
                out.push_str(symbol);
                writer.write_placeholder(out, &name);
                params.push((name, value.clone()));
            },
            " AND ",
        );
        Ok(params
            .into_iter()
            .fold(ConditionFragment::new(sql), |c, (k, v)| c.with_param(k, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::{Aliases, Criteria, DefaultRansacker, Ransacker};
    use crate::{SqlWriter, Value};

    struct Writer;
    impl SqlWriter for Writer {
        fn as_dyn(&self) -> &dyn SqlWriter {
            self
        }
    }

    #[test]
    fn builds_predicates() {
        let criteria = Criteria::all()
            .with("name__like", "A%")
            .with("age__ge", 18i64)
            .with("deleted_at", Value::Timestamp(None));
        let condition = DefaultRansacker.build(&Writer, &criteria, None).unwrap();
        assert_eq!(
            condition.sql(),
            r#""name" LIKE :r0 AND "age" >= :r1 AND "deleted_at" IS NULL"#
        );
        assert_eq!(condition.params().len(), 2);
    }

    #[test]
    fn aliases_and_field_names() {
        let mut aliases = Aliases::new();
        aliases.insert("owner".into(), "u.name".into());
        let condition = DefaultRansacker
            .build(&Writer, &Criteria::all().with("owner", "Bob"), Some(&aliases))
            .unwrap();
        assert_eq!(condition.sql(), "u.name = :r0");
        let criteria = Criteria::all()
            .with("created__by", "Bob")
            .with("a__b__gt", 1i64)
            .with("x__between", 2i64);
        let condition = DefaultRansacker.build(&Writer, &criteria, None).unwrap();
        assert_eq!(
            condition.sql(),
            r#""created__by" = :r0 AND "a__b" > :r1 AND "x__between" = :r2"#
        );
        assert!(
            DefaultRansacker
                .build(&Writer, &Criteria::all(), None)
                .unwrap()
                .is_empty()
        );
    }
}
