use crate::{BindType, Error, Result, SqlWriter, TypedParameter, Value, is_identifier_char};
use std::{
    collections::{BTreeMap, btree_map::Entry},
    fmt::Write,
};

/// Named parameters, keys without the leading `:`.
pub type Params = BTreeMap<String, TypedParameter>;

/// Marks emulated statements so nobody mistakes them for executable SQL.
pub const EMULATED_PREFIX: &str = "/* emulated */ ";

fn merge_params(into: &mut Params, from: Params) -> Result<()> {
    for (name, value) in from {
        match into.entry(name) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(entry) => {
                return Err(Error::msg(format!(
                    "Parameter `:{}` is defined more than once",
                    entry.key()
                )));
            }
        }
    }
    Ok(())
}

/// A boolean SQL expression and the parameters it references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionFragment {
    sql: String,
    params: Params,
}

impl ConditionFragment {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Params::new(),
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .insert(name.into(), TypedParameter::from(value.into()));
        self
    }

    pub fn with_typed_param(mut self, name: impl Into<String>, value: TypedParameter) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// `""` when empty, `" WHERE <sql>"` otherwise.
    pub fn where_clause(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.sql)
        }
    }

    /// Conjunction of both conditions. Parameter names must not clash.
    pub fn and(self, other: ConditionFragment) -> Result<ConditionFragment> {
        if other.is_empty() {
            let mut result = self;
            merge_params(&mut result.params, other.params)?;
            return Ok(result);
        }
        if self.is_empty() {
            let mut result = other;
            merge_params(&mut result.params, self.params)?;
            return Ok(result);
        }
        let mut params = self.params;
        merge_params(&mut params, other.params)?;
        Ok(ConditionFragment {
            sql: format!("({}) AND ({})", self.sql, other.sql),
            params,
        })
    }

    pub fn into_parts(self) -> (String, Params) {
        (self.sql, self.params)
    }
}

/// A whole (or partial) statement with its parameters.
///
/// Appends go through a [`SqlWriter`] so that the resulting text follows the
/// dialect of the connection that will run it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFragment {
    sql: String,
    params: Params,
}

impl QueryFragment {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Params::new(),
        }
    }

    pub fn from_parts(sql: String, params: Params) -> Self {
        Self { sql, params }
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .insert(name.into(), TypedParameter::from(value.into()));
        self
    }

    pub fn with_typed_param(mut self, name: impl Into<String>, value: TypedParameter) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    pub fn into_parts(self) -> (String, Params) {
        (self.sql, self.params)
    }

    /// `""` when empty, `" WHERE <sql>"` otherwise.
    pub fn as_where(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.sql)
        }
    }

    pub fn append_where(
        mut self,
        writer: &dyn SqlWriter,
        condition: ConditionFragment,
    ) -> Result<Self> {
        let (sql, params) = condition.into_parts();
        writer.write_where(&mut self.sql, &sql);
        merge_params(&mut self.params, params)?;
        Ok(self)
    }

    pub fn append_limit_offset(
        mut self,
        writer: &dyn SqlWriter,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Self {
        writer.write_limit_offset(&mut self.sql, limit, offset);
        self
    }

    pub fn append_for_update(mut self, writer: &dyn SqlWriter) -> Self {
        writer.write_for_update(&mut self.sql);
        self
    }

    /// Human readable approximation of the statement, for logs and error
    /// messages only. Never execute the result.
    pub fn emulate(&self, writer: &dyn SqlWriter) -> String {
        emulate(writer, &self.sql, &self.params)
    }
}

impl From<&str> for QueryFragment {
    fn from(value: &str) -> Self {
        QueryFragment::new(value)
    }
}

impl From<String> for QueryFragment {
    fn from(value: String) -> Self {
        QueryFragment::new(value)
    }
}

impl From<ConditionFragment> for QueryFragment {
    fn from(value: ConditionFragment) -> Self {
        let (sql, params) = value.into_parts();
        QueryFragment { sql, params }
    }
}

/// Replaces every `:name` placeholder matching a known parameter with its
/// literal. Large objects are replaced by their length.
pub fn emulate(writer: &dyn SqlWriter, sql: &str, params: &Params) -> String {
    let mut out = String::with_capacity(EMULATED_PREFIX.len() + sql.len() + params.len() * 8);
    out.push_str(EMULATED_PREFIX);
    let mut rest = sql;
    while let Some(position) = rest.find(':') {
        out.push_str(&rest[..position]);
        let after = &rest[position + 1..];
        let preceded_by_colon = out.ends_with(':');
        let len = after
            .char_indices()
            .find(|(_, c)| !is_identifier_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(after.len());
        let name = &after[..len];
        match params.get(name) {
            Some(value) if !preceded_by_colon && !name.is_empty() => {
                if value.bind_type() == BindType::LargeObject {
                    let size = match value.value() {
                        Value::Blob(Some(v)) => v.len(),
                        v => v.to_string().len(),
                    };
                    let _ = write!(out, "'(lob {} bytes)'", size);
                } else {
                    writer.write_parameter(&mut out, value);
                }
            }
            _ => {
                out.push(':');
                out.push_str(name);
            }
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::{ConditionFragment, EMULATED_PREFIX, QueryFragment};
    use crate::{SqlWriter, Value};

    struct Writer;
    impl SqlWriter for Writer {
        fn as_dyn(&self) -> &dyn SqlWriter {
            self
        }
    }

    #[test]
    fn empty_condition_has_no_where() {
        assert_eq!(ConditionFragment::default().where_clause(), "");
        assert_eq!(
            ConditionFragment::new("a = :a").where_clause(),
            " WHERE a = :a"
        );
        assert_eq!(QueryFragment::new("  ").as_where(), "");
    }

    #[test]
    fn and_merges_parameters() {
        let condition = ConditionFragment::new("a = :a")
            .with_param("a", 1i64)
            .and(ConditionFragment::new("b = :b").with_param("b", "x"))
            .unwrap();
        assert_eq!(condition.sql(), "(a = :a) AND (b = :b)");
        assert_eq!(condition.params().len(), 2);
        let clash = ConditionFragment::new("a = :a")
            .with_param("a", 1i64)
            .and(ConditionFragment::new("a > :a").with_param("a", 2i64));
        assert!(clash.is_err());
    }

    #[test]
    fn appends_through_writer() {
        let query = QueryFragment::new("SELECT * FROM t")
            .append_where(
                &Writer,
                ConditionFragment::new("id = :id").with_param("id", 3i64),
            )
            .unwrap()
            .append_limit_offset(&Writer, Some(10), Some(20))
            .append_for_update(&Writer);
        assert_eq!(
            query.sql(),
            "SELECT * FROM t WHERE id = :id LIMIT 10 OFFSET 20 FOR UPDATE"
        );
    }

    #[test]
    fn emulate_substitutes_whole_names() {
        let query = QueryFragment::new(
            "SELECT * FROM t WHERE a = :a AND ab = :ab AND c = :missing AND d::text = 'x'",
        )
        .with_param("a", 1i64)
        .with_param("ab", "it's");
        assert_eq!(
            query.emulate(&Writer),
            format!(
                "{}SELECT * FROM t WHERE a = 1 AND ab = 'it''s' AND c = :missing AND d::text = 'x'",
                EMULATED_PREFIX
            )
        );
    }

    #[test]
    fn emulate_hides_large_objects() {
        let payload = b"\x00SECRET-BYTES\xff".to_vec();
        let query = QueryFragment::new("INSERT INTO t (data) VALUES (:data)")
            .with_param("data", Value::Blob(Some(payload.clone().into_boxed_slice())));
        let emulated = query.emulate(&Writer);
        assert!(emulated.starts_with(EMULATED_PREFIX));
        assert!(emulated.contains("(lob 14 bytes)"));
        assert!(!emulated.contains("SECRET"));
        assert!(!emulated.contains(&hex::encode_upper(&payload)));
    }
}
