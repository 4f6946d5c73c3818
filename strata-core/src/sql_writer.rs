use crate::{BindType, TypedParameter, Value, separated_by};
use std::fmt::Write;

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($this:ident, $out:ident, $value:expr) => {{
        if $value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        } else {
            $this.write_value_string($out, &$value.to_string());
        }
    }};
}

/// Dialect specific SQL text production.
///
/// Every method appends to `out`. The defaults produce standard SQL, drivers
/// override what their dialect does differently. This is also the single
/// place where literals are quoted, so emulated statements in logs look the
/// way the dialect would spell them.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    fn write_placeholder(&self, out: &mut String, name: &str) {
        out.push(':');
        out.push_str(name);
    }

    /// Literal form of a parameter: the dialect equivalent of quoting the value
    /// according to its bind type.
    fn write_parameter(&self, out: &mut String, value: &TypedParameter) {
        match value.bind_type() {
            BindType::Null => self.write_value_none(out),
            BindType::Boolean => match value.value() {
                Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
                v => self.write_value(out, v),
            },
            BindType::Integer | BindType::LargeObject => self.write_value(out, value.value()),
            BindType::String => match value.value() {
                Value::Varchar(Some(v)) => self.write_value_string(out, v),
                v => self.write_value_string(out, &v.to_string()),
            },
        }
    }

    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            v if v.is_null() => self.write_value_none(out),
            Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::Float64(Some(v)) => write_float!(self, out, *v),
            Value::Decimal(Some(v)) => drop(write!(out, "{}", v)),
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v),
            v => self.write_value_string(out, &v.to_string()),
        }
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL");
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize]);
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        out.push_str(&hex::encode_upper(value));
        out.push('\'');
    }

    /// Appends a `WHERE` clause, nothing when `condition` is empty.
    fn write_where(&self, out: &mut String, condition: &str) {
        if !condition.is_empty() {
            out.push_str(" WHERE ");
            out.push_str(condition);
        }
    }

    fn write_limit_offset(&self, out: &mut String, limit: Option<u64>, offset: Option<u64>) {
        if let Some(limit) = limit {
            out.push_str(" LIMIT ");
            write_integer!(out, limit);
        }
        if let Some(offset) = offset {
            out.push_str(" OFFSET ");
            write_integer!(out, offset);
        }
    }

    fn write_for_update(&self, out: &mut String) {
        out.push_str(" FOR UPDATE");
    }

    fn write_order_by(&self, out: &mut String, order: &crate::OrderColumns) {
        if !order.is_empty() {
            out.push_str(" ORDER BY ");
            order.write_query(self.as_dyn(), out);
        }
    }

    /// `columns` pairs a column with the name of its placeholder.
    fn write_insert(&self, out: &mut String, table: &str, columns: &[(&str, &str)]) {
        out.push_str("INSERT INTO ");
        self.write_identifier_quoted(out, table);
        if columns.is_empty() {
            out.push_str(" DEFAULT VALUES");
            return;
        }
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, (c, _)| self.write_identifier_quoted(out, c),
            ", ",
        );
        out.push_str(") VALUES (");
        separated_by(
            out,
            columns,
            |out, (_, p)| self.write_placeholder(out, p),
            ", ",
        );
        out.push(')');
    }

    fn write_update(&self, out: &mut String, table: &str, sets: &[(&str, &str)], condition: &str) {
        out.push_str("UPDATE ");
        self.write_identifier_quoted(out, table);
        out.push_str(" SET ");
        separated_by(
            out,
            sets,
            |out, (c, p)| {
                self.write_identifier_quoted(out, c);
                out.push_str(" = ");
                self.write_placeholder(out, p);
            },
            ", ",
        );
        self.write_where(out, condition);
    }

    fn write_delete(&self, out: &mut String, table: &str, condition: &str) {
        out.push_str("DELETE FROM ");
        self.write_identifier_quoted(out, table);
        self.write_where(out, condition);
    }

    fn write_select_all(&self, out: &mut String, table: &str, condition: &str) {
        out.push_str("SELECT * FROM ");
        self.write_identifier_quoted(out, table);
        self.write_where(out, condition);
    }

    fn write_select_count(&self, out: &mut String, table: &str, condition: &str) {
        out.push_str("SELECT COUNT(*) FROM ");
        self.write_identifier_quoted(out, table);
        self.write_where(out, condition);
    }

    fn write_select_exists(&self, out: &mut String, table: &str, condition: &str) {
        out.push_str("SELECT 1 FROM ");
        self.write_identifier_quoted(out, table);
        self.write_where(out, condition);
        self.write_limit_offset(out, Some(1), None);
    }

    /// Counts the rows of an arbitrary query by wrapping it as a subquery.
    fn write_count_wrapper(&self, out: &mut String, sql: &str) {
        out.push_str("SELECT COUNT(*) FROM (");
        out.push_str(sql.trim().trim_end_matches(';'));
        out.push_str(") AS ");
        self.write_identifier_quoted(out, "__strata_count");
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN");
    }

    fn write_transaction_commit(&self, out: &mut String) {
        out.push_str("COMMIT");
    }

    fn write_transaction_rollback(&self, out: &mut String) {
        out.push_str("ROLLBACK");
    }

    fn write_savepoint(&self, out: &mut String, name: &str) {
        out.push_str("SAVEPOINT ");
        self.write_identifier_quoted(out, name);
    }

    fn write_rollback_to_savepoint(&self, out: &mut String, name: &str) {
        out.push_str("ROLLBACK TO SAVEPOINT ");
        self.write_identifier_quoted(out, name);
    }

    fn write_release_savepoint(&self, out: &mut String, name: &str) {
        out.push_str("RELEASE SAVEPOINT ");
        self.write_identifier_quoted(out, name);
    }
}

#[cfg(test)]
mod tests {
    use super::SqlWriter;
    use crate::{BindType, TypedParameter, Value};

    struct Writer;
    impl SqlWriter for Writer {
        fn as_dyn(&self) -> &dyn SqlWriter {
            self
        }
    }

    #[test]
    fn statements() {
        let mut out = String::new();
        Writer.write_insert(&mut out, "user", &[("name", "v0"), ("age", "v1")]);
        assert_eq!(
            out,
            r#"INSERT INTO "user" ("name", "age") VALUES (:v0, :v1)"#
        );
        out.clear();
        Writer.write_update(&mut out, "user", &[("name", "v0")], r#""id" = :w0"#);
        assert_eq!(out, r#"UPDATE "user" SET "name" = :v0 WHERE "id" = :w0"#);
        out.clear();
        Writer.write_delete(&mut out, "user", "");
        assert_eq!(out, r#"DELETE FROM "user""#);
        out.clear();
        Writer.write_insert(&mut out, "a\"b", &[]);
        assert_eq!(out, r#"INSERT INTO "a""b" DEFAULT VALUES"#);
    }

    #[test]
    fn quoting() {
        let mut out = String::new();
        Writer.write_parameter(
            &mut out,
            &TypedParameter::string(Value::Varchar(Some("it's".into()))),
        );
        out.push(' ');
        Writer.write_parameter(
            &mut out,
            &TypedParameter::new(Value::Int64(Some(42)), BindType::Integer),
        );
        out.push(' ');
        Writer.write_parameter(&mut out, &TypedParameter::from(Value::Float64(Some(1.5))));
        assert_eq!(out, "'it''s' 42 '1.5'");
    }

    #[test]
    fn count_wrapper_strips_terminator() {
        let mut out = String::new();
        Writer.write_count_wrapper(&mut out, "SELECT a, COUNT(*) FROM t GROUP BY a;");
        assert_eq!(
            out,
            r#"SELECT COUNT(*) FROM (SELECT a, COUNT(*) FROM t GROUP BY a) AS "__strata_count""#
        );
    }
}
