use strata_core::SqlWriter;

pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push(if value { '1' } else { '0' });
    }

    /// Rows are locked by the write transaction already.
    fn write_for_update(&self, _out: &mut String) {}

    fn write_limit_offset(&self, out: &mut String, limit: Option<u64>, offset: Option<u64>) {
        match (limit, offset) {
            (None, None) => {}
            (limit, offset) => {
                let mut buffer = itoa::Buffer::new();
                out.push_str(" LIMIT ");
                match limit {
                    Some(v) => out.push_str(buffer.format(v)),
                    None => out.push_str("-1"),
                }
                if let Some(offset) = offset {
                    out.push_str(" OFFSET ");
                    out.push_str(buffer.format(offset));
                }
            }
        }
    }

    fn write_transaction_begin(&self, out: &mut String) {
        out.push_str("BEGIN TRANSACTION");
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSqlWriter;
    use strata_core::{QueryFragment, SqlWriter};

    #[test]
    fn dialect() {
        let writer = SqliteSqlWriter {};
        let query = QueryFragment::new("SELECT * FROM t")
            .append_limit_offset(&writer, None, Some(5))
            .append_for_update(&writer);
        assert_eq!(query.sql(), "SELECT * FROM t LIMIT -1 OFFSET 5");
        let query = QueryFragment::new("SELECT * FROM t").append_limit_offset(
            &writer,
            Some(10),
            Some(18_446_744_073_709_551_610),
        );
        assert_eq!(
            query.sql(),
            "SELECT * FROM t LIMIT 10 OFFSET 18446744073709551610"
        );
        let mut out = String::new();
        writer.write_value_bool(&mut out, true);
        assert_eq!(out, "1");
    }
}
