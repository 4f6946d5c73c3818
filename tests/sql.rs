#[cfg(test)]
mod tests {
    use strata::{
        Aliases, Compiler, Criteria, DefaultCompiler, DefaultRansacker, OrderColumns, Pager,
        QueryFragment, Ransacker, SqlWriter, TypedParameter, Value,
    };

    /// Backtick quoting and uppercase booleans.
    struct TickWriter;

    impl SqlWriter for TickWriter {
        fn as_dyn(&self) -> &dyn SqlWriter {
            self
        }

        fn write_identifier_quoted(&self, out: &mut String, value: &str) {
            out.push('`');
            self.write_escaped(out, value, '`', "``");
            out.push('`');
        }

        fn write_value_bool(&self, out: &mut String, value: bool) {
            out.push_str(if value { "TRUE" } else { "FALSE" });
        }
    }

    #[test]
    fn dialect_statements() {
        let mut out = String::new();
        TickWriter.write_insert(&mut out, "user", &[("first name", "v0"), ("active", "v1")]);
        assert_eq!(out, "INSERT INTO `user` (`first name`, `active`) VALUES (:v0, :v1)");
        out.clear();
        TickWriter.write_select_exists(&mut out, "user", "`id` = :r0");
        assert_eq!(out, "SELECT 1 FROM `user` WHERE `id` = :r0 LIMIT 1");
        out.clear();
        TickWriter.write_savepoint(&mut out, "odd`name");
        assert_eq!(out, "SAVEPOINT `odd``name`");
    }

    #[test]
    fn criteria_to_statement() {
        let mut aliases = Aliases::new();
        aliases.insert("author".into(), "a.`name`".into());
        let criteria = Criteria::all()
            .with("author", "Le Guin")
            .with("pages__ge", 200i64)
            .with("deleted_at__null", true)
            .with("active", true);
        let condition = DefaultRansacker
            .build(&TickWriter, &criteria, Some(&aliases))
            .unwrap();
        let query = QueryFragment::new("SELECT b.* FROM book b JOIN author a ON a.id = b.author_id")
            .append_where(&TickWriter, condition)
            .unwrap();
        let order = OrderColumns::value_of(Some([("title", "asc"), ("pages", "desc")]))
            .unwrap()
            .unwrap();
        let query = DefaultCompiler
            .compile(&TickWriter, query, Some(&order), Some(&Pager::new(2, 25)))
            .unwrap();
        assert_eq!(
            query.sql(),
            "SELECT b.* FROM book b JOIN author a ON a.id = b.author_id \
             WHERE a.`name` = :r0 AND `pages` >= :r1 AND `deleted_at` IS NULL AND `active` = :r3 \
             ORDER BY `title` ASC, `pages` DESC \
             LIMIT 25 OFFSET 25"
        );
        assert_eq!(query.params().len(), 3);
        assert_eq!(
            query.emulate(&TickWriter),
            "/* emulated */ SELECT b.* FROM book b JOIN author a ON a.id = b.author_id \
             WHERE a.`name` = 'Le Guin' AND `pages` >= 200 AND `deleted_at` IS NULL AND `active` = TRUE \
             ORDER BY `title` ASC, `pages` DESC \
             LIMIT 25 OFFSET 25"
        );
    }

    #[test]
    fn parameters_and_values() {
        let null = TypedParameter::from(Value::Varchar(None));
        assert_eq!(null.bind_type(), strata::BindType::Null);
        let mut out = String::new();
        TickWriter.write_parameter(&mut out, &TypedParameter::from(Value::Boolean(Some(false))));
        assert_eq!(out, "FALSE");
        out.clear();
        TickWriter.write_parameter(&mut out, &null);
        assert_eq!(out, "NULL");
        assert_eq!(Value::Int64(None), Value::Varchar(None));
        assert_ne!(Value::Int64(Some(1)), Value::Int32(Some(1)));
        assert_eq!(Value::from(Some(5i64)), Value::Int64(Some(5)));
        assert!(Value::from(None::<String>).is_null());
    }

    #[test]
    fn order_columns() {
        let order = OrderColumns::new([("a", "ASC"), ("b", "desc"), ("a", "desc")]).unwrap();
        assert_eq!(order.len(), 2);
        let mut out = String::new();
        order.write_query(&TickWriter, &mut out);
        assert_eq!(out, "`a` DESC, `b` DESC");
        assert_eq!(order.reverse().reverse(), order);
        let pairs: &[(&str, &str)] = &[];
        assert_eq!(OrderColumns::value_of(Some(pairs)).unwrap(), None);
    }
}
