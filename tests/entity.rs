#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use strata::{Entity, FromRow, Origin, RowLabeled, Value};
    use time::{
        PrimitiveDateTime,
        macros::{datetime, offset},
    };

    #[derive(Entity, Debug, Clone, PartialEq)]
    struct Category {
        category_id: Option<i64>,
        title: String,
        origin: Origin,
    }

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[strata(name = "order_lines", primary_key = ("order_id", "line"))]
    struct OrderLine {
        order_id: i64,
        line: i32,
        #[strata(name = "qty", default = 1i32)]
        quantity: Option<i32>,
        price: Option<Decimal>,
        #[strata(default_now)]
        added_on: Option<PrimitiveDateTime>,
        #[strata(unmapped)]
        cache: Vec<String>,
        origin: Origin,
    }

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[strata(updated_at = "touched_at")]
    struct Session {
        #[strata(primary_key)]
        token: String,
        id: Option<i64>,
        created_at: Option<PrimitiveDateTime>,
        touched_at: Option<PrimitiveDateTime>,
        _origin: Origin,
    }

    #[derive(Entity, Debug, Clone, PartialEq)]
    struct LogLine {
        message: String,
        origin: Origin,
    }

    impl Category {
        fn new(title: &str) -> Self {
            Self {
                category_id: None,
                title: title.into(),
                origin: Origin::default(),
            }
        }
    }

    #[test]
    fn inferred_metadata() {
        let table = Category::table();
        assert_eq!(table.name, "category");
        assert_eq!(Category::table_name(), "category");
        assert_eq!(Category::primary_keys(), ["category_id"]);
        let names: Vec<_> = table.columns.iter().map(|c| c.name).collect();
        assert_eq!(names, ["category_id", "title"]);
        assert!(table.columns[0].nullable);
        assert!(!table.columns[1].nullable);
        assert!(matches!(table.columns[0].value, Value::Int64(None)));
        assert!(matches!(table.columns[1].value, Value::Varchar(None)));
        assert_eq!(table.created_at, None);
        assert_eq!(table.updated_at, None);
        assert!(Category::unmaps().is_empty());
        assert!(std::ptr::eq(Category::table(), Category::table()));
    }

    #[test]
    fn declared_metadata() {
        let table = OrderLine::table();
        assert_eq!(table.name, "order_lines");
        assert_eq!(OrderLine::primary_keys(), ["order_id", "line"]);
        let names: Vec<_> = table.columns.iter().map(|c| c.name).collect();
        assert_eq!(names, ["order_id", "line", "qty", "price", "added_on"]);
        assert_eq!(OrderLine::unmaps(), ["cache"]);
        assert!(table.column("quantity").is_none());
        assert_eq!(table.column_index("qty"), Some(2));

        let table = Session::table();
        assert_eq!(table.name, "session");
        assert_eq!(Session::primary_keys(), ["token"]);
        assert_eq!(table.created_at, Some("created_at"));
        assert_eq!(table.updated_at, Some("touched_at"));

        assert!(LogLine::primary_keys().is_empty());
        assert_eq!(LogLine::table_name(), "log_line");
    }

    #[test]
    fn defaults() {
        let now = datetime!(2024-03-04 05:06:07).assume_offset(offset!(UTC));
        let defaults = OrderLine::defaults(now);
        assert_eq!(
            defaults,
            [
                ("qty", Value::Int32(Some(1))),
                (
                    "added_on",
                    Value::Timestamp(Some(datetime!(2024-03-04 05:06:07)))
                ),
            ]
        );
        assert!(Category::defaults(now).is_empty());
    }

    #[test]
    fn change_tracking() {
        let mut category = Category::new("Books");
        assert!(category.origin_ref().row().is_none());
        assert!(category.is_dirty());
        assert_eq!(category.changes().len(), 2);
        assert!(category.origin().unwrap().is_none());

        category.category_id = Some(7);
        category.snapshot();
        assert!(!category.is_dirty());
        assert!(category.changes().is_empty());

        category.title = "Comics".into();
        assert!(category.is_dirty());
        assert_eq!(
            category.changes(),
            [("title", Value::Varchar(Some("Comics".into())))]
        );
        let origin = category.origin().unwrap().unwrap();
        assert_eq!(origin.title, "Books");
        assert_eq!(origin.category_id, Some(7));
        assert!(!origin.is_dirty());

        category.title = "Books".into();
        assert!(!category.is_dirty());

        let other = Category {
            category_id: Some(7),
            title: "Music".into(),
            origin: Origin::default(),
        };
        category.set_origin(Some(&other));
        assert_eq!(category.changes().len(), 1);
        category.set_origin(None);
        assert_eq!(category.changes().len(), 2);
    }

    #[test]
    fn values_by_column() {
        let mut line = OrderLine {
            order_id: 1,
            line: 2,
            quantity: None,
            price: Some(Decimal::from_str("9.99").unwrap()),
            added_on: None,
            cache: vec!["x".into()],
            origin: Origin::default(),
        };
        assert_eq!(line.value("qty"), Some(Value::Int32(None)));
        assert_eq!(line.value("cache"), None);
        line.set_value("qty", Value::Int64(Some(3))).unwrap();
        assert_eq!(line.quantity, Some(3));
        assert!(line.set_value("cache", Value::Null).is_err());
        assert!(
            line.set_value("qty", Value::Varchar(Some("three".into())))
                .is_err()
        );
        let labeled = line.row_labeled();
        assert_eq!(
            labeled.names(),
            ["order_id", "line", "qty", "price", "added_on"]
        );
        assert_eq!(labeled.get_column("line"), Some(&Value::Int32(Some(2))));
    }

    #[test]
    fn hydration() {
        let row = RowLabeled::new(
            Category::table().labels.clone(),
            vec![Value::Int64(Some(3)), Value::Varchar(Some("Games".into()))].into_boxed_slice(),
        );
        let mut category = Category::from_row(row).unwrap();
        assert_eq!(category.category_id, Some(3));
        assert_eq!(category.title, "Games");
        assert!(category.is_dirty());
        category.hydrated();
        assert!(!category.is_dirty());

        let row = RowLabeled::new(
            vec!["order_id".to_string(), "line".to_string()].into(),
            vec![Value::Int64(Some(1)), Value::Int64(Some(4))].into_boxed_slice(),
        );
        let line = OrderLine::from_row(row).unwrap();
        assert_eq!(line.line, 4);
        assert_eq!(line.quantity, None);
        assert!(line.cache.is_empty());

        let row = RowLabeled::new(
            vec!["order_id".to_string()].into(),
            vec![Value::Varchar(Some("one".into()))].into_boxed_slice(),
        );
        let error = OrderLine::from_row(row).unwrap_err();
        assert!(format!("{:#}", error).contains("order_id"));
    }
}
