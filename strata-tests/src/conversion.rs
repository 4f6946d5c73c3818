use crate::user::Tag;
use strata::{
    BindType, ColumnMeta, Connection, Converter, Criteria, DefaultConverter, Driver, Origin,
    QueryFragment, Result, TypedParameter, Value,
};

/// Stores booleans as `yes`/`no` text.
struct YesNo;

impl Converter for YesNo {
    fn to_parameter(&self, value: Value) -> TypedParameter {
        match value {
            Value::Boolean(Some(v)) => TypedParameter::string(if v { "yes" } else { "no" }),
            v => DefaultConverter.to_parameter(v),
        }
    }

    fn to_native(&self, raw: Value, column: &ColumnMeta, declared: Option<&Value>) -> Result<Value> {
        DefaultConverter.to_native(raw, column, declared)
    }
}

pub fn conversion<D: Driver>(connection: &mut Connection<D>) {
    crate::user::create_schema(connection);
    connection
        .execute("DROP TABLE IF EXISTS flags")
        .expect("Could not drop flags");
    connection
        .execute("CREATE TABLE flags (id INTEGER PRIMARY KEY, flag TEXT)")
        .expect("Could not create flags");
    connection.set_converter(YesNo);

    // Plain values go through the converter
    connection
        .execute(
            QueryFragment::new("INSERT INTO flags (id, flag) VALUES (1, :flag)")
                .with_param("flag", true),
        )
        .expect("Could not insert the first flag");
    assert_eq!(
        connection
            .get::<String>("SELECT flag FROM flags WHERE id = 1")
            .expect("Could not read the first flag"),
        Some("yes".to_string())
    );

    // Explicitly typed parameters are bound as they are
    connection
        .execute(
            QueryFragment::new("INSERT INTO flags (id, flag) VALUES (2, :flag)").with_typed_param(
                "flag",
                TypedParameter::new(Value::Boolean(Some(true)), BindType::Boolean),
            ),
        )
        .expect("Could not insert the second flag");
    assert_eq!(
        connection
            .get::<String>("SELECT flag FROM flags WHERE id = 2")
            .expect("Could not read the second flag"),
        Some("1".to_string())
    );

    // Criteria values too
    connection
        .create(
            Tag {
                id: None,
                label: "yes".into(),
                origin: Origin::default(),
            },
            None,
        )
        .expect("Could not create the tag");
    assert_eq!(
        connection
            .counts::<Tag>(&Criteria::all().with("label", true), None)
            .expect("Could not count the tags"),
        1
    );
    assert_eq!(
        connection
            .count(QueryFragment::new("SELECT * FROM flags WHERE flag = :f").with_param("f", false))
            .expect("Could not count the flags"),
        0
    );

    connection.set_converter(DefaultConverter);
    assert_eq!(
        connection
            .counts::<Tag>(&Criteria::all().with("label", true), None)
            .expect("Could not count the tags"),
        0
    );
}
