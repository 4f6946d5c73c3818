use crate::{Recorder, silent_logs};
use indoc::indoc;
use strata::{
    Connection, DatabaseError, Driver, Entity, FixedClock, Origin, QueryFragment, Value,
    database_error,
};
use time::{PrimitiveDateTime, macros::datetime};

#[derive(Entity, Debug, Clone, PartialEq)]
#[strata(name = "users")]
pub struct User {
    pub user_id: Option<i64>,
    pub name: String,
    pub email: Option<String>,
    #[strata(default = 0i64)]
    pub logins: Option<i64>,
    pub created_at: Option<PrimitiveDateTime>,
    pub updated_at: Option<PrimitiveDateTime>,
    #[strata(unmapped)]
    pub greeting: String,
    pub origin: Origin,
}

impl User {
    pub fn new(name: &str) -> Self {
        Self {
            user_id: None,
            name: name.into(),
            email: None,
            logins: None,
            created_at: None,
            updated_at: None,
            greeting: format!("Hello {name}"),
            origin: Origin::default(),
        }
    }
}

/// No timestamps, an update with nothing changed must not reach the engine.
#[derive(Entity, Debug, Clone, PartialEq)]
#[strata(name = "tags")]
pub struct Tag {
    pub id: Option<i64>,
    pub label: String,
    pub origin: Origin,
}

/// Nothing identifies a single row.
#[derive(Entity, Debug, Clone, PartialEq)]
#[strata(name = "visits")]
struct Visit {
    page: String,
    origin: Origin,
}

pub(crate) fn create_schema<D: Driver>(connection: &mut Connection<D>) {
    connection
        .execute("DROP TABLE IF EXISTS users")
        .expect("Could not drop users");
    connection
        .execute(indoc! {r#"
            CREATE TABLE users (
                user_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT,
                logins INTEGER,
                created_at TIMESTAMP,
                updated_at TIMESTAMP
            )
        "#})
        .expect("Could not create users");
    connection
        .execute("DROP TABLE IF EXISTS tags")
        .expect("Could not drop tags");
    connection
        .execute("CREATE TABLE tags (id INTEGER PRIMARY KEY AUTOINCREMENT, label TEXT NOT NULL)")
        .expect("Could not create tags");
}

pub fn users<D: Driver>(connection: &mut Connection<D>) {
    create_schema(connection);
    let statements = Recorder::new();
    connection.set_debug(true);
    connection.set_emulate(false);
    connection.set_log_hook(Some(statements.log_hook()));

    // Create
    let created = datetime!(2024-05-06 07:08:09);
    connection.set_clock(FixedClock(created.assume_utc()));
    let alice = User::new("Alice");
    assert!(alice.is_dirty());
    assert_eq!(alice.changes().len(), User::table().columns.len());
    let (mut alice, ok) = connection
        .create(alice, None)
        .expect("Could not create Alice");
    assert!(ok);
    assert!(alice.user_id.is_some());
    assert_eq!(alice.created_at, Some(created));
    assert_eq!(alice.updated_at, None);
    assert_eq!(alice.logins, Some(0));
    assert_eq!(alice.greeting, "Hello Alice");
    assert!(!alice.is_dirty());
    assert!(alice.changes().is_empty());
    let insert = statements.take();
    assert_eq!(insert.len(), 1);
    assert!(insert[0].starts_with(r#"INSERT INTO "users" ("name", "email", "logins", "created_at", "updated_at")"#));
    assert!(!insert[0].contains("user_id"));

    // Rename
    let updated = datetime!(2024-05-07 10:00:00);
    alice.name = "Alicia".into();
    assert_eq!(
        alice.changes(),
        vec![("name", Value::Varchar(Some("Alicia".into())))]
    );
    let (alice, ok) = connection
        .update(alice, Some(updated.assume_utc()))
        .expect("Could not update Alice");
    assert!(ok);
    assert_eq!(alice.updated_at, Some(updated));
    assert!(!alice.is_dirty());
    let update = statements.take();
    assert_eq!(update.len(), 1);
    assert!(update[0].starts_with(
        r#"UPDATE "users" SET "name" = :s0, "updated_at" = :s1 WHERE "user_id" = :w0"#
    ));
    let stored: Option<User> = connection
        .find(
            QueryFragment::new("SELECT * FROM users WHERE user_id = :id")
                .with_param("id", alice.user_id),
        )
        .expect("Could not find Alice");
    let stored = stored.expect("Alice should be stored");
    assert_eq!(stored.name, "Alicia");
    assert_eq!(stored.created_at, Some(created));
    assert_eq!(stored.updated_at, Some(updated));
    assert!(!stored.is_dirty());
    assert_eq!(stored.greeting, "");

    // Origin is a copy of the stored values
    let mut renamed = stored.clone();
    renamed.name = "Ally".into();
    let origin = renamed
        .origin()
        .expect("Could not rebuild the origin")
        .expect("Hydrated users have an origin");
    assert_eq!(origin.name, "Alicia");
    assert_eq!(renamed.name, "Ally");
    renamed.set_origin(None);
    assert_eq!(renamed.changes().len(), User::table().columns.len());

    // Save creates then updates
    let (bob, ok) = connection
        .save(User::new("Bob"), None)
        .expect("Could not save Bob");
    assert!(ok);
    let bob_id = bob.user_id;
    let mut bob = bob;
    bob.email = Some("bob@example.com".into());
    let (bob, ok) = connection.save(bob, None).expect("Could not save Bob again");
    assert!(ok);
    assert_eq!(bob.user_id, bob_id);
    statements.take();

    // Row removed by somebody else
    connection
        .execute(QueryFragment::new("DELETE FROM users WHERE user_id = :id").with_param("id", bob.user_id))
        .expect("Could not delete Bob behind the entity");
    let deleted = bob.delete(connection).expect("Delete should not fail");
    assert!(!deleted);
    let (_, ok) = connection
        .update(bob.clone(), None)
        .expect("Update should not fail");
    assert!(!ok);

    // Delete
    assert!(alice.delete(connection).expect("Could not delete Alice"));
    let count = connection
        .count("SELECT * FROM users")
        .expect("Could not count users");
    assert_eq!(count, 0);

    // Nothing to write
    let (tag, ok) = connection
        .create(
            Tag {
                id: None,
                label: "rust".into(),
                origin: Origin::default(),
            },
            None,
        )
        .expect("Could not create the tag");
    assert!(ok);
    assert_eq!(Tag::primary_keys(), vec!["id"]);
    statements.take();
    let (tag, ok) = connection.update(tag, None).expect("Could not update the tag");
    assert!(ok);
    assert!(statements.is_empty());
    assert!(tag.delete(connection).expect("Could not delete the tag"));

    // Single row writes need a primary key
    assert!(Visit::primary_keys().is_empty());
    let visit = Visit {
        page: "/".into(),
        origin: Origin::default(),
    };
    statements.take();
    for error in [
        connection
            .build_primary_wheres(&visit)
            .expect_err("Visits have no primary key"),
        connection
            .update(visit.clone(), None)
            .expect_err("Update needs a primary key"),
        connection
            .delete(&visit)
            .expect_err("Delete needs a primary key"),
    ] {
        assert!(
            matches!(database_error(&error), Some(DatabaseError::Entity(..))),
            "Unexpected error: {:#}",
            error
        );
    }
    assert!(statements.is_empty());

    // Engine failure is not a soft failure
    let result;
    silent_logs! {
        result = connection.execute("INSERT INTO missing_table (a) VALUES (1)");
    }
    let error = result.expect_err("Inserting into a missing table should fail");
    let kind = database_error(&error).expect("The error should be classified");
    assert!(matches!(kind, DatabaseError::Execution { .. }));
    assert!(format!("{:#}", error).contains("missing_table"));

    connection.set_log_hook(None);
    connection.set_debug(false);
    connection.set_emulate(true);
}
