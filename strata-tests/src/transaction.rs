use crate::{silent_logs, user::User};
use strata::{Connection, DatabaseError, Driver, Entity, Error, database_error};

fn count_users<D: Driver>(connection: &mut Connection<D>) -> u64 {
    connection
        .count("SELECT * FROM users")
        .expect("Could not count users")
}

pub fn transactions<D: Driver>(connection: &mut Connection<D>) {
    crate::user::create_schema(connection);
    assert!(!connection.in_transaction());

    // Committed
    connection
        .transaction(|c| c.create(User::new("Carol"), None))
        .expect("Could not create Carol in a transaction");
    assert!(!connection.in_transaction());
    assert_eq!(count_users(connection), 1);

    // Failure inside the closure rolls back and comes back unchanged
    let result;
    silent_logs! {
        result = connection.transaction(|c| {
            let (_, ok) = c.create(User::new("Dave"), None)?;
            assert!(ok);
            assert_eq!(count_users(c), 2);
            Err::<(), _>(Error::msg("giving up on Dave"))
        });
    }
    let error = result.expect_err("The transaction should fail");
    assert_eq!(error.to_string(), "giving up on Dave");
    assert!(database_error(&error).is_none());
    assert!(!connection.in_transaction());
    assert_eq!(count_users(connection), 1);

    // Explicit rollback
    connection.begin().expect("Could not begin");
    assert!(connection.in_transaction());
    let (erin, ok) = User::new("Erin")
        .create(connection)
        .expect("Could not create Erin");
    assert!(ok);
    connection.rollback(None).expect("Could not roll back");
    assert!(!connection.in_transaction());
    assert_eq!(count_users(connection), 1);
    assert!(!erin.delete(connection).expect("Delete should not fail"));

    // State errors
    let error = connection
        .commit()
        .expect_err("Commit without a transaction should fail");
    assert!(matches!(
        database_error(&error),
        Some(DatabaseError::Transaction { .. })
    ));
    connection.begin().expect("Could not begin");
    let error = connection
        .begin()
        .expect_err("Nested begin should fail");
    assert!(matches!(
        database_error(&error),
        Some(DatabaseError::Transaction { .. })
    ));
    connection.commit().expect("Could not commit");
    connection
        .rollback(None)
        .expect("Quiet rollback without a transaction does nothing");
    assert!(connection.rollback_strict(None).is_err());
}

pub fn savepoints<D: Driver>(connection: &mut Connection<D>) {
    crate::user::create_schema(connection);
    let error = connection
        .savepoint("outside")
        .expect_err("Savepoint outside a transaction should fail");
    assert!(matches!(
        database_error(&error),
        Some(DatabaseError::Transaction { .. })
    ));

    connection.begin().expect("Could not begin");
    connection
        .create(User::new("Frank"), None)
        .expect("Could not create Frank");
    connection.savepoint("sp1").expect("Could not open sp1");
    connection
        .create(User::new("Grace"), None)
        .expect("Could not create Grace");
    connection.savepoint("sp2").expect("Could not open sp2");
    connection
        .create(User::new("Heidi"), None)
        .expect("Could not create Heidi");
    assert_eq!(connection.savepoints(), ["sp1", "sp2"]);
    assert_eq!(count_users(connection), 3);

    // Leaves sp1 and everything nested above it
    connection
        .rollback(Some("sp1"))
        .expect("Could not roll back to sp1");
    assert!(connection.in_transaction());
    assert!(connection.savepoints().is_empty());
    assert_eq!(count_users(connection), 1);

    let error = connection
        .rollback_strict(Some("sp2"))
        .expect_err("sp2 is gone");
    assert!(matches!(
        database_error(&error),
        Some(DatabaseError::Transaction { .. })
    ));
    silent_logs! {
        connection
            .rollback(Some("sp2"))
            .expect("Quiet rollback swallows unknown savepoints");
    }
    assert!(connection.in_transaction());

    connection.savepoint("sp3").expect("Could not open sp3");
    connection
        .create(User::new("Ivan"), None)
        .expect("Could not create Ivan");
    connection.commit().expect("Could not commit");
    assert!(connection.savepoints().is_empty());
    let names = connection
        .extract::<String>("SELECT name FROM users ORDER BY user_id")
        .expect("Could not extract the names")
        .into_vec();
    assert_eq!(names, ["Frank", "Ivan"]);
}
