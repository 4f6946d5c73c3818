use crate::{Recorder, user::User};
use strata::{Connection, DatabaseError, Driver, Entity, database_error};

fn assert_lost(error: strata::Error) {
    let kind = database_error(&error).expect("The error should be classified");
    assert!(kind.is_connection_lost(), "Unexpected error: {:#}", error);
}

pub fn closed<D: Driver>(mut connection: Connection<D>) {
    crate::user::create_schema(&mut connection);
    let name = connection.name().to_string();
    let (frank, _) = connection
        .create(User::new("Frank"), None)
        .expect("Could not create Frank");
    connection.begin().expect("Could not begin");
    connection
        .create(User::new("Grace"), None)
        .expect("Could not create Grace");
    connection.rollback(None).expect("Could not roll back");

    // Close rolls back a transaction the connection does not track
    let statements = Recorder::new();
    connection.set_log_hook(Some(statements.log_hook()));
    connection.set_debug(true);
    connection.set_emulate(false);
    connection
        .execute("BEGIN")
        .expect("Could not begin with a raw statement");
    assert!(!connection.in_transaction());
    connection
        .create(User::new("Heidi"), None)
        .expect("Could not create Heidi");
    connection.close().expect("Could not close the connection");
    assert_eq!(
        statements.take().last().map(String::as_str),
        Some("ROLLBACK")
    );
    assert!(connection.is_closed());
    assert!(!connection.in_transaction());
    connection.close().expect("Closing twice does nothing");

    assert_lost(
        connection
            .execute("SELECT 1")
            .expect_err("Execute on a closed connection"),
    );
    assert_lost(
        connection
            .count("SELECT * FROM users")
            .expect_err("Count on a closed connection"),
    );
    assert_lost(connection.begin().expect_err("Begin on a closed connection"));
    assert_lost(
        frank
            .delete(&mut connection)
            .expect_err("Delete on a closed connection"),
    );
    assert_lost(
        connection
            .prepare("SELECT 1")
            .err()
            .expect("Prepare on a closed connection"),
    );
    let error = connection.handle().err().expect("No handle once closed");
    assert!(matches!(
        database_error(&error),
        Some(DatabaseError::ConnectionLost { name: v }) if *v == name
    ));
}
