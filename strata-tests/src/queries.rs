use crate::{Recorder, user::User};
use std::ops::ControlFlow;
use strata::{
    AsValue, Connection, Driver, EMULATED_PREFIX, Error, OrderColumns, Pager, QueryFragment, RowLabeled,
    Value,
};

pub fn queries<D: Driver>(connection: &mut Connection<D>) {
    crate::user::create_schema(connection);
    for (i, name) in ["Ann", "Ben", "Cid", "Dee", "Eve", "Fay", "Gus"]
        .into_iter()
        .enumerate()
    {
        let mut user = User::new(name);
        user.logins = Some(i as i64 * 2);
        connection
            .create(user, None)
            .expect("Could not create the user");
    }

    // Select with ordering and page
    let order = OrderColumns::new([("logins", "DESC")]).expect("Valid ordering");
    let users = connection
        .select::<User>("SELECT * FROM users", Some(&order), Some(&Pager::new(2, 3)))
        .expect("Could not select the second page");
    let names: Vec<_> = users.iter().map(|u| u.name.clone()).collect();
    assert_eq!(names, ["Dee", "Cid", "Ben"]);
    let second = users.get(1).expect("The page has three users");
    assert_eq!(users.position_of(second), Some(1));
    let reversed = connection
        .select::<User>("SELECT * FROM users", Some(&order.reverse()), Some(&Pager::new(1, 2)))
        .expect("Could not select in reverse");
    assert_eq!(reversed[0].name, "Ann");
    assert_eq!(reversed.len(), 2);

    // Single values
    let ben: Option<User> = connection
        .find(QueryFragment::new("SELECT * FROM users WHERE name = :name").with_param("name", "Ben"))
        .expect("Could not find Ben");
    assert_eq!(ben.map(|v| v.logins), Some(Some(2)));
    let nobody: Option<User> = connection
        .find("SELECT * FROM users WHERE name = 'Zed'")
        .expect("Could not look for Zed");
    assert!(nobody.is_none());
    let logins = connection
        .extract::<i64>("SELECT logins FROM users ORDER BY logins")
        .expect("Could not extract the logins")
        .into_vec();
    assert_eq!(logins, [0, 2, 4, 6, 8, 10, 12]);
    let highest = connection
        .get::<i64>("SELECT MAX(logins) FROM users")
        .expect("Could not get the highest logins");
    assert_eq!(highest, Some(12));
    assert_eq!(
        connection
            .get::<String>("SELECT name FROM users WHERE 1 = 0")
            .expect("Empty results are not an error"),
        None
    );
    assert!(
        connection
            .exist("SELECT 1 FROM users WHERE logins > 10")
            .expect("Could not check the logins")
    );
    assert!(
        !connection
            .exist("SELECT 1 FROM users WHERE logins > 100")
            .expect("Could not check the logins")
    );
    assert_eq!(
        connection
            .count(QueryFragment::new("SELECT * FROM users WHERE logins >= :min").with_param("min", 6i64))
            .expect("Could not count the users"),
        4
    );

    // Streaming
    let mut seen = Vec::new();
    connection
        .each("SELECT * FROM users ORDER BY user_id", |user: User| {
            seen.push(user.name);
            Ok(if seen.len() == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        })
        .expect("Could not iterate the users");
    assert_eq!(seen, ["Ann", "Ben", "Cid"]);
    let result = connection.each("SELECT * FROM users", |_: RowLabeled| {
        Err(Error::msg("stop right there"))
    });
    assert_eq!(
        result.expect_err("The callback error comes back").to_string(),
        "stop right there"
    );
    let even = connection
        .filter("SELECT * FROM users", |user: &User| {
            user.logins.unwrap_or_default() % 4 == 0
        })
        .expect("Could not filter the users");
    assert_eq!(even.len(), 4);
    let upper = connection
        .map("SELECT name FROM users ORDER BY name", |v: Value| {
            Ok(String::try_from_value(v)?.to_uppercase())
        })
        .expect("Could not map the names");
    assert_eq!(upper.first().map(String::as_str), Some("ANN"));
    let total = connection
        .reduce("SELECT * FROM users", 0i64, |sum, user: User| {
            Ok(sum + user.logins.unwrap_or_default())
        })
        .expect("Could not sum the logins");
    assert_eq!(total, 42);

    // Pagination
    let order = OrderColumns::new([("name", "asc")]).expect("Valid ordering");
    let page = connection
        .paginate::<User>("SELECT * FROM users", Some(&order), Pager::new(3, 3))
        .expect("Could not paginate");
    assert_eq!(page.total(), 7);
    assert_eq!(page.pages(), 3);
    assert!(!page.has_next());
    assert!(page.has_previous());
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Gus");
    assert!(
        connection
            .select::<User>("SELECT * FROM users", None, Some(&Pager::new(u64::MAX / 2, 10)))
            .is_err()
    );

    // Debug output
    let statements = Recorder::new();
    connection.set_log_hook(Some(statements.log_hook()));
    connection.set_debug(true);
    connection
        .find::<User>(QueryFragment::new("SELECT * FROM users WHERE name = :name").with_param("name", "O'Neil"))
        .expect("Could not look for O'Neil");
    connection.set_emulate(false);
    connection
        .find::<User>(QueryFragment::new("SELECT * FROM users WHERE logins = :n").with_param("n", 4i64))
        .expect("Could not look for 4 logins");
    connection.set_debug(false);
    connection
        .execute("DELETE FROM users WHERE 1 = 0")
        .expect("Could not run the silent statement");
    let logged = statements.take();
    assert_eq!(logged.len(), 2);
    assert_eq!(
        logged[0],
        format!("{EMULATED_PREFIX}SELECT * FROM users WHERE name = 'O''Neil'")
    );
    assert!(logged[1].starts_with("SELECT * FROM users WHERE logins = :n"));
    assert!(!logged[1].contains(EMULATED_PREFIX));
    connection.set_log_hook(None);
    connection.set_emulate(true);
}
