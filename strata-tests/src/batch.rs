use crate::{Recorder, silent_logs, user::User};
use strata::{
    Aliases, ConditionFragment, Connection, Criteria, Driver, OrderColumns, Value,
};
use time::macros::datetime;

pub fn batch<D: Driver>(connection: &mut Connection<D>) {
    crate::user::create_schema(connection);
    let events = Recorder::new();
    connection.set_event_bus(Some(events.event_bus()));

    for (name, logins) in [("Ann", 3i64), ("Ben", 7), ("Cid", 12), ("Dee", 0)] {
        let mut user = User::new(name);
        user.logins = Some(logins);
        let (_, ok) = connection
            .create(user, None)
            .expect("Could not create the user");
        assert!(ok);
    }
    assert_eq!(events.take(), ["creating", "created"].repeat(4));

    // Reads
    assert!(
        connection
            .exists::<User>(&Criteria::all().with("name", "Ben"), None)
            .expect("Could not check Ben")
    );
    assert!(
        !connection
            .exists::<User>(&Criteria::all().with("name", "Zed"), None)
            .expect("Could not check Zed")
    );
    let busy = Criteria::all().with("logins__gt", 5i64);
    assert_eq!(
        connection
            .counts::<User>(&busy, None)
            .expect("Could not count busy users"),
        2
    );
    assert_eq!(
        connection
            .counts::<User>(&Criteria::all(), None)
            .expect("Could not count every user"),
        4
    );
    let order = OrderColumns::new([("logins", "desc")]).expect("Valid ordering");
    let selected = connection
        .selects::<User>(&busy, None, Some(&order), None)
        .expect("Could not select busy users");
    let names: Vec<_> = selected.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, ["Cid", "Ben"]);
    assert!(selected.iter().all(|u| u.origin.is_some()));
    let found = connection
        .finds::<User>(&Criteria::all().with("name__like", "D%"), None)
        .expect("Could not find D users")
        .expect("Dee should be found");
    assert_eq!(found.name, "Dee");
    assert_eq!(found.logins, Some(0));
    assert_eq!(
        connection
            .counts::<User>(&Criteria::all().with("email__null", true), None)
            .expect("Could not count users without email"),
        4
    );

    // Aliases
    let mut aliases = Aliases::new();
    aliases.insert("visits".into(), r#""logins""#.into());
    assert_eq!(
        connection
            .counts::<User>(&Criteria::all().with("visits__le", 3i64), Some(&aliases))
            .expect("Could not count through the alias"),
        2
    );

    // Hand written condition
    let condition = ConditionFragment::new("logins BETWEEN :low AND :high")
        .with_param("low", 1i64)
        .with_param("high", 10i64);
    assert_eq!(
        connection
            .counts::<User>(&condition.into(), None)
            .expect("Could not count with the condition"),
        2
    );

    // Batch update refreshes the update timestamp
    let now = datetime!(2025-01-02 03:04:05);
    let updated = connection
        .updates::<User>(
            &[("email", Value::from("busy@example.com"))],
            &busy,
            None,
            Some(now.assume_utc()),
        )
        .expect("Could not update busy users");
    assert_eq!(updated, 2);
    assert_eq!(events.take(), ["batch_updating", "batch_updated"]);
    let refreshed = connection
        .selects::<User>(&Criteria::all().with("email", "busy@example.com"), None, None, None)
        .expect("Could not select refreshed users");
    assert_eq!(refreshed.len(), 2);
    assert!(refreshed.iter().all(|u| u.updated_at == Some(now)));

    // Nothing matched
    let updated = connection
        .updates::<User>(
            &[("email", Value::from("nobody@example.com"))],
            &Criteria::all().with("name", "Zed"),
            None,
            None,
        )
        .expect("Update matching nothing should not fail");
    assert_eq!(updated, 0);
    assert_eq!(events.take(), ["batch_updating"]);
    let deleted = connection
        .deletes::<User>(&Criteria::all().with("name", "Zed"), None)
        .expect("Delete matching nothing should not fail");
    assert_eq!(deleted, 0);
    assert_eq!(events.take(), ["batch_deleting"]);

    // Batch delete
    let deleted = connection
        .deletes::<User>(&busy, None)
        .expect("Could not delete busy users");
    assert_eq!(deleted, 2);
    assert_eq!(events.take(), ["batch_deleting", "batch_deleted"]);
    assert_eq!(
        connection
            .counts::<User>(&Criteria::all(), None)
            .expect("Could not count the remaining users"),
        2
    );

    // Unknown suffix, read as a column the table does not have
    let result;
    silent_logs! {
        result = connection.counts::<User>(&Criteria::all().with("logins__between", 1i64), None);
    }
    assert!(result.is_err());
    assert!(events.is_empty());

    // Single entity events
    let mut ann = connection
        .finds::<User>(&Criteria::all().with("name", "Ann"), None)
        .expect("Could not find Ann")
        .expect("Ann should be there");
    ann.logins = Some(4);
    let (ann, ok) = connection.update(ann, None).expect("Could not update Ann");
    assert!(ok);
    assert!(connection.delete(&ann).expect("Could not delete Ann"));
    assert_eq!(events.take(), ["updating", "updated", "deleting", "deleted"]);

    connection.set_event_bus(None);
}
