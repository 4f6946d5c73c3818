#[cfg(test)]
mod tests {
    use std::{env, fs, path::PathBuf, sync::Mutex};
    use strata::{Connection, ConnectionConfig, Registry, database_error};
    use strata_sqlite::SqliteDriver;
    use strata_tests::{execute_tests, init_logs, silent_logs};

    static MUTEX: Mutex<()> = Mutex::new(());

    fn database_path(name: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("strata-{}-{name}.sqlite", std::process::id()));
        if path.exists() {
            fs::remove_file(&path)
                .unwrap_or_else(|_| panic!("Failed to remove test database file {:?}", path));
        }
        path
    }

    #[test]
    fn sqlite_memory() {
        init_logs();
        let driver = SqliteDriver::new();
        let connection = Connection::open(
            &driver,
            "memory",
            &ConnectionConfig::new("sqlite://:memory:"),
        )
        .expect("Could not open the database");
        execute_tests(connection);
    }

    #[test]
    fn sqlite_file() {
        init_logs();
        let _guard = MUTEX.lock().unwrap();
        let path = database_path("tests");
        assert!(!path.exists(), "Database file should not exist before test");
        let driver = SqliteDriver::new();
        let connection = Connection::open(
            &driver,
            "file",
            &ConnectionConfig::new(format!("sqlite://{}?mode=rwc", path.display())),
        )
        .expect("Could not open the database");
        assert!(
            path.exists(),
            "Database file should be created after connection"
        );
        execute_tests(connection);
        fs::remove_file(&path).expect("Failed to remove the test database file");
    }

    #[test]
    fn read_only_missing_file() {
        init_logs();
        let _guard = MUTEX.lock().unwrap();
        let path = database_path("missing");
        let driver = SqliteDriver::new();
        let result;
        silent_logs! {
            result = Connection::open(
                &driver,
                "missing",
                &ConnectionConfig::new(format!("sqlite://{}?mode=ro", path.display())),
            );
        }
        assert!(
            result.is_err(),
            "Should not be able to open in read only a missing database"
        );
    }

    #[test]
    fn wrong_url() {
        silent_logs! {
            assert!(
                Connection::open(
                    &SqliteDriver::new(),
                    "wrong",
                    &ConnectionConfig::new("postgres://some_value"),
                )
                .is_err()
            );
        };
    }

    #[test]
    fn registry() {
        init_logs();
        let mut registry = Registry::new(SqliteDriver::new());
        registry
            .init("default", ConnectionConfig::new("sqlite://:memory:"))
            .expect("Could not register the default connection");
        registry
            .init("audit", ConnectionConfig::new("sqlite://:memory:").debug(true))
            .expect("Could not register the audit connection");
        assert_eq!(registry.names().collect::<Vec<_>>(), ["audit", "default"]);
        assert!(registry.contains("default"));
        assert!(!registry.contains("missing"));
        assert!(registry.connection("missing").is_err());

        let connection = registry
            .connection("default")
            .expect("Could not open the default connection");
        assert_eq!(connection.name(), "default");
        assert!(!connection.debug());
        connection
            .execute("CREATE TABLE notes (body TEXT)")
            .expect("Could not create notes");
        connection
            .execute("INSERT INTO notes (body) VALUES ('first')")
            .expect("Could not insert a note");
        assert!(registry.connection("audit").expect("Audit connection").debug());

        // Same connection until it is closed
        assert_eq!(
            registry
                .connection("default")
                .expect("Default connection")
                .count("SELECT * FROM notes")
                .expect("Could not count the notes"),
            1
        );
        registry.close("default").expect("Could not close default");
        registry.close("default").expect("Closing twice does nothing");

        // Reopened, a fresh in memory database
        let result;
        silent_logs! {
            result = registry
                .connection("default")
                .expect("Default connection reopens")
                .count("SELECT * FROM notes");
        }
        let error = result.expect_err("The notes are gone with the old database");
        assert!(database_error(&error).is_some());

        registry.clear().expect("Could not clear the registry");
        assert_eq!(registry.names().count(), 0);
    }
}
