use crate::{Connection, Driver, Error, Result};
use std::collections::BTreeMap;

/// How to reach one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub url: String,
    /// Report executed statements.
    pub debug: bool,
    /// Substitute parameters into reported statements.
    pub emulate: bool,
}

impl ConnectionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            debug: false,
            emulate: true,
        }
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn emulate(mut self, emulate: bool) -> Self {
        self.emulate = emulate;
        self
    }
}

struct Slot<D: Driver> {
    config: ConnectionConfig,
    connection: Option<Connection<D>>,
}

/// Named connections, opened on first use.
pub struct Registry<D: Driver> {
    driver: D,
    slots: BTreeMap<String, Slot<D>>,
}

impl<D: Driver> Registry<D> {
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            slots: BTreeMap::new(),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Register `name`. A previous definition is replaced and its connection
    /// closed.
    pub fn init(&mut self, name: impl Into<String>, config: ConnectionConfig) -> Result<()> {
        let name = name.into();
        let previous = self.slots.insert(
            name,
            Slot {
                config,
                connection: None,
            },
        );
        if let Some(mut connection) = previous.and_then(|v| v.connection) {
            connection.close()?;
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// The connection registered as `name`, opening it when needed.
    pub fn connection(&mut self, name: &str) -> Result<&mut Connection<D>> {
        let Some(slot) = self.slots.get_mut(name) else {
            return Err(Error::msg(format!("No connection registered as `{name}`")));
        };
        if slot.connection.as_ref().is_none_or(|v| v.is_closed()) {
            slot.connection = Some(Connection::open(&self.driver, name, &slot.config)?);
        }
        slot.connection
            .as_mut()
            .ok_or_else(|| Error::msg(format!("Connection `{name}` is not available")))
    }

    /// Close the connection registered as `name`, keeping its definition.
    pub fn close(&mut self, name: &str) -> Result<()> {
        match self.slots.get_mut(name).and_then(|v| v.connection.as_mut()) {
            Some(connection) => connection.close(),
            None => Ok(()),
        }
    }

    /// Close every connection and forget every definition. All connections
    /// are attempted, the first failure is returned.
    pub fn clear(&mut self) -> Result<()> {
        let mut result = Ok(());
        for (name, slot) in std::mem::take(&mut self.slots) {
            if let Some(mut connection) = slot.connection
                && let Err(e) = connection.close()
            {
                log::error!("Could not close connection `{name}`: {e:#}");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}
