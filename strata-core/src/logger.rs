use crate::{Params, SqlWriter, emulate, truncate};
use std::{fmt::Write, time::Duration};

/// Receives every successfully executed statement while debug is on.
pub type LogHook = Box<dyn Fn(&str, Duration) + Send>;

/// Decides whether and how executed statements are reported.
pub struct QueryLogger {
    pub(crate) debug: bool,
    pub(crate) emulate: bool,
    pub(crate) hook: Option<LogHook>,
}

impl Default for QueryLogger {
    fn default() -> Self {
        Self {
            debug: false,
            emulate: true,
            hook: None,
        }
    }
}

impl QueryLogger {
    /// Statement text for diagnostics: emulated when enabled, otherwise the
    /// raw SQL followed by the parameters.
    pub fn printable(&self, writer: &dyn SqlWriter, sql: &str, params: &Params) -> String {
        if self.emulate {
            return emulate(writer, sql, params);
        }
        let mut result = truncate(sql).into_owned();
        if !params.is_empty() {
            result.push_str("\nparameters:");
            for (name, value) in params {
                let _ = write!(
                    result,
                    " :{}({})={}",
                    name,
                    value.bind_type(),
                    truncate(&value.value().to_string())
                );
            }
        }
        result
    }

    /// No-op unless debug is on.
    pub fn log(&self, writer: &dyn SqlWriter, sql: &str, params: &Params, elapsed: Duration) {
        if !self.debug {
            return;
        }
        let query = self.printable(writer, sql, params);
        match &self.hook {
            Some(hook) => hook(&query, elapsed),
            None => log::debug!(target: "strata::query", "[{:?}] {}", elapsed, query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::QueryLogger;
    use crate::{Params, SqlWriter, TypedParameter, Value};
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    struct Writer;
    impl SqlWriter for Writer {
        fn as_dyn(&self) -> &dyn SqlWriter {
            self
        }
    }

    #[test]
    fn hook_only_in_debug() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = seen.clone();
        let mut logger = QueryLogger {
            debug: false,
            emulate: false,
            hook: Some(Box::new(move |q: &str, _: Duration| {
                sink.lock().unwrap().push(q.to_string())
            })),
        };
        let mut params = Params::new();
        params.insert("id".into(), TypedParameter::from(Value::Int64(Some(9))));
        logger.log(&Writer, "SELECT :id", &params, Duration::ZERO);
        assert!(seen.lock().unwrap().is_empty());
        logger.debug = true;
        logger.log(&Writer, "SELECT :id", &params, Duration::ZERO);
        assert_eq!(
            *seen.lock().unwrap(),
            ["SELECT :id\nparameters: :id(integer)=9"]
        );
    }
}
