use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use strata::{Event, EventBus, LogHook};

/// Collects executed statements or dispatched event names.
#[derive(Debug, Default, Clone)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn log_hook(&self) -> LogHook {
        let sink = self.clone();
        Box::new(move |query: &str, _: Duration| sink.lock().push(query.to_string()))
    }

    pub fn event_bus(&self) -> Box<dyn EventBus> {
        let sink = self.clone();
        Box::new(move |event: &Event<'_>| sink.lock().push(event.name().to_string()))
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
