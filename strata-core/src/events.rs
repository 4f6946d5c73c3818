use crate::{ConditionFragment, Row, TableDef, Value};

/// Lifecycle notifications emitted by the persistence operations.
#[derive(Debug)]
pub enum Event<'a> {
    Creating {
        table: &'a TableDef,
        row: &'a Row,
    },
    Created {
        table: &'a TableDef,
        row: &'a Row,
    },
    Updating {
        table: &'a TableDef,
        changes: &'a [(&'a str, Value)],
    },
    Updated {
        table: &'a TableDef,
        changes: &'a [(&'a str, Value)],
    },
    Deleting {
        table: &'a TableDef,
        row: &'a Row,
    },
    Deleted {
        table: &'a TableDef,
        row: &'a Row,
    },
    BatchUpdating {
        table: &'a TableDef,
        changes: &'a [(&'a str, Value)],
        condition: &'a ConditionFragment,
    },
    BatchUpdated {
        table: &'a TableDef,
        changes: &'a [(&'a str, Value)],
        condition: &'a ConditionFragment,
        affected: u64,
    },
    BatchDeleting {
        table: &'a TableDef,
        condition: &'a ConditionFragment,
    },
    BatchDeleted {
        table: &'a TableDef,
        condition: &'a ConditionFragment,
        affected: u64,
    },
}

impl Event<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Creating { .. } => "creating",
            Event::Created { .. } => "created",
            Event::Updating { .. } => "updating",
            Event::Updated { .. } => "updated",
            Event::Deleting { .. } => "deleting",
            Event::Deleted { .. } => "deleted",
            Event::BatchUpdating { .. } => "batch_updating",
            Event::BatchUpdated { .. } => "batch_updated",
            Event::BatchDeleting { .. } => "batch_deleting",
            Event::BatchDeleted { .. } => "batch_deleted",
        }
    }

    pub fn table(&self) -> &TableDef {
        match self {
            Event::Creating { table, .. }
            | Event::Created { table, .. }
            | Event::Updating { table, .. }
            | Event::Updated { table, .. }
            | Event::Deleting { table, .. }
            | Event::Deleted { table, .. }
            | Event::BatchUpdating { table, .. }
            | Event::BatchUpdated { table, .. }
            | Event::BatchDeleting { table, .. }
            | Event::BatchDeleted { table, .. } => table,
        }
    }
}

/// Receives lifecycle events. Dispatch is fire and forget.
pub trait EventBus: Send {
    fn dispatch(&self, event: &Event<'_>);
}

impl<F: Fn(&Event<'_>) + Send> EventBus for F {
    fn dispatch(&self, event: &Event<'_>) {
        self(event)
    }
}
