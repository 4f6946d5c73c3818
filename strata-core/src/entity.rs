use crate::{
    Connection, DatabaseError, Driver, FromRow, Result, Row, RowLabeled, RowNames, Value,
};
use std::sync::Arc;
use time::OffsetDateTime;

/// Computes a default value, receives the instant frozen for the current call.
pub type DefaultFn = fn(OffsetDateTime) -> Value;

/// Descriptor of one mapped field.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// Column name.
    pub name: &'static str,
    /// Typed NULL describing the declared type of the field.
    pub value: Value,
    pub nullable: bool,
    pub primary_key: bool,
    pub default: Option<DefaultFn>,
}

impl ColumnDef {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Per-type field-descriptor table, built once and cached.
#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    /// Mapped columns, in field order.
    pub columns: Box<[ColumnDef]>,
    /// Fields never persisted.
    pub unmapped: Box<[&'static str]>,
    pub created_at: Option<&'static str>,
    pub updated_at: Option<&'static str>,
    /// Column names, shared by every row built for this table.
    pub labels: RowNames,
}

impl TableDef {
    pub fn new(
        name: &'static str,
        columns: Vec<ColumnDef>,
        unmapped: Vec<&'static str>,
        created_at: Option<&'static str>,
        updated_at: Option<&'static str>,
    ) -> Self {
        let labels: Arc<[String]> = columns.iter().map(|c| c.name.to_string()).collect();
        Self {
            name,
            columns: columns.into_boxed_slice(),
            unmapped: unmapped.into_boxed_slice(),
            created_at,
            updated_at,
            labels,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| c.primary_key)
    }
}

/// Snapshot of the values last known to be persisted.
///
/// Holds its own copy of the values, so it never aliases the live fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Origin(Option<Row>);

impl Origin {
    pub fn row(&self) -> Option<&Row> {
        self.0.as_ref()
    }
    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }
    pub fn replace(&mut self, row: Row) {
        self.0 = Some(row);
    }
    pub fn clear(&mut self) {
        self.0 = None;
    }
}

/// Changed columns with their current value.
pub type Changes = Vec<(&'static str, Value)>;

/// A persistent record.
///
/// Implemented by `#[derive(Entity)]`, which also implements [`FromRow`] so
/// hydrated entities start with a fresh origin.
pub trait Entity: FromRow {
    fn table() -> &'static TableDef;
    /// Current values of the mapped fields, aligned with `table().columns`.
    fn row(&self) -> Row;
    /// Assign a mapped field by column name.
    fn set_value(&mut self, column: &str, value: Value) -> Result<()>;
    fn origin_ref(&self) -> &Origin;
    fn origin_mut(&mut self) -> &mut Origin;

    fn table_name() -> &'static str {
        Self::table().name
    }

    fn primary_keys() -> Vec<&'static str> {
        Self::table().primary_keys().map(|c| c.name).collect()
    }

    fn unmaps() -> &'static [&'static str] {
        &Self::table().unmapped
    }

    /// Declared defaults evaluated at `now`.
    fn defaults(now: OffsetDateTime) -> Vec<(&'static str, Value)> {
        Self::table()
            .columns
            .iter()
            .filter_map(|c| c.default.map(|f| (c.name, f(now))))
            .collect()
    }

    fn value(&self, column: &str) -> Option<Value> {
        let index = Self::table().column_index(column)?;
        self.row().into_vec().into_iter().nth(index)
    }

    fn row_labeled(&self) -> RowLabeled {
        RowLabeled::new(Self::table().labels.clone(), self.row())
    }

    /// Mapped fields differing from the origin, every mapped field when
    /// there is no origin.
    fn changes(&self) -> Changes {
        let table = Self::table();
        let origin = self.origin_ref().row();
        self.row()
            .into_vec()
            .into_iter()
            .enumerate()
            .filter(|(i, v)| origin.is_none_or(|o| o.get(*i) != Some(v)))
            .map(|(i, v)| (table.columns[i].name, v))
            .collect()
    }

    fn is_dirty(&self) -> bool {
        !self.origin_ref().is_some() || !self.changes().is_empty()
    }

    /// The origin as an entity of its own, `None` for unsaved entities.
    fn origin(&self) -> Result<Option<Self>> {
        let Some(row) = self.origin_ref().row() else {
            return Ok(None);
        };
        let mut entity = Self::from_row(RowLabeled::new(
            Self::table().labels.clone(),
            row.clone(),
        ))?;
        entity.origin_mut().replace(row.clone());
        Ok(Some(entity))
    }

    /// Replace the origin with the current values of `origin`, or forget it.
    fn set_origin(&mut self, origin: Option<&Self>) {
        match origin {
            Some(v) => self.origin_mut().replace(v.row()),
            None => self.origin_mut().clear(),
        }
    }

    /// Mark the current values as persisted.
    fn snapshot(&mut self) {
        let row = self.row();
        self.origin_mut().replace(row);
    }

    fn create<D: Driver>(self, connection: &mut Connection<D>) -> Result<(Self, bool)> {
        connection.create(self, None)
    }

    fn update<D: Driver>(self, connection: &mut Connection<D>) -> Result<(Self, bool)> {
        connection.update(self, None)
    }

    /// Create when never persisted, update otherwise.
    fn save<D: Driver>(self, connection: &mut Connection<D>) -> Result<(Self, bool)> {
        connection.save(self, None)
    }

    fn delete<D: Driver>(&self, connection: &mut Connection<D>) -> Result<bool> {
        connection.delete(self)
    }
}

pub(crate) fn require_primary_keys<E: Entity>() -> Result<Vec<&'static ColumnDef>> {
    let result: Vec<_> = E::table().primary_keys().collect();
    if result.is_empty() {
        return Err(DatabaseError::Entity(format!(
            "Entity `{}` does not declare a primary key",
            E::table_name()
        ))
        .into());
    }
    Ok(result)
}
