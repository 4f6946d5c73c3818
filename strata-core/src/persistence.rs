use crate::{
    Aliases, ColumnMeta, ConditionFragment, Connection, Converter, Criteria, Driver, Entity,
    Error, Event, Handle, MaterializedResultSet, OrderColumns, Pager, Params, QueryFragment,
    Result, SqlWriter, TableDef, Value, entity::require_primary_keys, timestamp_value,
};
use std::collections::btree_map::Entry;
use time::OffsetDateTime;

/// `pk = :w0 AND ...` over `values`, a row aligned with the table columns.
fn primary_condition<E: Entity>(
    writer: &dyn SqlWriter,
    converter: &dyn Converter,
    values: &[Value],
) -> Result<ConditionFragment> {
    let table = E::table();
    let mut sql = String::new();
    let mut params = Params::new();
    for (i, column) in require_primary_keys::<E>()?.into_iter().enumerate() {
        if i > 0 {
            sql.push_str(" AND ");
        }
        let name = format!("w{i}");
        writer.write_identifier_quoted(&mut sql, column.name);
        sql.push_str(" = ");
        writer.write_placeholder(&mut sql, &name);
        let value = table
            .column_index(column.name)
            .and_then(|i| values.get(i))
            .cloned()
            .unwrap_or_default();
        params.insert(name, converter.to_parameter(value));
    }
    Ok(params
        .into_iter()
        .fold(ConditionFragment::new(sql), |c, (k, v)| {
            c.with_typed_param(k, v)
        }))
}

/// Single-entity writes are expected to touch exactly one row.
fn soft_failure(operation: &str, table: &TableDef, affected: u64) {
    if affected == 0 {
        log::info!("{operation} on `{}` affected no rows", table.name);
    } else {
        log::error!(
            "{operation} on `{}` affected {affected} rows instead of one",
            table.name
        );
    }
}

/// Column to placeholder pairs, the shape the writer expects.
fn placeholders<'a>(columns: &'a [(&'a str, String)]) -> Vec<(&'a str, &'a str)> {
    columns.iter().map(|(c, p)| (*c, p.as_str())).collect()
}

fn add_params(params: &mut Params, more: Params) -> Result<()> {
    for (name, value) in more {
        match params.entry(name) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(entry) => {
                return Err(Error::msg(format!(
                    "Parameter `:{}` is used by both the values and the condition",
                    entry.key()
                )));
            }
        }
    }
    Ok(())
}

impl<D: Driver> Connection<D> {
    /// Primary key condition of `entity`, taken from its origin when it has
    /// one, so a modified key still finds the stored row.
    pub fn build_primary_wheres<E: Entity>(&self, entity: &E) -> Result<ConditionFragment> {
        let current;
        let values = match entity.origin_ref().row() {
            Some(v) => v,
            None => {
                current = entity.row();
                &current
            }
        };
        primary_condition::<E>(self.writer.as_dyn(), &*self.converter, values)
    }

    /// Insert a new row. Gives `false` when the engine does not report
    /// exactly one inserted row.
    pub fn create<E: Entity>(
        &mut self,
        mut entity: E,
        now: Option<OffsetDateTime>,
    ) -> Result<(E, bool)> {
        let table = E::table();
        let now = self.freeze(now);
        self.dispatch(Event::Creating {
            table,
            row: &entity.row(),
        });
        if let Some(column) = table.created_at.and_then(|v| table.column(v))
            && entity.value(column.name).is_none_or(|v| v.is_null())
        {
            entity.set_value(column.name, timestamp_value(&column.value, now))?;
        }
        for (name, value) in E::defaults(now) {
            if entity.value(name).is_none_or(|v| v.is_null()) {
                entity.set_value(name, value)?;
            }
        }
        let row = entity.row();
        let mut columns = Vec::with_capacity(row.len());
        let mut params = Params::new();
        for (i, (column, value)) in table.columns.iter().zip(row.iter()).enumerate() {
            if column.primary_key && value.is_null() {
                continue;
            }
            let name = format!("v{i}");
            params.insert(name.clone(), self.converter.to_parameter(value.clone()));
            columns.push((column.name, name));
        }
        let mut sql = String::with_capacity(128);
        self.writer
            .write_insert(&mut sql, table.name, &placeholders(&columns));
        let affected = self
            .prepare(QueryFragment::from_parts(sql, params))?
            .execute()?;
        if affected != 1 {
            soft_failure("Create", table, affected);
            return Ok((entity, false));
        }
        let mut keys = table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.primary_key);
        if let (Some((i, column)), None) = (keys.next(), keys.next())
            && row[i].is_null()
        {
            let raw = self.handle()?.last_insert_id()?;
            let value =
                self.converter
                    .to_native(raw, &ColumnMeta::new(column.name), Some(&column.value))?;
            entity.set_value(column.name, value)?;
        }
        entity.snapshot();
        self.dispatch(Event::Created {
            table,
            row: &entity.row(),
        });
        Ok((entity, true))
    }

    /// Write the changed fields. Nothing to write is a success, unless an
    /// update timestamp is declared, which is then refreshed.
    pub fn update<E: Entity>(
        &mut self,
        mut entity: E,
        now: Option<OffsetDateTime>,
    ) -> Result<(E, bool)> {
        let table = E::table();
        let now = self.freeze(now);
        let condition = self.build_primary_wheres(&entity)?;
        let mut changes = entity.changes();
        if let Some(column) = table.updated_at.and_then(|v| table.column(v))
            && !changes.iter().any(|(c, _)| *c == column.name)
        {
            let value = timestamp_value(&column.value, now);
            entity.set_value(column.name, value.clone())?;
            changes.push((column.name, value));
        }
        self.dispatch(Event::Updating {
            table,
            changes: &changes,
        });
        if changes.is_empty() {
            log::debug!("Update on `{}` skipped, nothing changed", table.name);
            return Ok((entity, true));
        }
        let (condition, mut params) = condition.into_parts();
        let mut sets = Vec::with_capacity(changes.len());
        let mut values = Params::new();
        for (i, (column, value)) in changes.iter().enumerate() {
            let name = format!("s{i}");
            values.insert(name.clone(), self.converter.to_parameter(value.clone()));
            sets.push((*column, name));
        }
        add_params(&mut params, values)?;
        let mut sql = String::with_capacity(128);
        self.writer
            .write_update(&mut sql, table.name, &placeholders(&sets), &condition);
        let affected = self
            .prepare(QueryFragment::from_parts(sql, params))?
            .execute()?;
        if affected != 1 {
            soft_failure("Update", table, affected);
            return Ok((entity, false));
        }
        entity.snapshot();
        self.dispatch(Event::Updated {
            table,
            changes: &changes,
        });
        Ok((entity, true))
    }

    /// Create entities never persisted, update the others.
    pub fn save<E: Entity>(&mut self, entity: E, now: Option<OffsetDateTime>) -> Result<(E, bool)> {
        if entity.origin_ref().is_some() {
            self.update(entity, now)
        } else {
            self.create(entity, now)
        }
    }

    /// Delete the row with the current primary key of `entity`.
    pub fn delete<E: Entity>(&mut self, entity: &E) -> Result<bool> {
        let table = E::table();
        let row = entity.row();
        let condition = primary_condition::<E>(self.writer.as_dyn(), &*self.converter, &row)?;
        self.dispatch(Event::Deleting { table, row: &row });
        let (condition, params) = condition.into_parts();
        let mut sql = String::with_capacity(64);
        self.writer.write_delete(&mut sql, table.name, &condition);
        let affected = self
            .prepare(QueryFragment::from_parts(sql, params))?
            .execute()?;
        if affected != 1 {
            soft_failure("Delete", table, affected);
            return Ok(false);
        }
        self.dispatch(Event::Deleted { table, row: &row });
        Ok(true)
    }

    fn criteria_condition(
        &self,
        criteria: &Criteria,
        aliases: Option<&Aliases>,
    ) -> Result<ConditionFragment> {
        self.ransacker
            .build(self.writer.as_dyn(), criteria, aliases)
    }

    /// Update every row matching `criteria`, gives the number of rows updated.
    pub fn updates<E: Entity>(
        &mut self,
        changes: &[(&str, Value)],
        criteria: &Criteria,
        aliases: Option<&Aliases>,
        now: Option<OffsetDateTime>,
    ) -> Result<u64> {
        let table = E::table();
        let now = self.freeze(now);
        let condition = self.criteria_condition(criteria, aliases)?;
        let mut changes = changes.to_vec();
        if let Some(column) = table.updated_at.and_then(|v| table.column(v))
            && !changes.iter().any(|(c, _)| *c == column.name)
        {
            changes.push((column.name, timestamp_value(&column.value, now)));
        }
        if changes.is_empty() {
            return Err(Error::msg(format!(
                "Batch update on `{}` without any value to set",
                table.name
            )));
        }
        self.dispatch(Event::BatchUpdating {
            table,
            changes: &changes,
            condition: &condition,
        });
        let mut params = condition.params().clone();
        let mut sets = Vec::with_capacity(changes.len());
        let mut values = Params::new();
        for (i, (column, value)) in changes.iter().enumerate() {
            let name = format!("s{i}");
            values.insert(name.clone(), self.converter.to_parameter(value.clone()));
            sets.push((*column, name));
        }
        add_params(&mut params, values)?;
        let mut sql = String::with_capacity(128);
        self.writer
            .write_update(&mut sql, table.name, &placeholders(&sets), condition.sql());
        let affected = self
            .prepare(QueryFragment::from_parts(sql, params))?
            .execute()?;
        if affected > 0 {
            self.dispatch(Event::BatchUpdated {
                table,
                changes: &changes,
                condition: &condition,
                affected,
            });
        }
        Ok(affected)
    }

    /// Delete every row matching `criteria`, gives the number of rows deleted.
    pub fn deletes<E: Entity>(
        &mut self,
        criteria: &Criteria,
        aliases: Option<&Aliases>,
    ) -> Result<u64> {
        let table = E::table();
        let condition = self.criteria_condition(criteria, aliases)?;
        self.dispatch(Event::BatchDeleting {
            table,
            condition: &condition,
        });
        let mut sql = String::with_capacity(64);
        self.writer
            .write_delete(&mut sql, table.name, condition.sql());
        let affected = self
            .prepare(QueryFragment::from_parts(sql, condition.params().clone()))?
            .execute()?;
        if affected > 0 {
            self.dispatch(Event::BatchDeleted {
                table,
                condition: &condition,
                affected,
            });
        }
        Ok(affected)
    }

    pub fn exists<E: Entity>(
        &mut self,
        criteria: &Criteria,
        aliases: Option<&Aliases>,
    ) -> Result<bool> {
        let (condition, params) = self.criteria_condition(criteria, aliases)?.into_parts();
        let mut sql = String::with_capacity(64);
        self.writer
            .write_select_exists(&mut sql, E::table_name(), &condition);
        self.exist(QueryFragment::from_parts(sql, params))
    }

    pub fn counts<E: Entity>(
        &mut self,
        criteria: &Criteria,
        aliases: Option<&Aliases>,
    ) -> Result<u64> {
        let (condition, params) = self.criteria_condition(criteria, aliases)?.into_parts();
        let mut sql = String::with_capacity(64);
        self.writer
            .write_select_count(&mut sql, E::table_name(), &condition);
        let total = self
            .get::<i64>(QueryFragment::from_parts(sql, params))?
            .unwrap_or_default();
        Ok(u64::try_from(total)?)
    }

    /// Entities matching `criteria`.
    pub fn selects<E: Entity>(
        &mut self,
        criteria: &Criteria,
        aliases: Option<&Aliases>,
        order_by: Option<&OrderColumns>,
        pager: Option<&Pager>,
    ) -> Result<MaterializedResultSet<E>> {
        let (condition, params) = self.criteria_condition(criteria, aliases)?.into_parts();
        let mut sql = String::with_capacity(64);
        self.writer
            .write_select_all(&mut sql, E::table_name(), &condition);
        self.select(QueryFragment::from_parts(sql, params), order_by, pager)
    }

    /// First entity matching `criteria`.
    pub fn finds<E: Entity>(
        &mut self,
        criteria: &Criteria,
        aliases: Option<&Aliases>,
    ) -> Result<Option<E>> {
        let (condition, params) = self.criteria_condition(criteria, aliases)?.into_parts();
        let mut sql = String::with_capacity(64);
        self.writer
            .write_select_all(&mut sql, E::table_name(), &condition);
        self.find(QueryFragment::from_parts(sql, params))
    }
}
