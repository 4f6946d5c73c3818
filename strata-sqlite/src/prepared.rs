use crate::extract::extract_value;
use rusqlite::types::Null;
use std::{ops::ControlFlow, sync::Arc};
use strata_core::{
    BindType, ColumnMeta, Error, Result, RowLabeled, RowNames, Statement, TypedParameter, Value,
};

pub struct SqliteStatement<'h> {
    pub(crate) statement: rusqlite::Statement<'h>,
}

impl<'h> SqliteStatement<'h> {
    pub(crate) fn new(statement: rusqlite::Statement<'h>) -> Self {
        Self { statement }
    }
}

impl Statement for SqliteStatement<'_> {
    fn bind(&mut self, name: &str, value: &TypedParameter) -> Result<&mut Self> {
        let Some(index) = self.statement.parameter_index(&format!(":{name}"))? else {
            return Err(Error::msg(format!(
                "Parameter `:{name}` does not appear in the statement"
            )));
        };
        let statement = &mut self.statement;
        match (value.bind_type(), value.value()) {
            (BindType::Null, _) => statement.raw_bind_parameter(index, Null)?,
            (BindType::Boolean, Value::Boolean(Some(v))) => {
                statement.raw_bind_parameter(index, *v as i64)?
            }
            (BindType::Integer, Value::Int32(Some(v))) => statement.raw_bind_parameter(index, *v)?,
            (BindType::Integer, Value::Int64(Some(v))) => statement.raw_bind_parameter(index, *v)?,
            (BindType::LargeObject, Value::Blob(Some(v))) => {
                statement.raw_bind_parameter(index, &v[..])?
            }
            (_, Value::Float64(Some(v))) => statement.raw_bind_parameter(index, *v)?,
            (_, v) => statement.raw_bind_parameter(index, v.to_string())?,
        }
        Ok(self)
    }

    fn execute(&mut self) -> Result<u64> {
        Ok(self.statement.raw_execute()? as u64)
    }

    fn columns(&self) -> Vec<ColumnMeta> {
        self.statement
            .columns()
            .into_iter()
            .map(|c| ColumnMeta {
                name: c.name().to_string(),
                declared_type: c.decl_type().map(str::to_string),
            })
            .collect()
    }

    fn fetch(
        &mut self,
        callback: &mut dyn FnMut(RowLabeled) -> Result<ControlFlow<()>>,
    ) -> Result<()> {
        let labels: RowNames = self
            .statement
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Arc<[_]>>();
        let count = labels.len();
        let mut rows = self.statement.raw_query();
        while let Some(row) = rows.next()? {
            let values = (0..count)
                .map(|i| extract_value(row.get_ref(i)?))
                .collect::<Result<Box<[_]>>>()?;
            if callback(RowLabeled::new(labels.clone(), values))?.is_break() {
                break;
            }
        }
        Ok(())
    }
}
