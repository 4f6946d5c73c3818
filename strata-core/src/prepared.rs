use crate::{
    ColumnMeta, Converter, DatabaseError, Error, FromRow, MaterializedResultSet, Params,
    QueryLogger, Result, RowLabeled, SqlWriter, Statement,
};
use std::{ops::ControlFlow, time::Instant};

/// Attach the printable statement to an engine error and report it.
pub(crate) fn execution_error(
    logger: &QueryLogger,
    writer: &dyn SqlWriter,
    sql: &str,
    params: &Params,
    error: Error,
) -> Error {
    let query = logger.printable(writer, sql, params);
    let error = error.context(DatabaseError::Execution { query });
    log::error!("{:#}", error);
    error
}

/// Build `T` out of a raw row, every value going through the converter first.
pub(crate) fn hydrate<T: FromRow>(
    converter: &dyn Converter,
    columns: &[ColumnMeta],
    mut row: RowLabeled,
) -> Result<T> {
    for (i, value) in row.values.iter_mut().enumerate() {
        let name = &row.labels[i];
        let column = columns
            .get(i)
            .cloned()
            .unwrap_or_else(|| ColumnMeta::new(name.as_str()));
        *value = converter.to_native(std::mem::take(value), &column, T::declared_type(name))?;
    }
    let mut result = T::from_row(row)?;
    result.hydrated();
    Ok(result)
}

/// A statement prepared on a connection, with its parameters bound.
///
/// Borrows the connection mutably: no other statement can run until this one
/// is dropped.
pub struct PreparedStatement<'c, S: Statement> {
    statement: S,
    sql: String,
    params: Params,
    writer: &'c dyn SqlWriter,
    converter: &'c dyn Converter,
    logger: &'c QueryLogger,
}

impl<'c, S: Statement> PreparedStatement<'c, S> {
    pub(crate) fn new(
        statement: S,
        sql: String,
        writer: &'c dyn SqlWriter,
        converter: &'c dyn Converter,
        logger: &'c QueryLogger,
    ) -> Self {
        Self {
            statement,
            sql,
            params: Params::new(),
            writer,
            converter,
            logger,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The statement with its parameters substituted, for diagnostics only.
    pub fn printable(&self) -> String {
        self.logger.printable(self.writer, &self.sql, &self.params)
    }

    fn fail(&self, error: Error) -> Error {
        execution_error(self.logger, self.writer, &self.sql, &self.params, error)
    }

    /// Bind every parameter, replacing previously bound values with the same
    /// name.
    pub fn bind(&mut self, params: Params) -> Result<&mut Self> {
        for (name, value) in params {
            let value = if value.is_inferred() {
                self.converter.to_parameter(value.into_value())
            } else {
                value
            };
            let bound = self.statement.bind(&name, &value).map(|_| ());
            self.params.insert(name, value);
            if let Err(e) = bound {
                return Err(self.fail(e));
            }
        }
        Ok(self)
    }

    /// Run a statement returning no rows, gives the number of affected rows.
    pub fn execute(&mut self) -> Result<u64> {
        let started = Instant::now();
        match self.statement.execute() {
            Ok(affected) => {
                self.logger
                    .log(self.writer, &self.sql, &self.params, started.elapsed());
                Ok(affected)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Push hydrated rows into `f` until it breaks or the rows end. Errors
    /// returned by `f` come back unchanged.
    pub fn each<T, F>(&mut self, mut f: F) -> Result<()>
    where
        T: FromRow,
        F: FnMut(T) -> Result<ControlFlow<()>>,
    {
        let columns = self.statement.columns();
        let converter = self.converter;
        let mut failure = None;
        let started = Instant::now();
        let result = self.statement.fetch(&mut |row| {
            match hydrate::<T>(converter, &columns, row).and_then(&mut f) {
                Ok(flow) => Ok(flow),
                Err(e) => {
                    failure = Some(e);
                    Ok(ControlFlow::Break(()))
                }
            }
        });
        if let Err(e) = result {
            return Err(self.fail(e));
        }
        self.logger
            .log(self.writer, &self.sql, &self.params, started.elapsed());
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn all<T: FromRow>(&mut self) -> Result<MaterializedResultSet<T>> {
        let mut result = MaterializedResultSet::default();
        self.each(|v| {
            result.push(v);
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(result)
    }

    /// Stops the cursor after the first row.
    pub fn first<T: FromRow>(&mut self) -> Result<Option<T>> {
        let mut result = None;
        self.each(|v| {
            result = Some(v);
            Ok(ControlFlow::Break(()))
        })?;
        Ok(result)
    }

    pub fn map<T, U, F>(&mut self, mut f: F) -> Result<MaterializedResultSet<U>>
    where
        T: FromRow,
        F: FnMut(T) -> Result<U>,
    {
        let mut result = MaterializedResultSet::default();
        self.each(|v| {
            result.push(f(v)?);
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(result)
    }

    pub fn filter<T, F>(&mut self, mut f: F) -> Result<MaterializedResultSet<T>>
    where
        T: FromRow,
        F: FnMut(&T) -> bool,
    {
        let mut result = MaterializedResultSet::default();
        self.each(|v| {
            if f(&v) {
                result.push(v);
            }
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(result)
    }

    pub fn reduce<T, A, F>(&mut self, seed: A, mut f: F) -> Result<A>
    where
        T: FromRow,
        F: FnMut(A, T) -> Result<A>,
    {
        let mut accumulator = Some(seed);
        self.each(|v| {
            if let Some(current) = accumulator.take() {
                accumulator = Some(f(current, v)?);
            }
            Ok(ControlFlow::Continue(()))
        })?;
        accumulator.ok_or_else(|| Error::msg("Reduce lost its accumulator"))
    }
}
