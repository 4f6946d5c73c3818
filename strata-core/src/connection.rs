use crate::{
    AsValue, Clock, Compiler, ConnectionConfig, Converter, DatabaseError, DefaultCompiler,
    DefaultConverter, DefaultRansacker, Driver, Error, Event, EventBus, FromRow, Handle, LogHook,
    MaterializedResultSet, OrderColumns, Pager, Paginator, Params, PreparedStatement, QueryFragment,
    QueryLogger, Ransacker, Result, RowLabeled, SqlWriter, StatementOf, SystemClock, Value,
    prepared::execution_error,
};
use anyhow::Context;
use std::{ops::ControlFlow, time::Instant};
use time::OffsetDateTime;

pub(crate) fn connection_lost(name: &str) -> Error {
    DatabaseError::ConnectionLost { name: name.into() }.into()
}

/// A live database connection and the collaborators bound to it.
///
/// Every statement needs `&mut self`, a connection is used by one caller at
/// a time. Once closed, every operation fails with
/// [`DatabaseError::ConnectionLost`].
pub struct Connection<D: Driver> {
    pub(crate) name: String,
    pub(crate) handle: Option<D::Handle>,
    pub(crate) writer: D::SqlWriter,
    pub(crate) compiler: Box<dyn Compiler>,
    pub(crate) converter: Box<dyn Converter>,
    pub(crate) ransacker: Box<dyn Ransacker>,
    pub(crate) events: Option<Box<dyn EventBus>>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) logger: QueryLogger,
    pub(crate) in_transaction: bool,
    pub(crate) savepoints: Vec<String>,
}

impl<D: Driver> Connection<D> {
    /// Wrap an already opened handle, with the default collaborators.
    pub fn new(name: impl Into<String>, handle: D::Handle, writer: D::SqlWriter) -> Self {
        Self {
            name: name.into(),
            handle: Some(handle),
            writer,
            compiler: Box::new(DefaultCompiler),
            converter: Box::new(DefaultConverter),
            ransacker: Box::new(DefaultRansacker),
            events: None,
            clock: Box::new(SystemClock),
            logger: QueryLogger::default(),
            in_transaction: false,
            savepoints: Vec::new(),
        }
    }

    /// Connect through `driver` using the given configuration.
    pub fn open(driver: &D, name: impl Into<String>, config: &ConnectionConfig) -> Result<Self> {
        let name = name.into();
        let handle = driver.connect(&config.url).with_context(|| {
            format!("While opening connection `{}` with {}", name, D::NAME)
        })?;
        log::debug!("Connection `{}` opened with {}", name, D::NAME);
        let mut result = Self::new(name, handle, driver.sql_writer());
        result.logger.debug = config.debug;
        result.logger.emulate = config.emulate;
        Ok(result)
    }

    pub fn with_compiler(mut self, compiler: impl Compiler + 'static) -> Self {
        self.compiler = Box::new(compiler);
        self
    }

    pub fn with_converter(mut self, converter: impl Converter + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn with_ransacker(mut self, ransacker: impl Ransacker + 'static) -> Self {
        self.ransacker = Box::new(ransacker);
        self
    }

    pub fn with_event_bus(mut self, events: impl EventBus + 'static) -> Self {
        self.events = Some(Box::new(events));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the default debug logging of executed statements.
    pub fn with_log_hook(mut self, hook: LogHook) -> Self {
        self.logger.hook = Some(hook);
        self
    }

    pub fn set_log_hook(&mut self, hook: Option<LogHook>) {
        self.logger.hook = hook;
    }

    pub fn set_event_bus(&mut self, events: Option<Box<dyn EventBus>>) {
        self.events = events;
    }

    pub fn set_converter(&mut self, converter: impl Converter + 'static) {
        self.converter = Box::new(converter);
    }

    pub fn set_clock(&mut self, clock: impl Clock + 'static) {
        self.clock = Box::new(clock);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_none()
    }

    pub fn debug(&self) -> bool {
        self.logger.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.logger.debug = debug;
    }

    pub fn emulate(&self) -> bool {
        self.logger.emulate
    }

    pub fn set_emulate(&mut self, emulate: bool) {
        self.logger.emulate = emulate;
    }

    pub fn writer(&self) -> &D::SqlWriter {
        &self.writer
    }

    pub fn converter(&self) -> &dyn Converter {
        &*self.converter
    }

    pub fn handle(&mut self) -> Result<&mut D::Handle> {
        self.handle
            .as_mut()
            .ok_or_else(|| connection_lost(&self.name))
    }

    /// `now` or, when absent, the connection clock read once.
    pub(crate) fn freeze(&self, now: Option<OffsetDateTime>) -> OffsetDateTime {
        now.unwrap_or_else(|| self.clock.now())
    }

    pub(crate) fn dispatch(&self, event: Event<'_>) {
        if let Some(events) = &self.events {
            log::trace!("Dispatching `{}` for `{}`", event.name(), event.table().name);
            events.dispatch(&event);
        }
    }

    /// Roll back any open transaction, then release the handle. Closing a
    /// closed connection does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.handle.is_none() {
            return Ok(());
        }
        if self.in_transaction {
            self.rollback(None)?;
        } else if let Some(handle) = self.handle.as_mut() {
            // A transaction may have been opened with a raw statement
            let mut sql = String::new();
            self.writer.write_transaction_rollback(&mut sql);
            let started = Instant::now();
            match handle.execute_batch(&sql) {
                Ok(()) => {
                    self.logger
                        .log(&self.writer, &sql, &Params::new(), started.elapsed())
                }
                Err(e) => log::trace!("Nothing to roll back on `{}`: {:#}", self.name, e),
            }
        }
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        handle
            .close()
            .with_context(|| format!("While closing connection `{}`", self.name))?;
        log::debug!("Connection `{}` closed", self.name);
        Ok(())
    }

    /// Prepare an already compiled statement and bind its parameters.
    pub fn prepare(
        &mut self,
        query: impl Into<QueryFragment>,
    ) -> Result<PreparedStatement<'_, StatementOf<'_, D>>> {
        let (sql, params) = query.into().into_parts();
        let Some(handle) = self.handle.as_mut() else {
            return Err(connection_lost(&self.name));
        };
        let writer = self.writer.as_dyn();
        let statement = match handle.prepare(&sql) {
            Ok(v) => v,
            Err(e) => return Err(execution_error(&self.logger, writer, &sql, &params, e)),
        };
        let mut result =
            PreparedStatement::new(statement, sql, writer, &*self.converter, &self.logger);
        result.bind(params)?;
        Ok(result)
    }

    /// Compile `query` with the optional ordering and page, then prepare it.
    pub fn query(
        &mut self,
        query: impl Into<QueryFragment>,
        order_by: Option<&OrderColumns>,
        pager: Option<&Pager>,
    ) -> Result<PreparedStatement<'_, StatementOf<'_, D>>> {
        if self.handle.is_none() {
            return Err(connection_lost(&self.name));
        }
        let query = self
            .compiler
            .compile(self.writer.as_dyn(), query.into(), order_by, pager)?;
        self.prepare(query)
    }

    /// Run a statement returning no rows, gives the number of affected rows.
    pub fn execute(&mut self, query: impl Into<QueryFragment>) -> Result<u64> {
        self.query(query, None, None)?.execute()
    }

    pub fn select<T: FromRow>(
        &mut self,
        query: impl Into<QueryFragment>,
        order_by: Option<&OrderColumns>,
        pager: Option<&Pager>,
    ) -> Result<MaterializedResultSet<T>> {
        self.query(query, order_by, pager)?.all()
    }

    /// First row, the cursor stops right after it.
    pub fn find<T: FromRow>(&mut self, query: impl Into<QueryFragment>) -> Result<Option<T>> {
        self.query(query, None, None)?.first()
    }

    /// First column of every row.
    pub fn extract<V: AsValue>(
        &mut self,
        query: impl Into<QueryFragment>,
    ) -> Result<MaterializedResultSet<V>> {
        self.query(query, None, None)?
            .map(|v: Value| V::try_from_value(v))
    }

    /// First column of the first row.
    pub fn get<V: AsValue>(&mut self, query: impl Into<QueryFragment>) -> Result<Option<V>> {
        self.query(query, None, None)?
            .first::<Value>()?
            .map(V::try_from_value)
            .transpose()
    }

    pub fn exist(&mut self, query: impl Into<QueryFragment>) -> Result<bool> {
        Ok(self
            .query(query, None, None)?
            .first::<RowLabeled>()?
            .is_some())
    }

    /// Number of rows `query` returns, computed by the engine.
    pub fn count(&mut self, query: impl Into<QueryFragment>) -> Result<u64> {
        let (sql, params) = query.into().into_parts();
        let mut wrapped = String::with_capacity(sql.len() + 48);
        self.writer.write_count_wrapper(&mut wrapped, &sql);
        let total = self
            .get::<i64>(QueryFragment::from_parts(wrapped, params))?
            .unwrap_or_default();
        Ok(u64::try_from(total)?)
    }

    /// Push hydrated rows into `f` until it returns [`ControlFlow::Break`].
    pub fn each<T, F>(&mut self, query: impl Into<QueryFragment>, f: F) -> Result<()>
    where
        T: FromRow,
        F: FnMut(T) -> Result<ControlFlow<()>>,
    {
        self.query(query, None, None)?.each(f)
    }

    pub fn filter<T, F>(
        &mut self,
        query: impl Into<QueryFragment>,
        f: F,
    ) -> Result<MaterializedResultSet<T>>
    where
        T: FromRow,
        F: FnMut(&T) -> bool,
    {
        self.query(query, None, None)?.filter(f)
    }

    pub fn map<T, U, F>(
        &mut self,
        query: impl Into<QueryFragment>,
        f: F,
    ) -> Result<MaterializedResultSet<U>>
    where
        T: FromRow,
        F: FnMut(T) -> Result<U>,
    {
        self.query(query, None, None)?.map(f)
    }

    pub fn reduce<T, A, F>(&mut self, query: impl Into<QueryFragment>, seed: A, f: F) -> Result<A>
    where
        T: FromRow,
        F: FnMut(A, T) -> Result<A>,
    {
        self.query(query, None, None)?.reduce(seed, f)
    }

    /// One page of `query` together with the total number of rows.
    pub fn paginate<T: FromRow>(
        &mut self,
        query: impl Into<QueryFragment>,
        order_by: Option<&OrderColumns>,
        pager: Pager,
    ) -> Result<Paginator<T>> {
        let query = query.into();
        let total = self.count(query.clone())?;
        let items = self.select(query, order_by, Some(&pager))?;
        Ok(Paginator {
            items,
            page: self.compiler.paging(&pager, total),
        })
    }
}

impl<D: Driver> std::fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("name", &self.name)
            .field("driver", &D::NAME)
            .field("closed", &self.is_closed())
            .field("in_transaction", &self.in_transaction)
            .field("savepoints", &self.savepoints)
            .finish()
    }
}
