//! Common test utilities and mocks
#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use sqlfan_core::{
    ConnectionParams, Cursor, Driver, ImageInput, Result, Row, Session, SessionFactory,
    SqlfanError, Table, TableLoader, TableTarget, Value, VisionModel,
};

/// Scripted response for statements containing a pattern
#[derive(Clone)]
pub enum Response {
    Rows(Vec<Row>),
    Error(SqlfanError),
}

/// Shared state of a mock warehouse: scripted responses and a log of every
/// executed statement, connect and close.
#[derive(Default)]
pub struct MockWarehouse {
    /// SQL-pattern-based responses: the first pattern contained in the
    /// statement wins. Unmatched statements return no rows.
    pub responses: parking_lot::Mutex<Vec<(String, Response)>>,
    pub query_log: parking_lot::Mutex<Vec<String>>,
    pub connects: AtomicUsize,
    pub closes: AtomicUsize,
    pub refuse_connections: parking_lot::Mutex<bool>,
    /// Connection params seen by the driver interface
    pub connected_with: parking_lot::Mutex<Vec<ConnectionParams>>,
}

impl MockWarehouse {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, sql_contains: impl Into<String>, rows: Vec<Row>) {
        self.responses
            .lock()
            .push((sql_contains.into(), Response::Rows(rows)));
    }

    pub fn fail(&self, sql_contains: impl Into<String>, error: SqlfanError) {
        self.responses
            .lock()
            .push((sql_contains.into(), Response::Error(error)));
    }

    pub fn refuse_connections(&self) {
        *self.refuse_connections.lock() = true;
    }

    pub fn query_log(&self) -> Vec<String> {
        self.query_log.lock().clone()
    }

    pub fn query_count(&self) -> usize {
        self.query_log.lock().len()
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn open(self: &Arc<Self>) -> Result<Box<dyn Session>> {
        if *self.refuse_connections.lock() {
            return Err(SqlfanError::Connection("account is locked".into()));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            warehouse: self.clone(),
        }))
    }
}

pub struct MockSession {
    warehouse: Arc<MockWarehouse>,
}

struct MockCursor(Vec<Row>);

#[async_trait]
impl Cursor for MockCursor {
    async fn fetch_all(self: Box<Self>) -> Result<Vec<Row>> {
        Ok(self.0)
    }
}

#[async_trait]
impl Session for MockSession {
    async fn execute(&self, sql: &str) -> Result<Box<dyn Cursor>> {
        self.warehouse.query_log.lock().push(sql.to_string());
        let response = self
            .warehouse
            .responses
            .lock()
            .iter()
            .find(|(pattern, _)| sql.contains(pattern.as_str()))
            .map(|(_, response)| response.clone());

        match response {
            Some(Response::Rows(rows)) => Ok(Box::new(MockCursor(rows))),
            Some(Response::Error(e)) => Err(e),
            None => Ok(Box::new(MockCursor(Vec::new()))),
        }
    }

    async fn close(&self) -> Result<()> {
        self.warehouse.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

/// Session factory over a mock warehouse
pub struct MockFactory(pub Arc<MockWarehouse>);

#[async_trait]
impl SessionFactory for MockFactory {
    async fn connect(&self) -> Result<Box<dyn Session>> {
        self.0.open()
    }
}

/// Driver over a mock warehouse, recording the params it was given
pub struct MockDriver(pub Arc<MockWarehouse>);

#[async_trait]
impl Driver for MockDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn connect(&self, params: &ConnectionParams) -> Result<Box<dyn Session>> {
        self.0.connected_with.lock().push(params.clone());
        self.0.open()
    }
}

/// Table loader recording every write
#[derive(Default)]
pub struct MockLoader {
    pub writes: parking_lot::Mutex<Vec<(TableTarget, Table, bool)>>,
    /// Tables whose writes fail
    pub failing_tables: parking_lot::Mutex<Vec<String>>,
}

impl MockLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_table(&self, table: impl Into<String>) {
        self.failing_tables.lock().push(table.into());
    }

    pub fn writes(&self) -> Vec<(TableTarget, Table, bool)> {
        self.writes.lock().clone()
    }
}

#[async_trait]
impl TableLoader for MockLoader {
    async fn write_table(&self, table: &Table, target: &TableTarget, auto_create: bool) -> Result<u64> {
        if self.failing_tables.lock().contains(&target.table) {
            return Err(SqlfanError::Query(format!(
                "Table '{}' does not exist or not authorized.",
                target.table
            )));
        }
        self.writes
            .lock()
            .push((target.clone(), table.clone(), auto_create));
        Ok(table.row_count() as u64)
    }
}

/// Vision model answering with a fixed text
pub struct MockVision {
    pub answer: Result<String>,
    pub calls: parking_lot::Mutex<Vec<(String, String, String)>>,
}

impl MockVision {
    pub fn answering(answer: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(answer.to_string()),
            calls: parking_lot::Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(SqlfanError::Other(message.to_string())),
            calls: parking_lot::Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl VisionModel for MockVision {
    async fn ask(&self, prompt: &str, image: &ImageInput, question: &str) -> Result<String> {
        self.calls.lock().push((
            prompt.to_string(),
            image.mime_type.clone(),
            question.to_string(),
        ));
        self.answer.clone()
    }
}

/// A `SHOW`-style row: `created_on` first, then the name
pub fn name_row(name: &str) -> Row {
    Row::from_pairs([("created_on", Value::Null), ("name", Value::from(name))])
}

pub fn params(database: &str, schema: &str) -> ConnectionParams {
    ConnectionParams {
        account: "xy12345".into(),
        role: "SYSADMIN".into(),
        warehouse: "COMPUTE_WH".into(),
        database: database.into(),
        schema: schema.into(),
        user: "loader".into(),
        password: "secret".into(),
    }
}
