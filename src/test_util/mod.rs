use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::{
    event::{Level, LogEvent},
    sinks::azure_table::{TableBatch, TableClient},
};

pub fn trace_init() {
    let color = std::io::IsTerminal::is_terminal(&std::io::stdout());
    let levels = std::env::var("TEST_LOG").unwrap_or_else(|_| "error".to_owned());

    crate::trace::init(color, false, &levels);
}

/// A fixed, whole-second timestamp to build test events around.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap()
}

pub fn log_event(timestamp: DateTime<Utc>, message: &str) -> LogEvent {
    LogEvent::new(timestamp, Level::Information, "{Message}").with_property("Message", message)
}

#[derive(Debug)]
pub struct TestError(pub &'static str);

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for TestError {}

#[derive(Debug, Default)]
struct Recorded {
    tables: Vec<String>,
    batches: Vec<(String, TableBatch)>,
    create_failure: Option<&'static str>,
    submit_failures: VecDeque<Option<&'static str>>,
}

/// An in-memory table service client that records every call.
#[derive(Clone, Debug, Default)]
pub struct RecordingTableClient {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingTableClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes table creation fail with `message`.
    pub fn fail_create(&self, message: &'static str) {
        self.inner.lock().unwrap().create_failure = Some(message);
    }

    /// Scripts the outcome of the next submissions in order: `None` succeeds, `Some` fails with
    /// the message. Submissions beyond the script succeed.
    pub fn script_submissions(&self, outcomes: impl IntoIterator<Item = Option<&'static str>>) {
        self.inner.lock().unwrap().submit_failures.extend(outcomes);
    }

    pub fn tables(&self) -> Vec<String> {
        self.inner.lock().unwrap().tables.clone()
    }

    pub fn batches(&self) -> Vec<TableBatch> {
        self.inner
            .lock()
            .unwrap()
            .batches
            .iter()
            .map(|(_, batch)| batch.clone())
            .collect()
    }

    pub fn submitted_tables(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .batches
            .iter()
            .map(|(table, _)| table.clone())
            .collect()
    }
}

#[async_trait]
impl TableClient for RecordingTableClient {
    async fn create_table_if_not_exists(&self, table: &str) -> crate::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = inner.create_failure {
            return Err(Box::new(TestError(message)));
        }
        inner.tables.push(table.to_owned());
        Ok(())
    }

    async fn submit_batch(&self, table: &str, batch: TableBatch) -> crate::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(Some(message)) = inner.submit_failures.pop_front() {
            return Err(Box::new(TestError(message)));
        }
        inner.batches.push((table.to_owned(), batch));
        Ok(())
    }
}
