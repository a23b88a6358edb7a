use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{QueryResult, StoreConnection, StoreError, StoreNotice};

/// Store double that replays queued responses and records every query.
pub(crate) struct ScriptedStore {
    responses: Mutex<VecDeque<Result<QueryResult, StoreError>>>,
    queries: Mutex<Vec<String>>,
    existing_tables: Mutex<Vec<String>>,
    notices: mpsc::UnboundedSender<StoreNotice>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<StoreNotice>>>,
}

impl ScriptedStore {
    pub(crate) fn new() -> Self {
        let (notices, receiver) = mpsc::unbounded_channel();
        Self {
            responses: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            existing_tables: Mutex::new(Vec::new()),
            notices,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    pub(crate) fn push(&self, response: Result<QueryResult, StoreError>) {
        self.responses.lock().push_back(response);
    }

    pub(crate) fn push_delayed(&self, token: &str) {
        self.push(Ok(QueryResult::delayed(token)));
    }

    pub(crate) fn with_table(self, table: &str) -> Self {
        self.existing_tables.lock().push(table.to_string());
        self
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    pub(crate) fn emit(&self, message: &str) {
        let _ = self.notices.send(StoreNotice::new(message));
    }
}

#[async_trait]
impl StoreConnection for ScriptedStore {
    async fn execute(&self, query: &str) -> Result<QueryResult, StoreError> {
        self.queries.lock().push(query.to_string());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryResult::empty()))
    }

    async fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        Ok(self.existing_tables.lock().iter().any(|t| t == table))
    }

    fn take_notices(&self) -> Option<mpsc::UnboundedReceiver<StoreNotice>> {
        self.receiver.lock().take()
    }
}
