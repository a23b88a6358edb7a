use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::sqlite::SqliteConnection;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use super::{QueryResult, StoreConnection, StoreError, StoreNotice};

// Selects run through the sqlite backend must project a single `value` column.
#[derive(Debug, QueryableByName)]
struct ValueRow {
    #[diesel(sql_type = Nullable<Text>)]
    value: Option<String>,
}

#[derive(Debug, QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

fn establish_connection(path: &str) -> Result<SqliteConnection, StoreError> {
    SqliteConnection::establish(path).map_err(|e| StoreError::Connection(e.to_string()))
}

fn is_select(query: &str) -> bool {
    query
        .trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("select"))
}

/// SQLite store over one shared connection. Writes always complete
/// synchronously, so nothing is ever sent on its notice channel.
pub struct SqliteStore {
    conn: Arc<Mutex<SqliteConnection>>,
    // Held so the listener's receiver stays open for the store's lifetime.
    _notices: mpsc::UnboundedSender<StoreNotice>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<StoreNotice>>>,
}

impl SqliteStore {
    pub fn connect(path: &str) -> Result<Self, StoreError> {
        let conn = establish_connection(path)?;
        let (notices, receiver) = mpsc::unbounded_channel();
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            _notices: notices,
            receiver: Mutex::new(Some(receiver)),
        })
    }
}

#[async_trait]
impl StoreConnection for SqliteStore {
    async fn execute(&self, query: &str) -> Result<QueryResult, StoreError> {
        let query = query.to_string();
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            if is_select(&query) {
                let rows = diesel::sql_query(query)
                    .load::<ValueRow>(&mut *conn)
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                Ok(QueryResult::with_rows(
                    rows.into_iter()
                        .map(|row| HashMap::from([("value".to_string(), row.value)]))
                        .collect(),
                ))
            } else {
                let affected = diesel::sql_query(query)
                    .execute(&mut *conn)
                    .map_err(|e| StoreError::Query(e.to_string()))?;
                debug!("sqlite statement affected {} rows", affected);
                Ok(QueryResult::empty())
            }
        })
        .await
        .map_err(|e| StoreError::Task(format!("sqlite task failed: {e}")))?
    }

    async fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        let table = table.to_string();
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock();
            let row = diesel::sql_query(
                "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind::<Text, _>(table)
            .get_result::<CountRow>(&mut *conn)
            .map_err(|e| StoreError::Query(e.to_string()))?;
            Ok(row.count > 0)
        })
        .await
        .map_err(|e| StoreError::Task(format!("sqlite task failed: {e}")))?
    }

    fn take_notices(&self) -> Option<mpsc::UnboundedReceiver<StoreNotice>> {
        self.receiver.lock().take()
    }
}
