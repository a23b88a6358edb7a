use async_trait::async_trait;
use tokio::sync::mpsc;

use super::StoreError;
use super::models::{QueryResult, StoreNotice};

/// The single shared connection every request handler goes through.
#[async_trait]
pub trait StoreConnection: Send + Sync {
    async fn execute(&self, query: &str) -> Result<QueryResult, StoreError>;

    async fn table_exists(&self, table: &str) -> Result<bool, StoreError>;

    /// Hands out the receiving end of the store's "finished processing"
    /// channel. The channel is unbounded with a single consumer, so only the
    /// first call returns `Some`.
    fn take_notices(&self) -> Option<mpsc::UnboundedReceiver<StoreNotice>>;
}
