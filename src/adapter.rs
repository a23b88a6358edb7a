use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::CorrelationConfig;
use crate::correlation::{Claim, Correlator};
use crate::device::{DeviceProperties, PropertyKind, PropertyValue};
use crate::error::AdapterResult;
use crate::listener::NotificationListener;
use crate::metrics::Metrics;
use crate::query::{StateQueries, sanitize_identifier};
use crate::store::{QueryResult, StoreConnection};

pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Device state adapter shared by every request handler.
///
/// All callers go through one store connection. Writes the store delays are
/// completed through the [`Correlator`], whichever order the delay and its
/// finished notice are observed in.
pub struct DeviceStore {
    conn: Arc<dyn StoreConnection>,
    correlator: Arc<Correlator>,
    queries: StateQueries,
    kinds: RwLock<HashMap<(String, String), PropertyKind>>,
}

impl DeviceStore {
    pub fn new(conn: Arc<dyn StoreConnection>, correlator: Arc<Correlator>) -> Self {
        Self {
            conn,
            correlator,
            queries: StateQueries,
            kinds: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(conn: Arc<dyn StoreConnection>, config: &CorrelationConfig) -> Self {
        Self::new(conn, Arc::new(Correlator::from_config(config)))
    }

    pub fn correlator(&self) -> Arc<Correlator> {
        self.correlator.clone()
    }

    pub fn listener(&self) -> NotificationListener {
        NotificationListener::new(self.correlator.clone())
    }

    /// Takes the store's notice receiver and drains it on a background task.
    /// Notices the store queued before this call are not lost. Returns `None`
    /// if the receiver was already taken.
    pub fn spawn_listener(&self) -> Option<JoinHandle<()>> {
        let Some(notices) = self.conn.take_notices() else {
            warn!("store notice channel already has a listener");
            return None;
        };
        let listener = self.listener();
        Some(tokio::spawn(listener.run(notices)))
    }

    /// Periodically drops expired early-finish records. A zero period is
    /// raised to [`MIN_SWEEP_INTERVAL`].
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let every = every.max(MIN_SWEEP_INTERVAL);
        let correlator = self.correlator.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                correlator.sweep();
                let snapshot = correlator.snapshot();
                Metrics::set_ledger_sizes(
                    snapshot.pending_waiters as u64,
                    snapshot.early_finishes as u64,
                );
                debug!(
                    "correlation sweep pending_waiters={} early_finishes={}",
                    snapshot.pending_waiters, snapshot.early_finishes
                );
            }
        })
    }

    /// Creates the device's state table if needed and writes its initial state row.
    pub async fn init_device(
        &self,
        device_id: &str,
        properties: &DeviceProperties,
    ) -> AdapterResult<()> {
        let table = sanitize_identifier(device_id)?;

        let mut columns = Vec::with_capacity(properties.len());
        let mut values = Vec::with_capacity(properties.len());
        for (name, spec) in properties {
            let column = sanitize_identifier(name)?;
            columns.push((column.clone(), spec.kind));
            values.push((column, spec.value));
        }

        let exists = self.conn.table_exists(&table).await.inspect_err(|e| {
            Metrics::store_error();
            error!("failed to look up table {}: {}", table, e);
        })?;

        if !exists {
            let query = self.queries.create_table(&table, &columns);
            info!("creating state table: {}", query);
            self.execute(&query).await?;
        }

        {
            let mut kinds = self.kinds.write();
            for (column, kind) in &columns {
                kinds.insert((table.clone(), column.clone()), *kind);
            }
        }

        let query = self.queries.upsert_state(&table, &values);
        let result = self.execute(&query).await?;
        self.complete(result).await
    }

    pub async fn write(
        &self,
        device_id: &str,
        property: &str,
        value: &PropertyValue,
    ) -> AdapterResult<()> {
        let table = sanitize_identifier(device_id)?;
        let column = sanitize_identifier(property)?;

        Metrics::write_issued();
        let query = self.queries.update_property(&table, &column, value);
        let result = self.execute(&query).await?;
        self.complete(result).await
    }

    /// Returns `None` when the device has no state row or the column is null.
    pub async fn read(
        &self,
        device_id: &str,
        property: &str,
    ) -> AdapterResult<Option<PropertyValue>> {
        let table = sanitize_identifier(device_id)?;
        let column = sanitize_identifier(property)?;

        let query = self.queries.select_property(&table, &column);
        let result = self.execute(&query).await?;

        let kind = self.kinds.read().get(&(table, column)).copied();
        Ok(result
            .first_value("value")
            .and_then(|text| PropertyValue::parse_text(kind, text)))
    }

    /// Finishes a write: returns at once unless the store delayed it.
    async fn complete(&self, result: QueryResult) -> AdapterResult<()> {
        let Some(token) = result.delay_token()? else {
            return Ok(());
        };

        Metrics::write_delayed();
        info!(token = %token, "write delayed by store");

        match self.correlator.claim_or_register(token)? {
            Claim::AlreadyFinished => Ok(()),
            Claim::Pending(pending) => self.correlator.wait(pending).await,
        }
    }

    async fn execute(&self, query: &str) -> AdapterResult<QueryResult> {
        match self.conn.execute(query).await {
            Ok(result) => Ok(result),
            Err(err) => {
                Metrics::store_error();
                error!("store query failed: {} query={}", err, query);
                Err(err.into())
            }
        }
    }
}
