pub use self::connect::{Backend, connect};
pub use self::connection::StoreConnection;
pub use self::error::StoreError;
pub use self::models::{DELAY_MARKER, ExecutionInfo, QueryResult, Row, StoreNotice};

pub mod connect;
pub mod connection;
pub mod error;
pub mod models;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
pub(crate) mod testing;
