use thiserror::Error;

use crate::correlation::DelayToken;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),
    #[error("a write is already waiting on delay token {0}")]
    DuplicateDelayToken(DelayToken),
    #[error("timed out after {timeout_ms}ms waiting for delay token {token}")]
    Timeout { token: DelayToken, timeout_ms: u64 },
    #[error("completion signal for delay token {0} was dropped")]
    WaiterDropped(DelayToken),
}

pub type AdapterResult<T> = Result<T, AdapterError>;
