use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(String),
    #[error("store query error: {0}")]
    Query(String),
    #[error("store protocol error: {0}")]
    Protocol(String),
    #[error("store task error: {0}")]
    Task(String),
}
