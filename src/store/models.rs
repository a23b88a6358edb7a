use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::correlation::DelayToken;

/// Warning marker a store attaches to a write it will finish asynchronously.
pub const DELAY_MARKER: &str = "DELAY";

pub type Row = HashMap<String, Option<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionInfo {
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub info: ExecutionInfo,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            info: ExecutionInfo::default(),
        }
    }

    pub fn delayed(token: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            info: ExecutionInfo {
                warnings: vec![DELAY_MARKER.to_string(), token.into()],
            },
        }
    }

    /// Returns the delay token when `warnings[0]` is the delay marker.
    ///
    /// A marker without a token is reported as a protocol error rather than
    /// being mistaken for a synchronous completion.
    pub fn delay_token(&self) -> Result<Option<DelayToken>, StoreError> {
        match self.info.warnings.first() {
            Some(marker) if marker == DELAY_MARKER => match self.info.warnings.get(1) {
                Some(token) if !token.is_empty() => Ok(Some(DelayToken::new(token.clone()))),
                _ => Err(StoreError::Protocol(
                    "delay marker returned without a delay token".to_string(),
                )),
            },
            _ => Ok(None),
        }
    }

    pub fn first_value(&self, column: &str) -> Option<&str> {
        self.rows
            .first()
            .and_then(|row| row.get(column))
            .and_then(|value| value.as_deref())
    }
}

/// A free-text message from the store's event channel, e.g. `finishedProcessing 1571158123`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNotice {
    pub message: String,
    pub received_at: DateTime<Utc>,
}

impl StoreNotice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            received_at: Utc::now(),
        }
    }
}
