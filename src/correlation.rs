//! Bookkeeping that pairs delayed writes with their out-of-band completion.
//!
//! A write that the store delays is identified only by a server-issued token.
//! The "finished" notice for that token may arrive before or after the writer
//! learns about the delay, so both orders have to end in exactly one
//! resolution. [`Correlator`] keeps the pending waiters and the early finishes
//! under one lock so that a token is never in both at once.

use std::fmt;

use serde::{Deserialize, Serialize};

pub use self::correlator::{Claim, Correlator, CorrelatorSnapshot, FinishOutcome, PendingCompletion};
pub use self::early_finish::EarlyFinishSet;
pub use self::table::{CorrelationTable, Waiter};

pub mod correlator;
pub mod early_finish;
pub mod table;

/// Opaque server-issued identifier of one delayed operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DelayToken(String);

impl DelayToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DelayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DelayToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
