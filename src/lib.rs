#![forbid(unsafe_code)]

//! Device state gateway.
//!
//! Many request handlers share one store connection through [`DeviceStore`].
//! Writes the store finishes asynchronously are tracked by a server-issued
//! delay token and completed when the matching "finished" notice arrives,
//! whether that notice shows up before or after the writer learns of the delay.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod correlation;
pub mod device;
pub mod error;
pub mod listener;
pub mod metrics;
pub mod query;
pub mod store;
pub mod utils;
pub mod web;

pub use self::adapter::DeviceStore;
pub use self::correlation::{Correlator, DelayToken};
pub use self::device::{DeviceProperties, PropertyKind, PropertySpec, PropertyValue};
pub use self::error::{AdapterError, AdapterResult};
pub use self::listener::NotificationListener;
pub use self::store::{StoreConnection, StoreError};
