//! A batching log sink for Azure Table Storage.
//!
//! Structured log events are mapped onto table entities, grouped by partition key into batch
//! transactions of at most 100 operations and written through a pluggable table client.

#[macro_use]
extern crate tracing;

#[macro_use]
pub mod internal_events;
pub mod event;
pub mod format;
pub mod sinks;
#[cfg(test)]
pub mod test_util;
pub mod trace;

pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;
