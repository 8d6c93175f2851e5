//! Storage backends and audit sinks.

pub mod audit;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;

use crate::error::{LedgerError, Result};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

const WRITER_LOCK: &str = "ledger writer lock";

/// Waits at most `timeout` for the single-writer slot.
pub(crate) async fn acquire_writer(
    writer: &Mutex<()>,
    timeout: Duration,
) -> Result<MutexGuard<'_, ()>> {
    tokio::time::timeout(timeout, writer.lock())
        .await
        .map_err(|_| LedgerError::Timeout {
            resource: WRITER_LOCK,
            waited: timeout,
        })
}
