use super::events::AuditRecord;
use super::state::{ChangeSet, LedgerState, Receipt};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Durable home of the ledger tables.
///
/// Implementations must make `commit` atomic and serializable: the change set
/// is validated against the latest committed state and either becomes fully
/// visible to later snapshots or leaves no trace.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// A consistent, immutable view of the last committed state.
    async fn snapshot(&self) -> Result<Arc<LedgerState>>;

    /// Applies `changes` as one transaction and returns one receipt per mutation.
    async fn commit(&self, changes: ChangeSet) -> Result<Vec<Receipt>>;
}

/// Consumer of committed domain events. Runs after the write is durable and
/// cannot affect it.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> Result<()>;
}

pub type LedgerStoreRef = Arc<dyn LedgerStore>;
pub type AuditSinkRef = Arc<dyn AuditSink>;
