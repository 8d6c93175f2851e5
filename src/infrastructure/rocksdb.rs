use super::acquire_writer;
use crate::domain::ports::LedgerStore;
use crate::domain::state::{ChangeSet, LedgerState, Receipt};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Column Family for registered users.
pub const CF_USERS: &str = "users";
/// Column Family for temples.
pub const CF_TEMPLES: &str = "temples";
/// Column Family for tickets.
pub const CF_TICKETS: &str = "tickets";
/// Column Family for payments.
pub const CF_PAYMENTS: &str = "payments";

/// A persistent ledger backed by RocksDB.
///
/// Each table lives in its own Column Family, keyed by the big-endian id so
/// iteration follows id order. Every commit is applied in memory and written
/// as a single `WriteBatch` while readers are held off; a batch RocksDB
/// rejects is undone in memory, so readers never observe it.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBLedgerStore {
    db: Arc<DB>,
    state: Arc<RwLock<Arc<LedgerState>>>,
    writer: Arc<Mutex<()>>,
    lock_timeout: Duration,
}

impl RocksDBLedgerStore {
    /// Opens or creates a ledger database at `path` and loads its tables.
    pub fn open<P: AsRef<Path>>(path: P, lock_timeout: Duration) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_USERS, CF_TEMPLES, CF_TICKETS, CF_PAYMENTS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, families)?;

        let state = LedgerState::restore(
            load(&db, CF_USERS)?,
            load(&db, CF_TEMPLES)?,
            load(&db, CF_TICKETS)?,
            load(&db, CF_PAYMENTS)?,
        )?;
        info!(
            users = state.users().count(),
            tickets = state.tickets().count(),
            payments = state.payment_count(),
            "loaded ledger from RocksDB"
        );

        Ok(Self {
            db: Arc::new(db),
            state: Arc::new(RwLock::new(Arc::new(state))),
            writer: Arc::new(Mutex::new(())),
            lock_timeout,
        })
    }

    fn batch_for(&self, receipts: &[Receipt]) -> Result<WriteBatch> {
        let mut batch = WriteBatch::default();
        for receipt in receipts {
            match receipt {
                Receipt::UserCreated(user) | Receipt::ContactUpdated(user) => {
                    self.put(&mut batch, CF_USERS, user.id.to_key(), user)?;
                }
                Receipt::TempleCreated(temple) => {
                    self.put(&mut batch, CF_TEMPLES, temple.id.to_key(), temple)?;
                }
                Receipt::TicketCreated(ticket) => {
                    self.put(&mut batch, CF_TICKETS, ticket.id.to_key(), ticket)?;
                }
                Receipt::PaymentRecorded(payment) | Receipt::StatusChanged { payment, .. } => {
                    self.put(&mut batch, CF_PAYMENTS, payment.id.to_key(), payment)?;
                }
            }
        }
        Ok(batch)
    }

    fn put<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        family: &str,
        key: [u8; 8],
        value: &T,
    ) -> Result<()> {
        let cf = self.db.cf_handle(family).ok_or_else(|| missing_family(family))?;
        batch.put_cf(&cf, key, serde_json::to_vec(value)?);
        Ok(())
    }
}

fn missing_family(family: &str) -> LedgerError {
    LedgerError::internal(format!("{family} column family not found"))
}

fn load<T: DeserializeOwned>(db: &DB, family: &str) -> Result<Vec<T>> {
    let cf = db.cf_handle(family).ok_or_else(|| missing_family(family))?;
    let mut rows = Vec::new();
    for item in db.iterator_cf(&cf, IteratorMode::Start) {
        let (_key, value) = item?;
        rows.push(serde_json::from_slice(&value)?);
    }
    Ok(rows)
}

#[async_trait]
impl LedgerStore for RocksDBLedgerStore {
    async fn snapshot(&self) -> Result<Arc<LedgerState>> {
        Ok(self.state.read().await.clone())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<Vec<Receipt>> {
        let _writer = acquire_writer(&self.writer, self.lock_timeout).await?;

        let mut state = self.state.write().await;
        let receipts = Arc::make_mut(&mut state).apply_with(&changes, |receipts| {
            self.db.write(self.batch_for(receipts)?)?;
            Ok(())
        })?;
        let version = state.version();
        drop(state);

        debug!(version, mutations = changes.len(), "persisted change set");
        Ok(receipts)
    }
}
