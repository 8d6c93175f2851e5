use super::acquire_writer;
use crate::domain::ports::LedgerStore;
use crate::domain::state::{ChangeSet, LedgerState, Receipt};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// A thread-safe in-memory ledger.
///
/// Readers clone an `Arc` to the latest published [`LedgerState`]; a snapshot
/// they hold never changes. Writers are serialized by a separate lock and
/// apply their change set in place. The tables are copied only when a reader
/// still holds the current snapshot, so a batch replay stays linear.
#[derive(Clone)]
pub struct InMemoryLedgerStore {
    state: Arc<RwLock<Arc<LedgerState>>>,
    writer: Arc<Mutex<()>>,
    lock_timeout: Duration,
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_LOCK_TIMEOUT)
    }
}

impl InMemoryLedgerStore {
    /// Creates an empty ledger whose writers wait at most `lock_timeout`.
    pub fn new(lock_timeout: Duration) -> Self {
        Self::with_state(LedgerState::new(), lock_timeout)
    }

    pub fn with_state(state: LedgerState, lock_timeout: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(Arc::new(state))),
            writer: Arc::new(Mutex::new(())),
            lock_timeout,
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn snapshot(&self) -> Result<Arc<LedgerState>> {
        Ok(self.state.read().await.clone())
    }

    async fn commit(&self, changes: ChangeSet) -> Result<Vec<Receipt>> {
        let _writer = acquire_writer(&self.writer, self.lock_timeout).await?;

        let mut state = self.state.write().await;
        let receipts = Arc::make_mut(&mut state).apply(&changes)?;
        let version = state.version();
        drop(state);

        debug!(version, mutations = changes.len(), "committed change set");
        Ok(receipts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{TempleId, TicketId, UserId};
    use crate::domain::payment::{Amount, PaymentMode};
    use crate::domain::state::{Mutation, TicketRef};
    use crate::domain::ticket::VisitDatePolicy;
    use crate::error::LedgerError;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn seed() -> ChangeSet {
        let mut changes = ChangeSet::new();
        changes.push(Mutation::CreateUser {
            name: "Rama".to_string(),
            email: None,
            phone: None,
        });
        changes.push(Mutation::CreateTemple {
            name: "Tirupati".to_string(),
            location: "Tirupati".to_string(),
        });
        changes
    }

    fn book() -> Mutation {
        Mutation::CreateTicket {
            user: UserId(1),
            temple: TempleId(1),
            visit_date: NaiveDate::from_ymd_opt(2025, 11, 10).unwrap(),
            requested_at: Utc::now(),
            policy: VisitDatePolicy::Unrestricted,
        }
    }

    fn pay(ticket: TicketRef) -> Mutation {
        Mutation::RecordPayment {
            ticket,
            amount: Amount::new(dec!(500)).unwrap(),
            mode: PaymentMode::new("UPI").unwrap(),
        }
    }

    #[tokio::test]
    async fn test_commit_publishes_new_snapshot() {
        let store = InMemoryLedgerStore::default();
        let before = store.snapshot().await.unwrap();

        store.commit(seed()).await.unwrap();

        let after = store.snapshot().await.unwrap();
        assert!(before.user(UserId(1)).is_none());
        assert_eq!(after.user(UserId(1)).unwrap().name, "Rama");
    }

    #[tokio::test]
    async fn test_commit_without_readers_updates_in_place() {
        let store = InMemoryLedgerStore::default();
        store.commit(seed()).await.unwrap();
        let published = Arc::as_ptr(&store.snapshot().await.unwrap());

        for _ in 0..3 {
            store.commit(ChangeSet::single(book())).await.unwrap();
        }

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(Arc::as_ptr(&snapshot), published);
        assert_eq!(snapshot.tickets().count(), 3);
        assert_eq!(snapshot.version(), 4);
    }

    #[tokio::test]
    async fn test_failed_change_set_leaves_no_trace() {
        let store = InMemoryLedgerStore::default();
        store.commit(seed()).await.unwrap();
        let mut paid = ChangeSet::new();
        let ticket = paid.push(book());
        paid.push(pay(TicketRef::Staged(ticket)));
        store.commit(paid).await.unwrap();

        // The ticket is created first, then the payment collides with ticket 1's.
        let mut changes = ChangeSet::new();
        changes.push(book());
        changes.push(pay(TicketRef::Existing(TicketId(1))));
        let result = store.commit(changes).await;

        assert!(matches!(result, Err(LedgerError::DuplicateKey { .. })));
        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.tickets().count(), 1);
        assert_eq!(snapshot.payment_count(), 1);
    }

    #[tokio::test]
    async fn test_writer_lock_wait_is_bounded() {
        let store = InMemoryLedgerStore::new(Duration::from_millis(20));
        let held = store.writer.clone().lock_owned().await;

        let result = store.commit(seed()).await;
        assert!(matches!(result, Err(LedgerError::Timeout { .. })));

        drop(held);
        assert!(store.snapshot().await.unwrap().user(UserId(1)).is_none());
        store.commit(seed()).await.unwrap();
    }

    #[tokio::test]
    async fn test_readers_are_not_blocked_by_a_waiting_writer() {
        let store = InMemoryLedgerStore::default();
        store.commit(seed()).await.unwrap();
        let _held = store.writer.clone().lock_owned().await;

        let snapshot = store.snapshot().await.unwrap();
        assert!(snapshot.temple(TempleId(1)).is_some());
    }
}
