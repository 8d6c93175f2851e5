mod common;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use std::sync::Arc;
use temple_ledger::LedgerError;
use temple_ledger::domain::ids::TicketId;
use temple_ledger::domain::ports::{LedgerStore, LedgerStoreRef};
use temple_ledger::domain::state::{ChangeSet, LedgerState, Mutation, Receipt, TicketRef};
use temple_ledger::error::Result;
use temple_ledger::infrastructure::in_memory::InMemoryLedgerStore;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_payments_for_one_ticket() {
    let t = common::in_memory_ledger();
    let (user, temple) = common::seed(&t.ledger).await;
    let ticket = t
        .ledger
        .booking
        .create_ticket(user, temple, common::date(2025, 11, 10))
        .await
        .unwrap();

    let payments = Arc::new(t.ledger.payments.clone());
    let handles: Vec<_> = ["UPI", "card"]
        .into_iter()
        .map(|mode| {
            let payments = payments.clone();
            tokio::spawn(async move { payments.record_payment(ticket, dec!(500), mode).await })
        })
        .collect();

    let mut ok = 0;
    let mut duplicate = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(LedgerError::DuplicateKey { .. }) => duplicate += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!((ok, duplicate), (1, 1));
    assert_eq!(t.ledger.revenue.payment_count().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_ticket_without_payment() {
    let t = common::in_memory_ledger();
    let (user, temple) = common::seed(&t.ledger).await;
    let store = t.store.clone();
    let orchestrator = t.ledger.orchestrator.clone();

    let writer = tokio::spawn(async move {
        for day in 1..=28 {
            orchestrator
                .book_and_pay(user, temple, common::date(2025, 12, day), dec!(10), "UPI")
                .await
                .unwrap();
        }
    });

    let reader = tokio::spawn(async move {
        for _ in 0..200 {
            let snapshot = store.snapshot().await.unwrap();
            for ticket in snapshot.tickets() {
                assert!(snapshot.payment_for_ticket(ticket.id).is_some());
            }
            tokio::task::yield_now().await;
        }
    });

    writer.await.unwrap();
    reader.await.unwrap();
    assert_eq!(t.ledger.revenue.payment_count().await.unwrap(), 28);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_bookings_get_distinct_ids() {
    let t = common::in_memory_ledger();
    let (user, temple) = common::seed(&t.ledger).await;
    let booking = Arc::new(t.ledger.booking.clone());

    let handles: Vec<_> = (1..=20)
        .map(|day| {
            let booking = booking.clone();
            tokio::spawn(async move {
                booking
                    .create_ticket(user, temple, common::date(2025, 12, day))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);

    let tickets = booking.tickets_by_user(user).await.unwrap();
    assert!(tickets.windows(2).all(|w| w[0].booked_at <= w[1].booked_at));
}

/// Redirects the payment half of every multi-mutation change set to an
/// already-paid ticket, so the commit fails after the ticket was staged.
struct RedirectPayment {
    inner: LedgerStoreRef,
    target: TicketId,
}

#[async_trait]
impl LedgerStore for RedirectPayment {
    async fn snapshot(&self) -> Result<Arc<LedgerState>> {
        self.inner.snapshot().await
    }

    async fn commit(&self, mut changes: ChangeSet) -> Result<Vec<Receipt>> {
        if changes.len() > 1 {
            for mutation in &mut changes.mutations {
                if let Mutation::RecordPayment { ticket, .. } = mutation {
                    *ticket = TicketRef::Existing(self.target);
                }
            }
        }
        self.inner.commit(changes).await
    }
}

#[tokio::test]
async fn test_failed_payment_rolls_back_staged_ticket() {
    let inner: LedgerStoreRef = Arc::new(InMemoryLedgerStore::default());
    let setup = common::ledger_over(inner.clone());
    let (user, temple) = common::seed(&setup.ledger).await;
    let (paid, _) = setup
        .ledger
        .orchestrator
        .book_and_pay(user, temple, common::date(2025, 11, 10), dec!(500), "UPI")
        .await
        .unwrap();

    let t = common::ledger_over(Arc::new(RedirectPayment {
        inner: inner.clone(),
        target: paid,
    }));
    let result = t
        .ledger
        .orchestrator
        .book_and_pay(user, temple, common::date(2025, 11, 11), dec!(300), "card")
        .await;

    assert!(matches!(result, Err(LedgerError::DuplicateKey { .. })));
    let snapshot = inner.snapshot().await.unwrap();
    assert_eq!(snapshot.tickets().count(), 1);
    assert_eq!(snapshot.payment_count(), 1);
    assert!(t.sink.records().await.is_empty());
}
