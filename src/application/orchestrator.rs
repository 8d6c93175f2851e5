use super::booking::BookingLedger;
use super::events::EventPublisher;
use super::payments::PaymentProcessor;
use crate::config::LedgerConfig;
use crate::domain::ids::{PaymentId, TempleId, TicketId, UserId};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::state::{ChangeSet, Receipt, TicketRef};
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{debug, warn};

/// How often a transient commit failure is retried and how long to back off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl From<&LedgerConfig> for RetryPolicy {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            max_retries: config.max_commit_retries,
            backoff: config.retry_backoff(),
        }
    }
}

/// Books a ticket and records its payment as one atomic change set.
#[derive(Clone)]
pub struct BookingOrchestrator {
    store: LedgerStoreRef,
    booking: BookingLedger,
    retry: RetryPolicy,
    events: EventPublisher,
}

impl BookingOrchestrator {
    pub fn new(
        store: LedgerStoreRef,
        booking: BookingLedger,
        retry: RetryPolicy,
        events: EventPublisher,
    ) -> Self {
        Self {
            store,
            booking,
            retry,
            events,
        }
    }

    /// Creates the ticket and its `Pending` payment, or neither.
    ///
    /// Errors from either half are returned as-is; the ticket never survives
    /// a failed payment. Only transient failures are retried, and running out
    /// of retries yields `TransactionAborted`.
    pub async fn book_and_pay(
        &self,
        user: UserId,
        temple: TempleId,
        visit_date: NaiveDate,
        amount: Decimal,
        mode: &str,
    ) -> Result<(TicketId, PaymentId)> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let changes = self.change_set(user, temple, visit_date, amount, mode)?;
            match self.store.commit(changes).await {
                Ok(receipts) => {
                    let ids = match receipts.as_slice() {
                        [Receipt::TicketCreated(t), Receipt::PaymentRecorded(p)] => (t.id, p.id),
                        _ => {
                            return Err(LedgerError::internal(
                                "booking commit returned unexpected receipts",
                            ));
                        }
                    };
                    debug!(ticket = %ids.0, payment = %ids.1, attempt, "booked and paid");
                    self.events.publish(&receipts).await;
                    return Ok(ids);
                }
                Err(e) if e.is_transient() && attempt <= self.retry.max_retries => {
                    warn!(error = %e, attempt, "retrying booking after transient failure");
                    tokio::time::sleep(self.retry.backoff * attempt).await;
                }
                Err(e) if e.is_transient() => {
                    return Err(LedgerError::TransactionAborted {
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    // Rebuilt per attempt so each retry reads a fresh booking time.
    fn change_set(
        &self,
        user: UserId,
        temple: TempleId,
        visit_date: NaiveDate,
        amount: Decimal,
        mode: &str,
    ) -> Result<ChangeSet> {
        let mut changes = ChangeSet::new();
        let ticket = changes.push(self.booking.prepare_ticket(user, temple, visit_date)?);
        changes.push(PaymentProcessor::prepare_payment(
            TicketRef::Staged(ticket),
            amount,
            mode,
        )?);
        Ok(changes)
    }
}
