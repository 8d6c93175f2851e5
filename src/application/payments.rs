use super::events::EventPublisher;
use crate::domain::ids::{PaymentId, TicketId};
use crate::domain::payment::{Amount, Payment, PaymentMode, PaymentStatus};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::state::{ChangeSet, Mutation, Receipt, TicketRef};
use crate::error::{EntityKind, LedgerError, Result};
use rust_decimal::Decimal;

/// Records payments against tickets and drives their status machine.
///
/// Status changes come from outside (typically a payment gateway callback)
/// through [`PaymentProcessor::set_status`]; nothing here times out or retries.
#[derive(Clone)]
pub struct PaymentProcessor {
    store: LedgerStoreRef,
    events: EventPublisher,
}

impl PaymentProcessor {
    pub fn new(store: LedgerStoreRef, events: EventPublisher) -> Self {
        Self { store, events }
    }

    /// Validates the amount and mode and builds the mutation that records them.
    pub fn prepare_payment(ticket: TicketRef, amount: Decimal, mode: &str) -> Result<Mutation> {
        Ok(Mutation::RecordPayment {
            ticket,
            amount: Amount::new(amount)?,
            mode: PaymentMode::new(mode)?,
        })
    }

    /// Records a `Pending` payment for the ticket.
    ///
    /// Fails with `DuplicateKey` when the ticket already has a payment.
    pub async fn record_payment(
        &self,
        ticket: TicketId,
        amount: Decimal,
        mode: &str,
    ) -> Result<PaymentId> {
        let mutation = Self::prepare_payment(TicketRef::Existing(ticket), amount, mode)?;
        let receipts = self.store.commit(ChangeSet::single(mutation)).await?;
        let id = match receipts.first() {
            Some(Receipt::PaymentRecorded(payment)) => payment.id,
            _ => return Err(LedgerError::internal("payment commit returned no receipt")),
        };
        self.events.publish(&receipts).await;
        Ok(id)
    }

    /// Moves a `Pending` payment to `Success` or `Failed`.
    ///
    /// Terminal payments reject every further change with
    /// `InvalidStateTransition`, leaving the stored status untouched.
    pub async fn set_status(&self, payment: PaymentId, status: PaymentStatus) -> Result<Payment> {
        let receipts = self
            .store
            .commit(ChangeSet::single(Mutation::SetPaymentStatus { payment, status }))
            .await?;
        let updated = match receipts.first() {
            Some(Receipt::StatusChanged { payment, .. }) => payment.clone(),
            _ => return Err(LedgerError::internal("status commit returned no receipt")),
        };
        self.events.publish(&receipts).await;
        Ok(updated)
    }

    pub async fn get_payment(&self, id: PaymentId) -> Result<Payment> {
        self.store
            .snapshot()
            .await?
            .payment(id)
            .cloned()
            .ok_or(LedgerError::NotFound {
                entity: EntityKind::Payment,
                id: id.value(),
            })
    }

    pub async fn payment_for_ticket(&self, ticket: TicketId) -> Result<Option<Payment>> {
        Ok(self
            .store
            .snapshot()
            .await?
            .payment_for_ticket(ticket)
            .cloned())
    }
}
