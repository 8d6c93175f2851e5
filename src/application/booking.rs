use super::events::EventPublisher;
use crate::domain::clock::ClockRef;
use crate::domain::ids::{TempleId, TicketId, UserId};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::state::{ChangeSet, Mutation, Receipt};
use crate::domain::ticket::{Ticket, VisitDatePolicy};
use crate::error::{EntityKind, LedgerError, Result};
use chrono::NaiveDate;

/// Creates tickets and answers per-user and per-temple ticket queries.
#[derive(Clone)]
pub struct BookingLedger {
    store: LedgerStoreRef,
    clock: ClockRef,
    policy: VisitDatePolicy,
    events: EventPublisher,
}

impl BookingLedger {
    pub fn new(
        store: LedgerStoreRef,
        clock: ClockRef,
        policy: VisitDatePolicy,
        events: EventPublisher,
    ) -> Self {
        Self {
            store,
            clock,
            policy,
            events,
        }
    }

    /// Validates a booking request and builds the mutation that creates it.
    ///
    /// The booking time is read from the clock here; the store may move it
    /// forward to keep booking times non-decreasing, and checks the visit-date
    /// policy again against that final time.
    pub fn prepare_ticket(
        &self,
        user: UserId,
        temple: TempleId,
        visit_date: NaiveDate,
    ) -> Result<Mutation> {
        let requested_at = self.clock.now();
        self.policy.check(visit_date, requested_at)?;
        Ok(Mutation::CreateTicket {
            user,
            temple,
            visit_date,
            requested_at,
            policy: self.policy,
        })
    }

    /// Books a ticket. No payment is created.
    ///
    /// Fails with `ReferentialIntegrity` naming the missing user or temple.
    pub async fn create_ticket(
        &self,
        user: UserId,
        temple: TempleId,
        visit_date: NaiveDate,
    ) -> Result<TicketId> {
        let mutation = self.prepare_ticket(user, temple, visit_date)?;
        let receipts = self.store.commit(ChangeSet::single(mutation)).await?;
        let id = match receipts.first() {
            Some(Receipt::TicketCreated(ticket)) => ticket.id,
            _ => return Err(LedgerError::internal("ticket commit returned no receipt")),
        };
        self.events.publish(&receipts).await;
        Ok(id)
    }

    pub async fn get_ticket(&self, id: TicketId) -> Result<Ticket> {
        self.store
            .snapshot()
            .await?
            .ticket(id)
            .cloned()
            .ok_or(LedgerError::NotFound {
                entity: EntityKind::Ticket,
                id: id.value(),
            })
    }

    /// The user's tickets in booking order.
    pub async fn tickets_by_user(&self, user: UserId) -> Result<Vec<Ticket>> {
        let snapshot = self.store.snapshot().await?;
        Ok(snapshot.tickets_where(|t| t.user_id == user))
    }

    /// The temple's tickets in booking order.
    pub async fn tickets_by_temple(&self, temple: TempleId) -> Result<Vec<Ticket>> {
        let snapshot = self.store.snapshot().await?;
        Ok(snapshot.tickets_where(|t| t.temple_id == temple))
    }
}
