use crate::domain::clock::ClockRef;
use crate::domain::events::{AuditRecord, LedgerEvent};
use crate::domain::ports::AuditSinkRef;
use crate::domain::state::Receipt;
use tracing::warn;

/// Forwards committed receipts to the audit sink, stamped by the audit clock.
#[derive(Clone)]
pub struct EventPublisher {
    sink: AuditSinkRef,
    clock: ClockRef,
}

impl EventPublisher {
    pub fn new(sink: AuditSinkRef, clock: ClockRef) -> Self {
        Self { sink, clock }
    }

    /// Publishes one event per receipt. The write has already committed, so
    /// sink failures are logged and dropped.
    pub async fn publish(&self, receipts: &[Receipt]) {
        for receipt in receipts {
            let record = AuditRecord {
                at: self.clock.now(),
                event: LedgerEvent::from(receipt),
            };
            if let Err(e) = self.sink.record(record).await {
                warn!(error = %e, "audit sink rejected ledger event");
            }
        }
    }
}
