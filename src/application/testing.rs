use super::events::EventPublisher;
use super::ledger::TempleLedger;
use crate::config::LedgerConfig;
use crate::domain::clock::ManualClock;
use crate::domain::ids::{TempleId, TicketId, UserId};
use crate::domain::ports::LedgerStoreRef;
use crate::domain::ticket::VisitDatePolicy;
use crate::infrastructure::audit::InMemoryAuditSink;
use crate::infrastructure::in_memory::InMemoryLedgerStore;
use chrono::{NaiveDate, TimeZone, Utc};
use std::ops::Deref;
use std::sync::Arc;

/// A ledger over an in-memory store with a manual clock and a recording sink.
pub(crate) struct Harness {
    pub ledger: TempleLedger,
    pub store: LedgerStoreRef,
    pub clock: ManualClock,
    pub sink: InMemoryAuditSink,
    pub events: EventPublisher,
}

impl Deref for Harness {
    type Target = TempleLedger;

    fn deref(&self) -> &TempleLedger {
        &self.ledger
    }
}

impl Harness {
    /// Registers Rama and the Tirupati temple.
    pub async fn seed(&self) -> (UserId, TempleId) {
        let user = self
            .identity
            .create_user("Rama", Some("rama@gmail.com"), None)
            .await
            .unwrap();
        let temple = self
            .identity
            .create_temple("Tirupati", "Tirupati")
            .await
            .unwrap();
        (user, temple)
    }

    /// Seeds and books one unpaid ticket.
    pub async fn book(&self) -> TicketId {
        let (user, temple) = self.seed().await;
        self.booking
            .create_ticket(user, temple, visit(2025, 11, 10))
            .await
            .unwrap()
    }
}

pub(crate) fn visit(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub(crate) fn harness() -> Harness {
    harness_with_policy(VisitDatePolicy::Unrestricted)
}

pub(crate) fn harness_with_policy(policy: VisitDatePolicy) -> Harness {
    let config = LedgerConfig {
        visit_date_policy: policy,
        ..LedgerConfig::default()
    };
    let store: LedgerStoreRef = Arc::new(InMemoryLedgerStore::new(config.lock_timeout()));
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 11, 1, 9, 0, 0).unwrap());
    let sink = InMemoryAuditSink::new();
    let ledger = TempleLedger::new(
        store.clone(),
        Arc::new(clock.clone()),
        Arc::new(sink.clone()),
        &config,
    );
    let events = EventPublisher::new(Arc::new(sink.clone()), Arc::new(clock.clone()));
    Harness {
        ledger,
        store,
        clock,
        sink,
        events,
    }
}
