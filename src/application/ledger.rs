use super::booking::BookingLedger;
use super::events::EventPublisher;
use super::identity::IdentityStore;
use super::orchestrator::{BookingOrchestrator, RetryPolicy};
use super::payments::PaymentProcessor;
use super::revenue::RevenueAggregator;
use crate::config::LedgerConfig;
use crate::domain::clock::{ClockRef, SystemClock};
use crate::domain::ids::{PaymentId, TempleId, TicketId, UserId};
use crate::domain::payment::PaymentStatus;
use crate::domain::ports::{AuditSinkRef, LedgerStoreRef};
use crate::error::Result;
use crate::infrastructure::audit::TracingAuditSink;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;

/// A single write request, as read from a batch file.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    RegisterUser {
        name: String,
        email: Option<String>,
        phone: Option<String>,
    },
    RegisterTemple {
        name: String,
        location: String,
    },
    UpdateContact {
        user: UserId,
        email: Option<String>,
        phone: Option<String>,
    },
    Book {
        user: UserId,
        temple: TempleId,
        visit_date: NaiveDate,
    },
    Pay {
        ticket: TicketId,
        amount: Decimal,
        mode: String,
    },
    BookAndPay {
        user: UserId,
        temple: TempleId,
        visit_date: NaiveDate,
        amount: Decimal,
        mode: String,
    },
    SetStatus {
        payment: PaymentId,
        status: PaymentStatus,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    UserRegistered(UserId),
    TempleRegistered(TempleId),
    ContactUpdated(UserId),
    Booked(TicketId),
    Paid(PaymentId),
    BookedAndPaid(TicketId, PaymentId),
    StatusSet(PaymentId, PaymentStatus),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserRegistered(id) => write!(f, "registered user {id}"),
            Self::TempleRegistered(id) => write!(f, "registered temple {id}"),
            Self::ContactUpdated(id) => write!(f, "updated contact of user {id}"),
            Self::Booked(id) => write!(f, "booked ticket {id}"),
            Self::Paid(id) => write!(f, "recorded payment {id}"),
            Self::BookedAndPaid(ticket, payment) => {
                write!(f, "booked ticket {ticket} with payment {payment}")
            }
            Self::StatusSet(id, status) => write!(f, "payment {id} is now {status}"),
        }
    }
}

/// All ledger components wired to one store, clock and audit sink.
#[derive(Clone)]
pub struct TempleLedger {
    pub identity: IdentityStore,
    pub booking: BookingLedger,
    pub payments: PaymentProcessor,
    pub revenue: RevenueAggregator,
    pub orchestrator: BookingOrchestrator,
}

impl TempleLedger {
    pub fn new(
        store: LedgerStoreRef,
        clock: ClockRef,
        sink: AuditSinkRef,
        config: &LedgerConfig,
    ) -> Self {
        let events = EventPublisher::new(sink, clock.clone());
        let booking = BookingLedger::new(
            store.clone(),
            clock,
            config.visit_date_policy,
            events.clone(),
        );
        Self {
            identity: IdentityStore::new(store.clone(), events.clone()),
            payments: PaymentProcessor::new(store.clone(), events.clone()),
            revenue: RevenueAggregator::new(store.clone()),
            orchestrator: BookingOrchestrator::new(
                store,
                booking.clone(),
                RetryPolicy::from(config),
                events,
            ),
            booking,
        }
    }

    /// Wires the ledger with the wall clock and the tracing audit sink.
    pub fn with_defaults(store: LedgerStoreRef, config: &LedgerConfig) -> Self {
        Self::new(
            store,
            Arc::new(SystemClock),
            Arc::new(TracingAuditSink),
            config,
        )
    }

    pub async fn execute(&self, command: Command) -> Result<Outcome> {
        match command {
            Command::RegisterUser { name, email, phone } => self
                .identity
                .create_user(&name, email.as_deref(), phone.as_deref())
                .await
                .map(Outcome::UserRegistered),
            Command::RegisterTemple { name, location } => self
                .identity
                .create_temple(&name, &location)
                .await
                .map(Outcome::TempleRegistered),
            Command::UpdateContact { user, email, phone } => self
                .identity
                .update_contact(user, email.as_deref(), phone.as_deref())
                .await
                .map(|u| Outcome::ContactUpdated(u.id)),
            Command::Book {
                user,
                temple,
                visit_date,
            } => self
                .booking
                .create_ticket(user, temple, visit_date)
                .await
                .map(Outcome::Booked),
            Command::Pay {
                ticket,
                amount,
                mode,
            } => self
                .payments
                .record_payment(ticket, amount, &mode)
                .await
                .map(Outcome::Paid),
            Command::BookAndPay {
                user,
                temple,
                visit_date,
                amount,
                mode,
            } => self
                .orchestrator
                .book_and_pay(user, temple, visit_date, amount, &mode)
                .await
                .map(|(t, p)| Outcome::BookedAndPaid(t, p)),
            Command::SetStatus { payment, status } => self
                .payments
                .set_status(payment, status)
                .await
                .map(|p| Outcome::StatusSet(p.id, p.status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{harness, visit};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_execute_full_flow() {
        let h = harness();
        let commands = vec![
            Command::RegisterUser {
                name: "Rama".to_string(),
                email: Some("rama@gmail.com".to_string()),
                phone: None,
            },
            Command::RegisterTemple {
                name: "Tirupati".to_string(),
                location: "Tirupati".to_string(),
            },
            Command::BookAndPay {
                user: UserId(1),
                temple: TempleId(1),
                visit_date: visit(2025, 11, 10),
                amount: dec!(500),
                mode: "UPI".to_string(),
            },
            Command::SetStatus {
                payment: PaymentId(1),
                status: PaymentStatus::Success,
            },
            Command::Book {
                user: UserId(1),
                temple: TempleId(1),
                visit_date: visit(2025, 11, 12),
            },
            Command::Pay {
                ticket: TicketId(2),
                amount: dec!(20),
                mode: "cash".to_string(),
            },
            Command::UpdateContact {
                user: UserId(1),
                email: None,
                phone: Some("9000000000".to_string()),
            },
        ];

        let mut outcomes = Vec::new();
        for command in commands {
            outcomes.push(h.execute(command).await.unwrap());
        }
        assert_eq!(
            outcomes,
            vec![
                Outcome::UserRegistered(UserId(1)),
                Outcome::TempleRegistered(TempleId(1)),
                Outcome::BookedAndPaid(TicketId(1), PaymentId(1)),
                Outcome::StatusSet(PaymentId(1), PaymentStatus::Success),
                Outcome::Booked(TicketId(2)),
                Outcome::Paid(PaymentId(2)),
                Outcome::ContactUpdated(UserId(1)),
            ]
        );
        assert_eq!(
            outcomes[2].to_string(),
            "booked ticket 1 with payment 1"
        );
    }

    #[tokio::test]
    async fn test_execute_reports_errors() {
        let h = harness();
        let result = h
            .execute(Command::SetStatus {
                payment: PaymentId(1),
                status: PaymentStatus::Failed,
            })
            .await;
        assert!(result.is_err());
    }
}
