use super::ids::{PaymentId, TempleId, TicketId, UserId};
use super::payment::{Amount, PaymentStatus};
use super::state::Receipt;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Facts published to the audit sink once a change set has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    UserRegistered {
        user_id: UserId,
    },
    ContactUpdated {
        user_id: UserId,
    },
    TempleRegistered {
        temple_id: TempleId,
    },
    TicketCreated {
        ticket_id: TicketId,
        user_id: UserId,
        temple_id: TempleId,
        visit_date: NaiveDate,
    },
    PaymentRecorded {
        payment_id: PaymentId,
        ticket_id: TicketId,
        amount: Amount,
        mode: String,
    },
    PaymentStatusChanged {
        payment_id: PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
    },
}

impl From<&Receipt> for LedgerEvent {
    fn from(receipt: &Receipt) -> Self {
        match receipt {
            Receipt::UserCreated(user) => Self::UserRegistered { user_id: user.id },
            Receipt::ContactUpdated(user) => Self::ContactUpdated { user_id: user.id },
            Receipt::TempleCreated(temple) => Self::TempleRegistered {
                temple_id: temple.id,
            },
            Receipt::TicketCreated(ticket) => Self::TicketCreated {
                ticket_id: ticket.id,
                user_id: ticket.user_id,
                temple_id: ticket.temple_id,
                visit_date: ticket.visit_date,
            },
            Receipt::PaymentRecorded(payment) => Self::PaymentRecorded {
                payment_id: payment.id,
                ticket_id: payment.ticket_id,
                amount: payment.amount,
                mode: payment.mode.to_string(),
            },
            Receipt::StatusChanged { payment, from } => Self::PaymentStatusChanged {
                payment_id: payment.id,
                from: *from,
                to: payment.status,
            },
        }
    }
}

/// An event stamped with the audit clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: LedgerEvent,
}
