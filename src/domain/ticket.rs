use super::ids::{TempleId, TicketId, UserId};
use crate::error::{LedgerError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A user's booking to visit a temple on a given day.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Ticket {
    pub id: TicketId,
    pub user_id: UserId,
    pub temple_id: TempleId,
    pub visit_date: NaiveDate,
    /// Assigned by the ledger; never decreases across tickets.
    pub booked_at: DateTime<Utc>,
}

/// How a visit date must relate to the day it is booked on.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisitDatePolicy {
    /// Any visit date is accepted, including past ones.
    #[default]
    Unrestricted,
    /// The visit may not be earlier than the booking day.
    NotBeforeBooking,
}

impl VisitDatePolicy {
    pub fn check(self, visit_date: NaiveDate, booked_at: DateTime<Utc>) -> Result<()> {
        match self {
            Self::Unrestricted => Ok(()),
            Self::NotBeforeBooking if visit_date < booked_at.date_naive() => {
                Err(LedgerError::InvalidArgument(format!(
                    "visit date {visit_date} is before booking date {}",
                    booked_at.date_naive()
                )))
            }
            Self::NotBeforeBooking => Ok(()),
        }
    }
}

impl std::str::FromStr for VisitDatePolicy {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "unrestricted" => Ok(Self::Unrestricted),
            "not_before_booking" => Ok(Self::NotBeforeBooking),
            other => Err(LedgerError::InvalidArgument(format!(
                "unknown visit date policy '{other}'"
            ))),
        }
    }
}

pub fn parse_visit_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        LedgerError::InvalidArgument(format!("invalid visit date '{}': {e}", value.trim()))
    })
}
