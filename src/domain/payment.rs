use super::ids::{PaymentId, TicketId};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional digits every stored amount carries.
pub const AMOUNT_SCALE: u32 = 2;

/// A non-negative monetary amount stored at fixed 2-decimal precision.
///
/// Wraps `rust_decimal::Decimal` so sums stay exact. Construction rejects
/// negative values, values that would need rounding to fit the scale and
/// values too large to carry two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Result<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(LedgerError::InvalidArgument(format!(
                "amount must not be negative, got {value}"
            )));
        }
        if value.normalize().scale() > AMOUNT_SCALE {
            return Err(LedgerError::InvalidArgument(format!(
                "amount {value} has more than {AMOUNT_SCALE} decimal places"
            )));
        }
        let mut stored = value.abs();
        stored.rescale(AMOUNT_SCALE);
        if stored.scale() != AMOUNT_SCALE {
            return Err(LedgerError::InvalidArgument(format!(
                "amount {value} is too large to store with {AMOUNT_SCALE} decimal places"
            )));
        }
        Ok(Self(stored))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Adds two amounts, `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Sums amounts, failing with `AmountOverflow` instead of panicking.
    pub fn try_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Result<Self> {
        amounts.into_iter().try_fold(Self::ZERO, |total, amount| {
            total
                .checked_add(amount)
                .ok_or_else(|| LedgerError::AmountOverflow(format!("{total} + {amount}")))
        })
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a payment was made (card, UPI, cash, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMode(String);

impl PaymentMode {
    pub fn new(mode: &str) -> Result<Self> {
        let mode = mode.trim();
        if mode.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "payment mode must not be blank".to_string(),
            ));
        }
        Ok(Self(mode.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Success) | (Self::Pending, Self::Failed)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "Pending",
            Self::Success => "Success",
            Self::Failed => "Failed",
        };
        f.write_str(name)
    }
}

impl FromStr for PaymentStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(LedgerError::InvalidArgument(format!(
                "unknown payment status '{other}'"
            ))),
        }
    }
}

/// The settlement of exactly one ticket.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub id: PaymentId,
    /// Unique across all payments.
    pub ticket_id: TicketId,
    pub amount: Amount,
    pub mode: PaymentMode,
    pub status: PaymentStatus,
}

impl Payment {
    pub fn new(id: PaymentId, ticket_id: TicketId, amount: Amount, mode: PaymentMode) -> Self {
        Self {
            id,
            ticket_id,
            amount,
            mode,
            status: PaymentStatus::Pending,
        }
    }

    /// Moves the payment to `next`, leaving it untouched when the move is illegal.
    pub fn transition(&mut self, next: PaymentStatus) -> Result<PaymentStatus> {
        if !self.status.can_transition_to(next) {
            return Err(LedgerError::InvalidStateTransition {
                payment: self.id.value(),
                from: self.status,
                to: next,
            });
        }
        let previous = self.status;
        self.status = next;
        Ok(previous)
    }
}
