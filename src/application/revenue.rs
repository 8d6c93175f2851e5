use crate::domain::ids::{TempleId, TicketId};
use crate::domain::payment::{Amount, PaymentStatus};
use crate::domain::ports::LedgerStoreRef;
use crate::error::{EntityKind, LedgerError, Result};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TempleRevenue {
    pub temple_name: String,
    /// Sum of successful payments only.
    pub total: Amount,
}

/// One line of the ticket report. Tickets without a payment have no amount or status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketReportRow {
    pub ticket_id: TicketId,
    pub user_name: String,
    pub temple_name: String,
    pub visit_date: NaiveDate,
    pub amount: Option<Amount>,
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TempleSummary {
    pub temple_id: TempleId,
    pub name: String,
    pub location: String,
    pub tickets: usize,
    pub payments: usize,
    pub pending: usize,
    pub failed: usize,
    pub revenue: Amount,
}

/// Read-only projections computed from a single snapshot per call.
#[derive(Clone)]
pub struct RevenueAggregator {
    store: LedgerStoreRef,
}

impl RevenueAggregator {
    pub fn new(store: LedgerStoreRef) -> Self {
        Self { store }
    }

    /// Total of `Success` payments on the temple's tickets; zero when there are none.
    ///
    /// Fails with `AmountOverflow` when the total does not fit a `Decimal`.
    pub async fn revenue_by_temple(&self, temple: TempleId) -> Result<TempleRevenue> {
        let snapshot = self.store.snapshot().await?;
        let name = snapshot
            .temple(temple)
            .map(|t| t.name.clone())
            .ok_or(LedgerError::NotFound {
                entity: EntityKind::Temple,
                id: temple.value(),
            })?;

        let total = Amount::try_sum(
            snapshot
                .payments()
                .filter(|p| p.status == PaymentStatus::Success)
                .filter(|p| {
                    snapshot
                        .ticket(p.ticket_id)
                        .is_some_and(|t| t.temple_id == temple)
                })
                .map(|p| p.amount),
        )?;

        Ok(TempleRevenue {
            temple_name: name,
            total,
        })
    }

    /// Number of payments in any status.
    pub async fn payment_count(&self) -> Result<usize> {
        Ok(self.store.snapshot().await?.payment_count())
    }

    /// Every ticket joined with its user, temple and (if any) payment,
    /// ordered by visit date then ticket id.
    pub async fn ticket_report(&self) -> Result<Vec<TicketReportRow>> {
        let snapshot = self.store.snapshot().await?;
        let mut rows = Vec::new();
        for ticket in snapshot.tickets() {
            let user = snapshot.user(ticket.user_id).ok_or_else(|| {
                LedgerError::internal(format!("ticket {} has no user", ticket.id))
            })?;
            let temple = snapshot.temple(ticket.temple_id).ok_or_else(|| {
                LedgerError::internal(format!("ticket {} has no temple", ticket.id))
            })?;
            let payment = snapshot.payment_for_ticket(ticket.id);
            rows.push(TicketReportRow {
                ticket_id: ticket.id,
                user_name: user.name.clone(),
                temple_name: temple.name.clone(),
                visit_date: ticket.visit_date,
                amount: payment.map(|p| p.amount),
                status: payment.map(|p| p.status),
            });
        }
        rows.sort_by_key(|r| (r.visit_date, r.ticket_id));
        Ok(rows)
    }

    /// Per-temple ticket and payment counts with successful revenue, in temple id order.
    pub async fn temple_summaries(&self) -> Result<Vec<TempleSummary>> {
        let snapshot = self.store.snapshot().await?;
        let mut summaries: Vec<TempleSummary> = snapshot
            .temples()
            .map(|t| TempleSummary {
                temple_id: t.id,
                name: t.name.clone(),
                location: t.location.clone(),
                tickets: 0,
                payments: 0,
                pending: 0,
                failed: 0,
                revenue: Amount::ZERO,
            })
            .collect();

        for ticket in snapshot.tickets() {
            let Some(summary) = summaries.iter_mut().find(|s| s.temple_id == ticket.temple_id)
            else {
                continue;
            };
            summary.tickets += 1;
            if let Some(payment) = snapshot.payment_for_ticket(ticket.id) {
                summary.payments += 1;
                match payment.status {
                    PaymentStatus::Pending => summary.pending += 1,
                    PaymentStatus::Failed => summary.failed += 1,
                    PaymentStatus::Success => {
                        summary.revenue = Amount::try_sum([summary.revenue, payment.amount])?;
                    }
                }
            }
        }
        Ok(summaries)
    }
}
