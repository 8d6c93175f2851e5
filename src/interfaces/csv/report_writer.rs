use crate::application::revenue::{TempleSummary, TicketReportRow};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

const SUMMARY_HEADER: [&str; 8] = [
    "temple_id",
    "name",
    "location",
    "tickets",
    "payments",
    "pending",
    "failed",
    "revenue",
];

const TICKET_HEADER: [&str; 6] = [
    "ticket_id",
    "user_name",
    "temple_name",
    "visit_date",
    "amount",
    "status",
];

/// Exports ledger projections as CSV. The header is written even for empty exports.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        Self { writer }
    }

    pub fn write_summaries(&mut self, rows: &[TempleSummary]) -> Result<()> {
        self.write(&SUMMARY_HEADER, rows)
    }

    pub fn write_ticket_report(&mut self, rows: &[TicketReportRow]) -> Result<()> {
        self.write(&TICKET_HEADER, rows)
    }

    fn write<T: Serialize>(&mut self, header: &[&str], rows: &[T]) -> Result<()> {
        self.writer.write_record(header)?;
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
