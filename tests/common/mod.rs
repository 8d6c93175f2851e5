#![allow(dead_code)]

use chrono::{NaiveDate, TimeZone, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::Arc;
use temple_ledger::TempleLedger;
use temple_ledger::config::LedgerConfig;
use temple_ledger::domain::clock::ManualClock;
use temple_ledger::domain::ids::{TempleId, UserId};
use temple_ledger::domain::ports::LedgerStoreRef;
use temple_ledger::infrastructure::audit::InMemoryAuditSink;
use temple_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use tempfile::NamedTempFile;

pub struct TestLedger {
    pub ledger: TempleLedger,
    pub store: LedgerStoreRef,
    pub clock: ManualClock,
    pub sink: InMemoryAuditSink,
}

pub fn ledger_over(store: LedgerStoreRef) -> TestLedger {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 11, 1, 9, 0, 0).unwrap());
    let sink = InMemoryAuditSink::new();
    let ledger = TempleLedger::new(
        store.clone(),
        Arc::new(clock.clone()),
        Arc::new(sink.clone()),
        &LedgerConfig::default(),
    );
    TestLedger {
        ledger,
        store,
        clock,
        sink,
    }
}

pub fn in_memory_ledger() -> TestLedger {
    ledger_over(Arc::new(InMemoryLedgerStore::default()))
}

pub async fn seed(ledger: &TempleLedger) -> (UserId, TempleId) {
    let user = ledger
        .identity
        .create_user("Rama", Some("rama@gmail.com"), None)
        .await
        .unwrap();
    let temple = ledger
        .identity
        .create_temple("Tirupati", "Tirupati")
        .await
        .unwrap();
    (user, temple)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// A random amount between 0.00 and 9999.99 with exactly two decimals.
pub fn random_amount(rng: &mut impl Rng) -> Decimal {
    Decimal::new(rng.gen_range(0..1_000_000), 2)
}

pub fn commands_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file.flush().unwrap();
    file
}

/// A replay of `bookings` paid and settled bookings spread over ten temples.
pub fn generate_replay(bookings: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    let mut out = std::io::BufWriter::new(file.as_file_mut());
    for user in 1..=100 {
        writeln!(out, "user, Pilgrim {user}, pilgrim{user}@example.com").unwrap();
    }
    for temple in 1..=10 {
        writeln!(out, "temple, Temple {temple}, City {temple}").unwrap();
    }
    for booking in 0..bookings {
        let user = booking % 100 + 1;
        let temple = booking % 10 + 1;
        let day = booking % 28 + 1;
        writeln!(out, "book_and_pay, {user}, {temple}, 2026-02-{day:02}, 10.00, UPI").unwrap();
        writeln!(out, "status, {}, success", booking + 1).unwrap();
    }
    out.flush().unwrap();
    drop(out);
    file
}
