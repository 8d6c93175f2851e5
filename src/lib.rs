//! Temple-visit ticket booking and payment ledger.
//!
//! Users and temples are registered through the [`IdentityStore`], tickets
//! are booked on the [`BookingLedger`], payments are recorded and settled by
//! the [`PaymentProcessor`], and the [`RevenueAggregator`] answers read-only
//! revenue questions. The [`BookingOrchestrator`] books a ticket together with
//! its payment as a single atomic change set.
//!
//! ```no_run
//! use std::sync::Arc;
//! use rust_decimal_macros::dec;
//! use temple_ledger::config::LedgerConfig;
//! use temple_ledger::domain::ticket::parse_visit_date;
//! use temple_ledger::infrastructure::in_memory::InMemoryLedgerStore;
//! use temple_ledger::TempleLedger;
//!
//! # async fn run() -> temple_ledger::error::Result<()> {
//! let config = LedgerConfig::default();
//! let store = Arc::new(InMemoryLedgerStore::new(config.lock_timeout()));
//! let ledger = TempleLedger::with_defaults(store, &config);
//!
//! let rama = ledger.identity.create_user("Rama", Some("rama@gmail.com"), None).await?;
//! let tirupati = ledger.identity.create_temple("Tirupati", "Tirupati").await?;
//! let (_ticket, payment) = ledger
//!     .orchestrator
//!     .book_and_pay(rama, tirupati, parse_visit_date("2025-11-10")?, dec!(500.00), "UPI")
//!     .await?;
//! # let _ = payment;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;

pub use application::booking::BookingLedger;
pub use application::identity::IdentityStore;
pub use application::ledger::{Command, Outcome, TempleLedger};
pub use application::orchestrator::BookingOrchestrator;
pub use application::payments::PaymentProcessor;
pub use application::revenue::RevenueAggregator;
pub use error::{EntityKind, LedgerError};
