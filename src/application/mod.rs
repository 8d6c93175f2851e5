//! Application layer: the ledger's services and the orchestrator that
//! composes them.
//!
//! Each service owns a handle to the shared [`LedgerStore`](crate::domain::ports::LedgerStore).
//! Writes go through change sets committed atomically by the store; reads work
//! on immutable snapshots, so any number of queries may run in parallel with
//! a writer.

pub mod booking;
pub mod events;
pub mod identity;
pub mod ledger;
pub mod orchestrator;
pub mod payments;
pub mod revenue;
#[cfg(test)]
pub(crate) mod testing;
