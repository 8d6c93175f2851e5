//! Entities, value objects, integrity rules and the ports the application
//! layer talks to.

pub mod clock;
pub mod events;
pub mod identity;
pub mod ids;
pub mod payment;
pub mod ports;
pub mod state;
pub mod ticket;
