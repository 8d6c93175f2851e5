use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const FIRST: Self = Self(1);

            pub fn value(self) -> u64 {
                self.0
            }

            pub(crate) fn next(self) -> Self {
                Self(self.0 + 1)
            }

            #[cfg_attr(not(feature = "storage-rocksdb"), allow(dead_code))]
            pub(crate) fn to_key(self) -> [u8; 8] {
                self.0.to_be_bytes()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Identifier of a registered visitor.
    UserId
);
entity_id!(
    /// Identifier of a temple that tickets can be booked for.
    TempleId
);
entity_id!(
    /// Identifier of a booked ticket.
    TicketId
);
entity_id!(
    /// Identifier of the payment settling a ticket.
    PaymentId
);
