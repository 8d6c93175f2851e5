use crate::domain::payment::PaymentStatus;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Temple,
    Ticket,
    Payment,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Temple => "temple",
            Self::Ticket => "ticket",
            Self::Payment => "payment",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: u64 },
    #[error("referential integrity violated: {entity} {id} does not exist")]
    ReferentialIntegrity { entity: EntityKind, id: u64 },
    #[error("duplicate key for {entity}: {key}")]
    DuplicateKey { entity: EntityKind, key: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("payment {payment} cannot move from {from} to {to}")]
    InvalidStateTransition {
        payment: u64,
        from: PaymentStatus,
        to: PaymentStatus,
    },
    #[error("amount overflow: {0}")]
    AmountOverflow(String),
    #[error("timed out after {waited:?} waiting for {resource}")]
    Timeout {
        resource: &'static str,
        waited: Duration,
    },
    #[error("transaction aborted after {attempts} attempt(s): {source}")]
    TransactionAborted {
        attempts: u32,
        #[source]
        source: Box<LedgerError>,
    },
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    StorageError(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(Box::new(std::io::Error::other(message.into())))
    }

    /// Whether the failed operation may be retried as a whole.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
