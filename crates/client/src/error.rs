//! Error types for EBICS transactions.

use std::fmt;
use std::time::Duration;

use ebics_protocol::{ProtocolError, ReturnCode, TransactionId};
use ebics_transfer::TransferError;

use crate::crypto::CryptoError;
use crate::state::TransferState;

/// Errors produced while building or running a transaction.
#[derive(Debug, thiserror::Error)]
pub enum EbicsError {
    /// Bad input to a builder or constructor. Never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Payload or envelope cannot be framed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Missing session capability or invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Bank response inconsistent with the local transaction state.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("content error: {0}")]
    Content(#[from] TransferError),

    #[error("bank returned {code}: {report_text}")]
    Bank {
        code: ReturnCode,
        report_text: String,
    },

    #[error("cancelled")]
    Cancelled,
}

impl EbicsError {
    /// Returns `true` when starting a fresh transaction is a sensible retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

impl From<ProtocolError> for EbicsError {
    fn from(e: ProtocolError) -> Self {
        Self::Encoding(e.to_string())
    }
}

/// A failed transaction, with the context needed for bank-side reconciliation.
#[derive(Debug)]
pub struct TransactionError {
    /// Bank-assigned ID, if initialization got that far.
    pub transaction_id: Option<TransactionId>,
    /// Segment being processed when the failure happened (`None` before the transfer phase).
    pub segment: Option<u32>,
    /// State the transfer was in when it failed.
    pub state: TransferState,
    pub error: EbicsError,
}

impl TransactionError {
    pub fn is_retryable(&self) -> bool {
        self.error.is_retryable()
    }
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction failed while {}", self.state)?;
        if let Some(id) = &self.transaction_id {
            write!(f, " (transaction {id}")?;
            if let Some(segment) = self.segment {
                write!(f, ", segment {segment}")?;
            }
            f.write_str(")")?;
        }
        write!(f, ": {}", self.error)
    }
}

impl std::error::Error for TransactionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
