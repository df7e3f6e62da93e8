//! Wire types for EBICS segmented transfers.
//!
//! Everything in this crate is plain data: the request envelope with its
//! static/mutable header split, the bank response, order type codes and
//! return codes. Nothing here performs I/O.

pub mod constants;
pub mod envelope;
pub mod order;
pub mod response;
pub mod return_code;
pub mod transaction;

mod base64_bytes;

// Re-export primary types for convenience.
pub use constants::{ProtocolVersion, TransactionPhase};
pub use envelope::{
    Body, EncodedBytes, Header, Message, MutableHeader, OrderDetails, SegmentNumber, StaticHeader,
    TransferReceipt,
};
pub use order::{DateRange, OrderAttribute, OrderDirection, OrderType};
pub use response::ResponseMessage;
pub use return_code::ReturnCode;
pub use transaction::TransactionId;

/// Errors produced while encoding or decoding wire types.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid transaction id: {0}")]
    InvalidTransactionId(String),

    #[error("unknown order type: {0}")]
    UnknownOrderType(String),

    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid return code: {0}")]
    InvalidReturnCode(String),

    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}
