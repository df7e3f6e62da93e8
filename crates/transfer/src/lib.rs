//! Segmentation of order data for EBICS transfers.
//!
//! A payload is cut into 1-based, fixed-size segments. [`ContentSource`]
//! hands out segments by index for uploads, [`ContentSink`] reassembles
//! them in order for downloads.

mod progress;
mod segment;
mod sink;
mod source;

pub use progress::{SpeedCalculator, TransferProgress};
pub use segment::{SegmentPlan, segment_count};
pub use sink::{BufferSink, ContentSink, FileSink};
pub use source::{BufferSource, ContentSource, FileSource};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("segment {index} out of range (segment count {count})")]
    SegmentOutOfRange { index: u32, count: u32 },

    #[error("invalid segment size: {0}")]
    InvalidSegmentSize(usize),

    #[error("payload needs more than u32::MAX segments ({0} bytes)")]
    TooManySegments(u64),

    #[error("segment out of order: expected {expected}, got {got}")]
    OutOfOrder { expected: u32, got: u32 },

    #[error("content changed: expected {expected} bytes, found {actual}")]
    SizeChanged { expected: u64, actual: u64 },
}
