use ebics_protocol::TransactionId;
use ebics_transfer::TransferProgress;

/// Progress notifications emitted while a transfer runs.
#[derive(Debug, Clone)]
pub enum TransferEvent {
    /// The bank accepted initialization and assigned a transaction ID.
    Initialized {
        transaction_id: TransactionId,
        total_segments: u32,
    },
    /// A segment was acknowledged (upload) or stored (download).
    Segment {
        transaction_id: TransactionId,
        progress: TransferProgress,
    },
    Completed {
        transaction_id: TransactionId,
    },
    Failed {
        transaction_id: Option<TransactionId>,
        error: String,
    },
}
