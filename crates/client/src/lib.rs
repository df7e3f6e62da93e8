//! EBICS client transfers.
//!
//! A [`Session`] describes one banking connection. [`UploadTransfer`] and
//! [`DownloadTransfer`] each drive a single transaction through the
//! initialization, transfer and receipt phases over a [`TransportGateway`],
//! one segment per round-trip.
//!
//! ```no_run
//! # async fn example(
//! #     session: &ebics_client::Session,
//! #     bank: &dyn ebics_client::TransportGateway,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! use ebics_client::{OrderDescriptor, TransferConfig, upload_order_data};
//! use ebics_protocol::OrderType;
//!
//! let config = TransferConfig::default();
//! let order = OrderDescriptor::new(OrderType::Cct, session.protocol())?;
//! let outcome = upload_order_data(session, bank, &config, &order, b"<Document/>").await?;
//! println!("uploaded as transaction {}", outcome.transaction_id);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod crypto;
pub mod download;
pub mod error;
pub mod events;
pub mod order;
pub mod prepare;
pub mod session;
pub mod state;
pub mod transport;
pub mod upload;

mod element;

#[cfg(test)]
mod testing;

pub use builder::{
    RequestStamp, UploadManifest, build_initialization_message, build_receipt_message,
    build_segment_request_message, build_transfer_message,
};
pub use config::TransferConfig;
pub use crypto::{CryptoError, EncryptionCapability, SigningCapability};
pub use download::{DownloadOutcome, DownloadTransfer};
pub use error::{EbicsError, TransactionError};
pub use events::TransferEvent;
pub use order::OrderDescriptor;
pub use prepare::{order_data_digest, prepare_order_data, recover_order_data};
pub use session::{BankIdentity, Session, SessionBuilder, UserIdentity};
pub use state::{TransactionState, TransferState};
pub use transport::{SendFuture, TransportGateway};
pub use upload::{UploadOutcome, UploadTransfer};

use ebics_transfer::{BufferSink, BufferSource};

fn before_start(error: EbicsError) -> TransactionError {
    TransactionError {
        transaction_id: None,
        segment: None,
        state: TransferState::Idle,
        error,
    }
}

/// Prepares `plain` order data and uploads it in one transaction.
pub async fn upload_order_data(
    session: &Session,
    transport: &dyn TransportGateway,
    config: &TransferConfig,
    order: &OrderDescriptor,
    plain: &[u8],
) -> Result<UploadOutcome, TransactionError> {
    let prepared =
        prepare_order_data(session, plain, config.compress_order_data).map_err(before_start)?;
    let mut source = BufferSource::new(prepared, config.segment_size_limit)
        .map_err(|e| before_start(e.into()))?;
    UploadTransfer::new(session, transport, config)
        .run(order, &mut source)
        .await
}

/// Downloads an order and returns its recovered plain data, or `None` when
/// the bank has nothing to deliver.
pub async fn download_order_data(
    session: &Session,
    transport: &dyn TransportGateway,
    config: &TransferConfig,
    order: &OrderDescriptor,
) -> Result<Option<Vec<u8>>, TransactionError> {
    let mut sink = BufferSink::new();
    let outcome = DownloadTransfer::new(session, transport, config)
        .run(order, &mut sink)
        .await?;

    match outcome {
        DownloadOutcome::NoData => Ok(None),
        DownloadOutcome::Completed { transaction_id, .. } => {
            recover_order_data(session, sink.as_bytes(), config.compress_order_data)
                .map(Some)
                .map_err(|error| TransactionError {
                    transaction_id: Some(transaction_id),
                    segment: None,
                    state: TransferState::Completed,
                    error,
                })
        }
    }
}
