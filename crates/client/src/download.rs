//! Segmented download transaction.
//!
//! The initialization response already carries segment 1 and the segment
//! count; the remaining segments are requested one at a time and the
//! transaction is closed with a receipt.

use ebics_protocol::constants::MAX_SEGMENT_SIZE;
use ebics_protocol::{OrderDirection, ResponseMessage, ReturnCode, TransactionId, TransactionPhase};
use ebics_transfer::ContentSink;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::builder::{
    RequestStamp, build_initialization_message, build_receipt_message,
    build_segment_request_message,
};
use crate::config::TransferConfig;
use crate::element::{TransferElement, assigned_transaction_id, check_return_code};
use crate::error::{EbicsError, TransactionError};
use crate::events::TransferEvent;
use crate::order::OrderDescriptor;
use crate::session::Session;
use crate::state::TransferState;
use crate::transport::TransportGateway;

/// Result of a finished download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed {
        transaction_id: TransactionId,
        segments_received: u32,
        bytes_received: u64,
    },
    /// The bank has nothing to deliver for this order (`090005`).
    NoData,
}

/// Drives one download transaction. Single use, like [`UploadTransfer`](crate::UploadTransfer).
pub struct DownloadTransfer<'a> {
    element: TransferElement<'a>,
}

impl<'a> DownloadTransfer<'a> {
    pub fn new(
        session: &'a Session,
        transport: &'a dyn TransportGateway,
        config: &'a TransferConfig,
    ) -> Self {
        Self {
            element: TransferElement::new(session, transport, config),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.element.set_cancel(cancel);
        self
    }

    pub fn with_events(mut self, events: mpsc::Sender<TransferEvent>) -> Self {
        self.element.set_events(events);
        self
    }

    pub fn state(&self) -> TransferState {
        self.element.state()
    }

    /// Downloads the order data of `order` into `sink`.
    pub async fn run(
        &mut self,
        order: &OrderDescriptor,
        sink: &mut dyn ContentSink,
    ) -> Result<DownloadOutcome, TransactionError> {
        self.element.ensure_idle()?;
        match self.drive(order, sink).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => Err(self.element.fail(e).await),
        }
    }

    async fn drive(
        &mut self,
        order: &OrderDescriptor,
        sink: &mut dyn ContentSink,
    ) -> Result<DownloadOutcome, EbicsError> {
        if order.direction() != OrderDirection::Download {
            return Err(EbicsError::Validation(format!(
                "{} is not a download order",
                order.order_type()
            )));
        }
        let session = self.element.session;
        session.require_capabilities()?;
        self.element.config.validate()?;

        self.element.transition(TransferState::Initializing);
        let init = build_initialization_message(session, order, None, &RequestStamp::generate())?;
        let response = self.element.exchange_raw(&init).await?;
        if response.return_code == ReturnCode::NO_DOWNLOAD_DATA_AVAILABLE {
            info!(order_type = %order.order_type(), "no download data available");
            self.element.transition(TransferState::Completed);
            return Ok(DownloadOutcome::NoData);
        }
        check_return_code(&response)?;

        let transaction_id = assigned_transaction_id(&response)?;
        self.element.tx.assign_transaction_id(transaction_id.clone())?;
        let total_segments = response.num_segments.ok_or_else(|| {
            EbicsError::ProtocolViolation("initialization response without segment count".into())
        })?;
        self.element.tx.set_total_segments(total_segments)?;
        self.element.tx.begin_transfer()?;
        self.element.transition(TransferState::Transferring);

        info!(
            transaction_id = %transaction_id,
            order_type = %order.order_type(),
            total_segments,
            "download initialized"
        );
        self.element
            .emit(TransferEvent::Initialized {
                transaction_id: transaction_id.clone(),
                total_segments,
            })
            .await;

        self.element
            .tx
            .verify_response(&response, TransactionPhase::Initialisation, false)?;
        self.store(&transaction_id, &response, sink).await?;

        while !self.element.tx.is_last_segment() {
            let index = self.element.tx.advance()?;
            let is_last = self.element.tx.is_last_segment();
            let request =
                build_segment_request_message(session, &transaction_id, index, is_last)?;
            let response = self.element.exchange(&request).await?;
            self.element
                .tx
                .verify_response(&response, TransactionPhase::Transfer, true)?;
            self.store(&transaction_id, &response, sink).await?;
        }

        if let Err(e) = sink.finish() {
            self.reject(&transaction_id).await;
            return Err(e.into());
        }

        let receipt = build_receipt_message(session, &transaction_id, true);
        let response = self.element.exchange(&receipt).await?;
        self.element
            .tx
            .verify_response(&response, TransactionPhase::Receipt, false)?;

        self.element.transition(TransferState::Completed);
        info!(
            transaction_id = %transaction_id,
            segments = total_segments,
            bytes = self.element.transferred(),
            return_code = %response.return_code,
            "download completed"
        );
        self.element
            .emit(TransferEvent::Completed {
                transaction_id: transaction_id.clone(),
            })
            .await;

        Ok(DownloadOutcome::Completed {
            transaction_id,
            segments_received: total_segments,
            bytes_received: self.element.transferred(),
        })
    }

    /// Hands the segment in `response` to the sink; on failure the bank is
    /// told the download was not accepted.
    async fn store(
        &mut self,
        transaction_id: &TransactionId,
        response: &ResponseMessage,
        sink: &mut dyn ContentSink,
    ) -> Result<(), EbicsError> {
        let index = self.element.tx.segment_index();
        let data = response.order_data().ok_or_else(|| {
            EbicsError::ProtocolViolation(format!("segment {index} arrived without order data"))
        })?;
        if data.len() > MAX_SEGMENT_SIZE {
            return Err(EbicsError::ProtocolViolation(format!(
                "segment {index} is {} bytes, limit is {MAX_SEGMENT_SIZE}",
                data.len()
            )));
        }

        if let Err(e) = sink.write_segment(index, data) {
            self.reject(transaction_id).await;
            return Err(e.into());
        }
        self.element
            .segment_done(transaction_id, data.len(), None)
            .await;
        Ok(())
    }

    /// Best-effort negative receipt; its outcome does not change the failure.
    async fn reject(&self, transaction_id: &TransactionId) {
        let receipt = build_receipt_message(self.element.session, transaction_id, false);
        if let Err(e) = self.element.exchange(&receipt).await {
            warn!(transaction_id = %transaction_id, error = %e, "negative receipt not delivered");
        }
    }
}
