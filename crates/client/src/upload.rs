//! Segmented upload transaction.

use ebics_protocol::{OrderDirection, TransactionId, TransactionPhase};
use ebics_transfer::{ContentSource, SegmentPlan, TransferError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::builder::{
    RequestStamp, UploadManifest, build_initialization_message, build_transfer_message,
};
use crate::config::TransferConfig;
use crate::element::{TransferElement, assigned_transaction_id};
use crate::error::{EbicsError, TransactionError};
use crate::events::TransferEvent;
use crate::order::OrderDescriptor;
use crate::session::Session;
use crate::state::TransferState;
use crate::transport::TransportGateway;

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub transaction_id: TransactionId,
    pub segments_sent: u32,
    pub bytes_sent: u64,
}

/// Drives one upload transaction: initialization, then every segment in
/// order, each acknowledged before the next is built.
///
/// An instance runs at most once; start a new one to retry.
pub struct UploadTransfer<'a> {
    element: TransferElement<'a>,
}

impl<'a> UploadTransfer<'a> {
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

    /// Uploads the whole content of `source` under `order`.
    pub async fn run(
        &mut self,
        order: &OrderDescriptor,
        source: &mut dyn ContentSource,
    ) -> Result<UploadOutcome, TransactionError> {
        self.element.ensure_idle()?;
        match self.drive(order, source).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => Err(self.element.fail(e).await),
        }
    }

    async fn drive(
        &mut self,
        order: &OrderDescriptor,
        source: &mut dyn ContentSource,
    ) -> Result<UploadOutcome, EbicsError> {
        if order.direction() != OrderDirection::Upload {
            return Err(EbicsError::Validation(format!(
                "{} is not an upload order",
                order.order_type()
            )));
        }
        let session = self.element.session;
        session.require_capabilities()?;
        self.element.config.validate()?;

        let total_size = source.total_size();
        let plan = SegmentPlan::new(total_size, self.element.config.segment_size_limit)?;
        if source.segment_count() != plan.count() {
            return Err(EbicsError::Validation(format!(
                "content is cut into {} segments, the segment size limit needs {}",
                source.segment_count(),
                plan.count()
            )));
        }
        let manifest = UploadManifest {
            total_size,
            num_segments: plan.count(),
            digest: source.digest()?,
        };

        self.element.transition(TransferState::Initializing);
        self.element.tx.set_total_segments(plan.count())?;
        let init = build_initialization_message(
            session,
            order,
            Some(&manifest),
            &RequestStamp::generate(),
        )?;
        let response = self.element.exchange(&init).await?;
        let transaction_id = assigned_transaction_id(&response)?;
        self.element.tx.assign_transaction_id(transaction_id.clone())?;
        self.element.tx.begin_transfer()?;
        self.element.transition(TransferState::Transferring);

        info!(
            transaction_id = %transaction_id,
            order_type = %order.order_type(),
            total_segments = plan.count(),
            total_bytes = total_size,
            "upload initialized"
        );
        self.element
            .emit(TransferEvent::Initialized {
                transaction_id: transaction_id.clone(),
                total_segments: plan.count(),
            })
            .await;

        loop {
            let index = self.element.tx.segment_index();
            let is_last = self.element.tx.is_last_segment();

            let data = source.read_segment(index)?;
            let range = plan.range(index)?;
            let expected = range.end - range.start;
            if data.len() as u64 != expected {
                return Err(TransferError::SizeChanged {
                    expected,
                    actual: data.len() as u64,
                }
                .into());
            }

            let message = build_transfer_message(session, &transaction_id, index, is_last, &data)?;
            let response = self.element.exchange(&message).await?;
            self.element
                .tx
                .verify_response(&response, TransactionPhase::Transfer, true)?;
            self.element
                .segment_done(&transaction_id, data.len(), Some(total_size))
                .await;

            if is_last {
                break;
            }
            self.element.tx.advance()?;
        }

        self.element.transition(TransferState::Completed);
        info!(
            transaction_id = %transaction_id,
            segments = plan.count(),
            bytes = self.element.transferred(),
            "upload completed"
        );
        self.element
            .emit(TransferEvent::Completed {
                transaction_id: transaction_id.clone(),
            })
            .await;

        Ok(UploadOutcome {
            transaction_id,
            segments_sent: plan.count(),
            bytes_sent: self.element.transferred(),
        })
    }
}
