//! Machinery shared by upload and download transfers.

use ebics_protocol::{Message, ResponseMessage, TransactionId};
use ebics_transfer::{SpeedCalculator, TransferProgress};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::TransferConfig;
use crate::error::{EbicsError, TransactionError};
use crate::events::TransferEvent;
use crate::session::Session;
use crate::state::{TransactionState, TransferState};
use crate::transport::TransportGateway;

/// One transaction's protocol state plus the collaborators it talks to.
pub(crate) struct TransferElement<'a> {
    pub(crate) session: &'a Session,
    transport: &'a dyn TransportGateway,
    pub(crate) config: &'a TransferConfig,
    cancel: CancellationToken,
    events: Option<mpsc::Sender<TransferEvent>>,
    state: TransferState,
    pub(crate) tx: TransactionState,
    speed: SpeedCalculator,
    transferred: u64,
}

impl<'a> TransferElement<'a> {
    pub(crate) fn new(
        session: &'a Session,
        transport: &'a dyn TransportGateway,
        config: &'a TransferConfig,
    ) -> Self {
        Self {
            session,
            transport,
            config,
            cancel: CancellationToken::new(),
            events: None,
            state: TransferState::Idle,
            tx: TransactionState::new(),
            speed: SpeedCalculator::default(),
            transferred: 0,
        }
    }

    pub(crate) fn set_cancel(&mut self, cancel: CancellationToken) {
        self.cancel = cancel;
    }

    pub(crate) fn set_events(&mut self, events: mpsc::Sender<TransferEvent>) {
        self.events = Some(events);
    }

    pub(crate) fn state(&self) -> TransferState {
        self.state
    }

    pub(crate) fn transferred(&self) -> u64 {
        self.transferred
    }

    /// Rejects a second `run` on the same instance.
    pub(crate) fn ensure_idle(&self) -> Result<(), TransactionError> {
        if self.state == TransferState::Idle {
            return Ok(());
        }
        Err(TransactionError {
            transaction_id: self.tx.transaction_id().cloned(),
            segment: None,
            state: self.state,
            error: EbicsError::Validation("transfer instance already used".into()),
        })
    }

    pub(crate) fn transition(&mut self, next: TransferState) {
        debug!(
            from = %self.state,
            to = %next,
            transaction_id = ?self.tx.transaction_id(),
            "transfer state change"
        );
        self.state = next;
    }

    /// Sends `message` under the request timeout, without judging the return code.
    ///
    /// Cancellation is checked before the send and again once the response
    /// is in; an exchange already on the wire is never interrupted.
    pub(crate) async fn exchange_raw(
        &self,
        message: &Message,
    ) -> Result<ResponseMessage, EbicsError> {
        if self.cancel.is_cancelled() {
            return Err(EbicsError::Cancelled);
        }

        let timeout = self.config.request_timeout();
        debug!(
            phase = %message.phase(),
            transaction_id = ?message.transaction_id(),
            segment = ?message.segment_number().map(|s| s.number),
            "sending request"
        );
        let response = tokio::time::timeout(timeout, self.transport.send(message))
            .await
            .map_err(|_| EbicsError::Timeout(timeout))??;
        debug!(return_code = %response.return_code, "response received");

        if self.cancel.is_cancelled() {
            return Err(EbicsError::Cancelled);
        }
        Ok(response)
    }

    /// Like [`exchange_raw`](Self::exchange_raw), failing on any non-OK return code.
    pub(crate) async fn exchange(&self, message: &Message) -> Result<ResponseMessage, EbicsError> {
        let response = self.exchange_raw(message).await?;
        check_return_code(&response)?;
        Ok(response)
    }

    /// Records throughput for a finished segment and emits a progress event.
    pub(crate) async fn segment_done(
        &mut self,
        transaction_id: &TransactionId,
        bytes: usize,
        total_bytes: Option<u64>,
    ) {
        self.transferred += bytes as u64;
        self.speed.add_sample(bytes as u64);
        let progress = TransferProgress {
            segment: self.tx.segment_index(),
            total_segments: self.tx.total_segments(),
            transferred_bytes: self.transferred,
            total_bytes,
            bytes_per_second: self.speed.bytes_per_second(),
        };
        debug!(
            transaction_id = %transaction_id,
            segment = progress.segment,
            total_segments = progress.total_segments,
            bytes,
            "segment done"
        );
        self.emit(TransferEvent::Segment {
            transaction_id: transaction_id.clone(),
            progress,
        })
        .await;
    }

    /// Moves to `Failed` and wraps `error` with the transaction context.
    pub(crate) async fn fail(&mut self, error: EbicsError) -> TransactionError {
        let state = self.state;
        let transaction_id = self.tx.transaction_id().cloned();
        let segment = match self.tx.segment_index() {
            0 => None,
            n => Some(n),
        };
        self.transition(TransferState::Failed);

        warn!(
            transaction_id = ?transaction_id,
            segment = ?segment,
            state = %state,
            error = %error,
            "transfer failed"
        );
        self.emit(TransferEvent::Failed {
            transaction_id: transaction_id.clone(),
            error: error.to_string(),
        })
        .await;

        TransactionError {
            transaction_id,
            segment,
            state,
            error,
        }
    }

    pub(crate) async fn emit(&self, event: TransferEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event).await;
        }
    }
}

/// Maps a non-OK bank return code to [`EbicsError::Bank`].
pub(crate) fn check_return_code(response: &ResponseMessage) -> Result<(), EbicsError> {
    if response.is_ok() {
        return Ok(());
    }
    Err(EbicsError::Bank {
        code: response.return_code,
        report_text: response.report_text.clone(),
    })
}

/// Transaction ID assigned in an initialization response.
pub(crate) fn assigned_transaction_id(
    response: &ResponseMessage,
) -> Result<TransactionId, EbicsError> {
    response.transaction_id.clone().ok_or_else(|| {
        EbicsError::ProtocolViolation("initialization response without transaction id".into())
    })
}
