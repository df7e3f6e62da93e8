use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::constants::TransactionPhase;
use crate::envelope::{EncodedBytes, SegmentNumber};
use crate::return_code::ReturnCode;
use crate::transaction::TransactionId;

/// Response envelope returned by the bank for any request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    pub return_code: ReturnCode,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub report_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<TransactionPhase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_number: Option<SegmentNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_segments: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_data: Option<EncodedBytes>,
}

impl ResponseMessage {
    /// Creates an OK response for the given phase.
    pub fn ok(phase: TransactionPhase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::default()
        }
    }

    /// Creates an error response carrying `code` and a report text.
    pub fn error(code: ReturnCode, report_text: impl Into<String>) -> Self {
        Self {
            return_code: code,
            report_text: report_text.into(),
            ..Self::default()
        }
    }

    pub fn with_transaction_id(mut self, id: TransactionId) -> Self {
        self.transaction_id = Some(id);
        self
    }

    pub fn with_segment(mut self, number: u32, last_segment: bool) -> Self {
        self.segment_number = Some(SegmentNumber {
            number,
            last_segment,
        });
        self
    }

    pub fn with_num_segments(mut self, n: u32) -> Self {
        self.num_segments = Some(n);
        self
    }

    pub fn with_order_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.order_data = Some(EncodedBytes(data.into()));
        self
    }

    pub fn is_ok(&self) -> bool {
        self.return_code.is_ok()
    }

    pub fn order_data(&self) -> Option<&[u8]> {
        self.order_data.as_ref().map(EncodedBytes::as_bytes)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
