use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::constants::TransactionPhase;
use crate::order::{DateRange, OrderAttribute};
use crate::transaction::TransactionId;

/// Byte buffer carried base64-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedBytes(#[serde(with = "crate::base64_bytes")] pub Vec<u8>);

impl EncodedBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Segment position inside the mutable header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentNumber {
    pub number: u32,
    pub last_segment: bool,
}

/// Order identification announced at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order_type: String,
    pub order_attribute: OrderAttribute,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

/// Header part that stays fixed for the whole transaction.
///
/// Initialization requests carry the identity, nonce and order details but
/// no transaction ID; every later request carries only the host ID and the
/// transaction ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticHeader {
    pub host_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_details: Option<OrderDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_segments: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_medium: Option<String>,
}

impl StaticHeader {
    /// Header for requests after initialization.
    pub fn for_transaction(host_id: impl Into<String>, transaction_id: TransactionId) -> Self {
        Self {
            host_id: host_id.into(),
            transaction_id: Some(transaction_id),
            nonce: None,
            timestamp: None,
            partner_id: None,
            user_id: None,
            system_id: None,
            order_details: None,
            num_segments: None,
            security_medium: None,
        }
    }
}

/// Header part that changes with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutableHeader {
    pub transaction_phase: TransactionPhase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_number: Option<SegmentNumber>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub authenticate: bool,
    #[serde(rename = "static")]
    pub static_part: StaticHeader,
    #[serde(rename = "mutable")]
    pub mutable_part: MutableHeader,
}

/// Receipt closing a download transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub receipt_code: u8,
}

impl TransferReceipt {
    pub const ACCEPTED: u8 = 0;
    pub const REJECTED: u8 = 1;

    pub fn new(accepted: bool) -> Self {
        Self {
            receipt_code: if accepted {
                Self::ACCEPTED
            } else {
                Self::REJECTED
            },
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.receipt_code == Self::ACCEPTED
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Body {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_data: Option<EncodedBytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_data: Option<EncodedBytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_receipt: Option<TransferReceipt>,
}

/// Request envelope sent to the bank.
///
/// A `Message` is an immutable snapshot: builders produce a fresh one per
/// phase/segment and nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub version: String,
    pub revision: u32,
    pub header: Header,
    pub body: Body,
}

impl Message {
    pub fn phase(&self) -> TransactionPhase {
        self.header.mutable_part.transaction_phase
    }

    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.header.static_part.transaction_id.as_ref()
    }

    pub fn segment_number(&self) -> Option<SegmentNumber> {
        self.header.mutable_part.segment_number
    }

    pub fn has_order_data(&self) -> bool {
        self.body.order_data.is_some()
    }

    /// Raw (decoded) order data bytes, if any.
    pub fn order_data(&self) -> Option<&[u8]> {
        self.body.order_data.as_ref().map(EncodedBytes::as_bytes)
    }

    /// Serializes the envelope to its canonical JSON form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
