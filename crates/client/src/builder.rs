//! Request envelope construction.
//!
//! Every function here is pure: nonce and clock come in through a
//! [`RequestStamp`], so identical inputs yield identical messages.

use chrono::{DateTime, Utc};
use ebics_protocol::constants::{DEFAULT_SECURITY_MEDIUM, MAX_SEGMENT_SIZE, NONCE_LEN};
use ebics_protocol::{
    Body, EncodedBytes, Header, Message, MutableHeader, OrderDirection, SegmentNumber,
    StaticHeader, TransactionId, TransactionPhase, TransferReceipt,
};

use crate::error::EbicsError;
use crate::order::OrderDescriptor;
use crate::session::Session;

/// Nonce and timestamp of an initialization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStamp {
    pub nonce: String,
    pub timestamp: DateTime<Utc>,
}

impl RequestStamp {
    /// Fresh random nonce (16 bytes, upper hex) stamped with the current time.
    pub fn generate() -> Self {
        let random: [u8; NONCE_LEN] = *uuid::Uuid::new_v4().as_bytes();
        Self {
            nonce: hex::encode_upper(random),
            timestamp: Utc::now(),
        }
    }
}

/// What the bank is told about an upload before the first segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadManifest {
    pub total_size: u64,
    pub num_segments: u32,
    /// SHA-256 of the prepared order data; this is what gets signed.
    pub digest: [u8; 32],
}

fn envelope(
    session: &Session,
    authenticate: bool,
    static_part: StaticHeader,
    mutable_part: MutableHeader,
    body: Body,
) -> Message {
    Message {
        version: session.protocol().as_str().to_string(),
        revision: session.revision(),
        header: Header {
            authenticate,
            static_part,
            mutable_part,
        },
        body,
    }
}

fn check_segment_index(segment_index: u32) -> Result<(), EbicsError> {
    if segment_index == 0 {
        return Err(EbicsError::Validation("segment numbers start at 1".into()));
    }
    Ok(())
}

/// Builds the message opening a transaction.
///
/// Uploads must pass a manifest; its digest is signed with the session's
/// signer. Downloads must not. The message never carries order data.
pub fn build_initialization_message(
    session: &Session,
    order: &OrderDescriptor,
    upload: Option<&UploadManifest>,
    stamp: &RequestStamp,
) -> Result<Message, EbicsError> {
    if order.schema_version() != session.protocol() {
        return Err(EbicsError::Encoding(format!(
            "order uses schema {} but the session negotiated {}",
            order.schema_version(),
            session.protocol()
        )));
    }
    if !order.order_type().is_supported_by(session.protocol()) {
        return Err(EbicsError::Encoding(format!(
            "order type {} cannot be encoded in {}",
            order.order_type(),
            session.protocol()
        )));
    }

    let (num_segments, signature) = match (order.direction(), upload) {
        (OrderDirection::Upload, Some(manifest)) => {
            if manifest.num_segments == 0 {
                return Err(EbicsError::Validation(
                    "upload manifest announces zero segments".into(),
                ));
            }
            let caps = session.require_capabilities()?;
            let signature = caps.signer.sign(&manifest.digest)?;
            (Some(manifest.num_segments), Some(EncodedBytes(signature)))
        }
        (OrderDirection::Upload, None) => {
            return Err(EbicsError::Validation(format!(
                "upload order {} needs an upload manifest",
                order.order_type()
            )));
        }
        (OrderDirection::Download, Some(_)) => {
            return Err(EbicsError::Validation(format!(
                "download order {} cannot carry an upload manifest",
                order.order_type()
            )));
        }
        (OrderDirection::Download, None) => (None, None),
    };

    let user = session.user();
    let static_part = StaticHeader {
        host_id: session.bank().host_id.clone(),
        transaction_id: None,
        nonce: Some(stamp.nonce.clone()),
        timestamp: Some(stamp.timestamp),
        partner_id: Some(user.partner_id.clone()),
        user_id: Some(user.user_id.clone()),
        system_id: user.system_id.clone(),
        order_details: Some(order.details()),
        num_segments,
        security_medium: Some(DEFAULT_SECURITY_MEDIUM.to_string()),
    };
    let mutable_part = MutableHeader {
        transaction_phase: TransactionPhase::Initialisation,
        segment_number: None,
    };
    let body = Body {
        signature_data: signature,
        ..Body::default()
    };

    Ok(envelope(session, true, static_part, mutable_part, body))
}

/// Builds an upload transfer message carrying one segment of order data.
pub fn build_transfer_message(
    session: &Session,
    transaction_id: &TransactionId,
    segment_index: u32,
    is_last_segment: bool,
    segment_payload: &[u8],
) -> Result<Message, EbicsError> {
    check_segment_index(segment_index)?;
    if segment_payload.len() > MAX_SEGMENT_SIZE {
        return Err(EbicsError::Encoding(format!(
            "segment {segment_index} is {} bytes, limit is {MAX_SEGMENT_SIZE}",
            segment_payload.len()
        )));
    }

    let mutable_part = MutableHeader {
        transaction_phase: TransactionPhase::Transfer,
        segment_number: Some(SegmentNumber {
            number: segment_index,
            last_segment: is_last_segment,
        }),
    };
    let body = Body {
        order_data: Some(EncodedBytes(segment_payload.to_vec())),
        ..Body::default()
    };

    Ok(envelope(
        session,
        true,
        StaticHeader::for_transaction(&session.bank().host_id, transaction_id.clone()),
        mutable_part,
        body,
    ))
}

/// Builds a download request for segment `segment_index`.
pub fn build_segment_request_message(
    session: &Session,
    transaction_id: &TransactionId,
    segment_index: u32,
    is_last_segment: bool,
) -> Result<Message, EbicsError> {
    check_segment_index(segment_index)?;

    let mutable_part = MutableHeader {
        transaction_phase: TransactionPhase::Transfer,
        segment_number: Some(SegmentNumber {
            number: segment_index,
            last_segment: is_last_segment,
        }),
    };

    Ok(envelope(
        session,
        true,
        StaticHeader::for_transaction(&session.bank().host_id, transaction_id.clone()),
        mutable_part,
        Body::default(),
    ))
}

/// Builds the receipt closing a download.
pub fn build_receipt_message(
    session: &Session,
    transaction_id: &TransactionId,
    accepted: bool,
) -> Message {
    let mutable_part = MutableHeader {
        transaction_phase: TransactionPhase::Receipt,
        segment_number: None,
    };
    let body = Body {
        transfer_receipt: Some(TransferReceipt::new(accepted)),
        ..Body::default()
    };

    envelope(
        session,
        true,
        StaticHeader::for_transaction(&session.bank().host_id, transaction_id.clone()),
        mutable_part,
        body,
    )
}
