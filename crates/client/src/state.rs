//! Transfer lifecycle states and per-transaction bookkeeping.

use std::fmt;

use ebics_protocol::{ResponseMessage, TransactionId, TransactionPhase};

use crate::error::EbicsError;

/// Lifecycle of one transfer instance.
///
/// `Completed` and `Failed` are terminal; a failed transfer is never
/// resumed, callers start a new transaction instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Initializing,
    Transferring,
    Completed,
    Failed,
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Transferring => "transferring",
            Self::Completed => "completed",
            Self::Failed => "failed",
        })
    }
}

/// Short-lived state of one transaction, owned by a single transfer call.
///
/// Invariants: the transaction ID never changes once assigned, the segment
/// index only ever moves forward by one, and the last-segment flag is
/// derived from the index rather than stored.
#[derive(Debug, Clone, Default)]
pub struct TransactionState {
    transaction_id: Option<TransactionId>,
    segment_index: u32,
    total_segments: u32,
}

impl TransactionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transaction_id(&self) -> Option<&TransactionId> {
        self.transaction_id.as_ref()
    }

    /// Current 1-based segment, 0 before the transfer phase.
    pub fn segment_index(&self) -> u32 {
        self.segment_index
    }

    pub fn total_segments(&self) -> u32 {
        self.total_segments
    }

    pub fn is_last_segment(&self) -> bool {
        self.segment_index != 0 && self.segment_index == self.total_segments
    }

    /// Fixes the segment count. Allowed once, before the transfer phase.
    pub fn set_total_segments(&mut self, total: u32) -> Result<(), EbicsError> {
        if total == 0 {
            return Err(EbicsError::ProtocolViolation(
                "transaction announced zero segments".into(),
            ));
        }
        if self.total_segments != 0 && self.total_segments != total {
            return Err(EbicsError::ProtocolViolation(format!(
                "segment count changed from {} to {total}",
                self.total_segments
            )));
        }
        self.total_segments = total;
        Ok(())
    }

    /// Records the bank-assigned transaction ID.
    pub fn assign_transaction_id(&mut self, id: TransactionId) -> Result<(), EbicsError> {
        match &self.transaction_id {
            Some(existing) if *existing != id => Err(EbicsError::ProtocolViolation(format!(
                "transaction id changed from {existing} to {id}"
            ))),
            Some(_) => Ok(()),
            None => {
                self.transaction_id = Some(id);
                Ok(())
            }
        }
    }

    /// Enters the transfer phase at segment 1.
    pub fn begin_transfer(&mut self) -> Result<(), EbicsError> {
        if self.transaction_id.is_none() {
            return Err(EbicsError::ProtocolViolation(
                "transfer phase without a transaction id".into(),
            ));
        }
        if self.total_segments == 0 {
            return Err(EbicsError::ProtocolViolation(
                "transfer phase without a segment count".into(),
            ));
        }
        if self.segment_index != 0 {
            return Err(EbicsError::ProtocolViolation(
                "transfer phase already started".into(),
            ));
        }
        self.segment_index = 1;
        Ok(())
    }

    /// Moves to the next segment and returns its index.
    pub fn advance(&mut self) -> Result<u32, EbicsError> {
        if self.segment_index == 0 || self.segment_index >= self.total_segments {
            return Err(EbicsError::ProtocolViolation(format!(
                "cannot advance past segment {} of {}",
                self.segment_index, self.total_segments
            )));
        }
        self.segment_index += 1;
        Ok(self.segment_index)
    }

    /// Checks that `response` answers a request of phase `expected_phase`,
    /// echoes this transaction and, when it reports a segment number, the
    /// segment currently being processed.
    ///
    /// `require_segment` makes a missing segment number a violation too.
    pub fn verify_response(
        &self,
        response: &ResponseMessage,
        expected_phase: TransactionPhase,
        require_segment: bool,
    ) -> Result<(), EbicsError> {
        if let Some(phase) = response.phase.filter(|p| *p != expected_phase) {
            return Err(EbicsError::ProtocolViolation(format!(
                "{phase} response to a {expected_phase} request"
            )));
        }

        let Some(expected) = &self.transaction_id else {
            return Err(EbicsError::ProtocolViolation(
                "no transaction id to verify against".into(),
            ));
        };

        match &response.transaction_id {
            Some(got) if got == expected => {}
            Some(got) => {
                return Err(EbicsError::ProtocolViolation(format!(
                    "response for transaction {got}, expected {expected}"
                )));
            }
            None => {
                return Err(EbicsError::ProtocolViolation(format!(
                    "response without transaction id, expected {expected}"
                )));
            }
        }

        match response.segment_number {
            Some(seg) if seg.number != self.segment_index => {
                Err(EbicsError::ProtocolViolation(format!(
                    "response for segment {}, expected {}",
                    seg.number, self.segment_index
                )))
            }
            Some(seg) if seg.last_segment != self.is_last_segment() => {
                Err(EbicsError::ProtocolViolation(format!(
                    "last-segment flag mismatch at segment {} of {}",
                    self.segment_index, self.total_segments
                )))
            }
            Some(_) => Ok(()),
            None if require_segment => Err(EbicsError::ProtocolViolation(format!(
                "response without segment number, expected {}",
                self.segment_index
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txid(hex: &str) -> TransactionId {
        TransactionId::from_hex(hex).unwrap()
    }

    fn started(total: u32) -> TransactionState {
        let mut s = TransactionState::new();
        s.set_total_segments(total).unwrap();
        s.assign_transaction_id(txid("AA01")).unwrap();
        s.begin_transfer().unwrap();
        s
    }

    #[test]
    fn new_state_has_no_id_and_no_segment() {
        let s = TransactionState::new();
        assert!(s.transaction_id().is_none());
        assert_eq!(s.segment_index(), 0);
        assert!(!s.is_last_segment());
    }

    #[test]
    fn transaction_id_is_immutable_once_assigned() {
        let mut s = TransactionState::new();
        s.assign_transaction_id(txid("AA01")).unwrap();
        s.assign_transaction_id(txid("AA01")).unwrap();
        let err = s.assign_transaction_id(txid("BB02")).unwrap_err();
        assert!(matches!(err, EbicsError::ProtocolViolation(_)));
        assert_eq!(s.transaction_id(), Some(&txid("AA01")));
    }

    #[test]
    fn exactly_one_last_segment() {
        let mut s = started(3);
        let mut flags = vec![s.is_last_segment()];
        while !s.is_last_segment() {
            s.advance().unwrap();
            flags.push(s.is_last_segment());
        }
        assert_eq!(flags, vec![false, false, true]);
        assert!(s.advance().is_err());
        assert_eq!(s.segment_index(), 3);
    }

    #[test]
    fn single_segment_is_last_immediately() {
        let s = started(1);
        assert!(s.is_last_segment());
    }

    #[test]
    fn begin_requires_id_and_count() {
        let mut s = TransactionState::new();
        s.set_total_segments(2).unwrap();
        assert!(s.begin_transfer().is_err());
        s.assign_transaction_id(txid("01")).unwrap();
        s.begin_transfer().unwrap();
        assert!(s.begin_transfer().is_err());
    }

    #[test]
    fn segment_count_fixed_once_known() {
        let mut s = TransactionState::new();
        assert!(s.set_total_segments(0).is_err());
        s.set_total_segments(4).unwrap();
        s.set_total_segments(4).unwrap();
        assert!(s.set_total_segments(5).is_err());
    }

    #[test]
    fn verify_accepts_matching_echo() {
        let s = started(2);
        let resp = ResponseMessage::ok(TransactionPhase::Transfer)
            .with_transaction_id(txid("AA01"))
            .with_segment(1, false);
        s.verify_response(&resp, TransactionPhase::Transfer, true).unwrap();
    }

    #[test]
    fn verify_rejects_foreign_transaction() {
        let s = started(2);
        let resp = ResponseMessage::ok(TransactionPhase::Transfer)
            .with_transaction_id(txid("FFFF"))
            .with_segment(1, false);
        assert!(matches!(
            s.verify_response(&resp, TransactionPhase::Transfer, false),
            Err(EbicsError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn verify_rejects_missing_transaction_id() {
        let s = started(2);
        let resp = ResponseMessage::ok(TransactionPhase::Transfer).with_segment(1, false);
        assert!(s.verify_response(&resp, TransactionPhase::Transfer, false).is_err());
    }

    #[test]
    fn verify_rejects_wrong_segment_and_flag() {
        let s = started(2);
        let wrong_number = ResponseMessage::ok(TransactionPhase::Transfer)
            .with_transaction_id(txid("AA01"))
            .with_segment(2, false);
        assert!(s.verify_response(&wrong_number, TransactionPhase::Transfer, false).is_err());

        let wrong_flag = ResponseMessage::ok(TransactionPhase::Transfer)
            .with_transaction_id(txid("AA01"))
            .with_segment(1, true);
        assert!(s.verify_response(&wrong_flag, TransactionPhase::Transfer, false).is_err());
    }

    #[test]
    fn verify_rejects_response_for_other_phase() {
        let s = started(2);
        let resp = ResponseMessage::ok(TransactionPhase::Initialisation)
            .with_transaction_id(txid("AA01"))
            .with_segment(1, false);
        assert!(matches!(
            s.verify_response(&resp, TransactionPhase::Transfer, true),
            Err(EbicsError::ProtocolViolation(_))
        ));

        let unphased = ResponseMessage {
            phase: None,
            ..resp
        };
        assert!(s.verify_response(&unphased, TransactionPhase::Transfer, true).is_ok());
    }

    #[test]
    fn verify_optional_segment_number() {
        let s = started(2);
        let resp = ResponseMessage::ok(TransactionPhase::Transfer).with_transaction_id(txid("AA01"));
        assert!(s.verify_response(&resp, TransactionPhase::Transfer, false).is_ok());
        assert!(s.verify_response(&resp, TransactionPhase::Transfer, true).is_err());
    }
}
