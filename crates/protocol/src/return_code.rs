//! EBICS technical and business return codes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Six-digit return code reported by the bank.
///
/// Codes below `060000` are successes, informational notices or warnings;
/// everything from `060000` upward is an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReturnCode(u32);

impl ReturnCode {
    pub const OK: ReturnCode = ReturnCode(0);
    pub const DOWNLOAD_POSTPROCESS_DONE: ReturnCode = ReturnCode(11_000);
    pub const DOWNLOAD_POSTPROCESS_SKIPPED: ReturnCode = ReturnCode(11_001);
    pub const TX_SEGMENT_NUMBER_UNDERRUN: ReturnCode = ReturnCode(11_101);
    pub const ORDER_PARAMS_IGNORED: ReturnCode = ReturnCode(31_001);
    pub const AUTHENTICATION_FAILED: ReturnCode = ReturnCode(61_001);
    pub const INVALID_REQUEST: ReturnCode = ReturnCode(61_002);
    pub const INTERNAL_ERROR: ReturnCode = ReturnCode(61_099);
    pub const TX_RECOVERY_SYNC: ReturnCode = ReturnCode(61_101);
    pub const NO_DOWNLOAD_DATA_AVAILABLE: ReturnCode = ReturnCode(90_005);
    pub const TX_UNKNOWN_TXID: ReturnCode = ReturnCode(91_101);
    pub const TX_ABORT: ReturnCode = ReturnCode(91_102);
    pub const TX_MESSAGE_REPLAY: ReturnCode = ReturnCode(91_103);
    pub const TX_SEGMENT_NUMBER_EXCEEDED: ReturnCode = ReturnCode(91_104);
    pub const INVALID_ORDER_PARAMS: ReturnCode = ReturnCode(91_112);
    pub const INVALID_XML: ReturnCode = ReturnCode(91_010);

    const MAX: u32 = 999_999;

    pub fn new(code: u32) -> Result<Self, ProtocolError> {
        if code > Self::MAX {
            return Err(ProtocolError::InvalidReturnCode(code.to_string()));
        }
        Ok(Self(code))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Returns `true` for success, informational and warning codes.
    pub fn is_ok(self) -> bool {
        self.0 < 60_000
    }

    /// Symbolic name of well-known codes.
    pub fn symbol(self) -> Option<&'static str> {
        let name = match self {
            Self::OK => "EBICS_OK",
            Self::DOWNLOAD_POSTPROCESS_DONE => "EBICS_DOWNLOAD_POSTPROCESS_DONE",
            Self::DOWNLOAD_POSTPROCESS_SKIPPED => "EBICS_DOWNLOAD_POSTPROCESS_SKIPPED",
            Self::TX_SEGMENT_NUMBER_UNDERRUN => "EBICS_TX_SEGMENT_NUMBER_UNDERRUN",
            Self::ORDER_PARAMS_IGNORED => "EBICS_ORDER_PARAMS_IGNORED",
            Self::AUTHENTICATION_FAILED => "EBICS_AUTHENTICATION_FAILED",
            Self::INVALID_REQUEST => "EBICS_INVALID_REQUEST",
            Self::INTERNAL_ERROR => "EBICS_INTERNAL_ERROR",
            Self::TX_RECOVERY_SYNC => "EBICS_TX_RECOVERY_SYNC",
            Self::NO_DOWNLOAD_DATA_AVAILABLE => "EBICS_NO_DOWNLOAD_DATA_AVAILABLE",
            Self::TX_UNKNOWN_TXID => "EBICS_TX_UNKNOWN_TXID",
            Self::TX_ABORT => "EBICS_TX_ABORT",
            Self::TX_MESSAGE_REPLAY => "EBICS_TX_MESSAGE_REPLAY",
            Self::TX_SEGMENT_NUMBER_EXCEEDED => "EBICS_TX_SEGMENT_NUMBER_EXCEEDED",
            Self::INVALID_ORDER_PARAMS => "EBICS_INVALID_ORDER_PARAMS",
            Self::INVALID_XML => "EBICS_INVALID_XML",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}", self.0)?;
        if let Some(symbol) = self.symbol() {
            write!(f, " ({symbol})")?;
        }
        Ok(())
    }
}

impl TryFrom<String> for ReturnCode {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::InvalidReturnCode(value));
        }
        let code = value
            .parse::<u32>()
            .map_err(|_| ProtocolError::InvalidReturnCode(value.clone()))?;
        Self::new(code)
    }
}

impl From<ReturnCode> for String {
    fn from(code: ReturnCode) -> Self {
        format!("{:06}", code.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_and_warnings_are_ok() {
        assert!(ReturnCode::OK.is_ok());
        assert!(ReturnCode::DOWNLOAD_POSTPROCESS_DONE.is_ok());
        assert!(ReturnCode::ORDER_PARAMS_IGNORED.is_ok());
    }

    #[test]
    fn errors_are_not_ok() {
        assert!(!ReturnCode::AUTHENTICATION_FAILED.is_ok());
        assert!(!ReturnCode::NO_DOWNLOAD_DATA_AVAILABLE.is_ok());
        assert!(!ReturnCode::TX_UNKNOWN_TXID.is_ok());
    }

    #[test]
    fn wire_form_is_six_digits() {
        let json = serde_json::to_string(&ReturnCode::DOWNLOAD_POSTPROCESS_DONE).unwrap();
        assert_eq!(json, "\"011000\"");
        let parsed: ReturnCode = serde_json::from_str("\"091101\"").unwrap();
        assert_eq!(parsed, ReturnCode::TX_UNKNOWN_TXID);
    }

    #[test]
    fn malformed_codes_rejected() {
        assert!(ReturnCode::try_from("12345".to_string()).is_err());
        assert!(ReturnCode::try_from("0000a0".to_string()).is_err());
        assert!(ReturnCode::new(1_000_000).is_err());
    }

    #[test]
    fn display_includes_symbol_when_known() {
        assert_eq!(ReturnCode::OK.to_string(), "000000 (EBICS_OK)");
        assert_eq!(ReturnCode::new(12).unwrap().to_string(), "000012");
    }
}
