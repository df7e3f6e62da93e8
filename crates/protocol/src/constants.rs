use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Schema revision sent with every request.
pub const DEFAULT_REVISION: u32 = 1;

/// Largest order data segment the protocol allows (1 MiB, before base64).
pub const MAX_SEGMENT_SIZE: usize = 1024 * 1024;

/// Segment size used when the configuration does not override it.
pub const DEFAULT_SEGMENT_SIZE: usize = MAX_SEGMENT_SIZE;

/// Length of the random nonce carried by initialization requests, in bytes.
pub const NONCE_LEN: usize = 16;

/// Security medium announced for signatures (unspecified medium).
pub const DEFAULT_SECURITY_MEDIUM: &str = "0000";

/// Negotiated EBICS schema version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
    #[default]
    #[serde(rename = "H003")]
    H003,
    #[serde(rename = "H004")]
    H004,
    #[serde(rename = "H005")]
    H005,
}

impl ProtocolVersion {
    /// Returns the version string carried verbatim in every message.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::H003 => "H003",
            Self::H004 => "H004",
            Self::H005 => "H005",
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolVersion {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H003" => Ok(Self::H003),
            "H004" => Ok(Self::H004),
            "H005" => Ok(Self::H005),
            other => Err(ProtocolError::UnsupportedVersion(other.to_string())),
        }
    }
}

/// Stage of a transaction a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionPhase {
    #[serde(rename = "Initialisation")]
    Initialisation,
    #[serde(rename = "Transfer")]
    Transfer,
    #[serde(rename = "Receipt")]
    Receipt,
}

impl TransactionPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initialisation => "Initialisation",
            Self::Transfer => "Transfer",
            Self::Receipt => "Receipt",
        }
    }
}

impl fmt::Display for TransactionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
