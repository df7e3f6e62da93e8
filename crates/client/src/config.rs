//! Transfer configuration.
//!
//! Bank-negotiated limits are configuration inputs, stored as TOML:
//!
//! ```toml
//! protocol_version = "H004"
//! segment_size_limit = 1048576
//! request_timeout_secs = 30
//! ```

use std::path::Path;
use std::time::Duration;

use ebics_protocol::ProtocolVersion;
use ebics_protocol::constants::{DEFAULT_REVISION, DEFAULT_SEGMENT_SIZE, MAX_SEGMENT_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::EbicsError;

/// Settings shared by every transaction of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Schema version written verbatim into every message.
    pub protocol_version: ProtocolVersion,

    /// Schema revision.
    pub revision: u32,

    /// Maximum order data bytes per segment (before base64).
    pub segment_size_limit: usize,

    /// Upper bound for one request/response round-trip.
    pub request_timeout_secs: u64,

    /// Zlib-compress order data before encryption.
    pub compress_order_data: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            protocol_version: ProtocolVersion::default(),
            revision: DEFAULT_REVISION,
            segment_size_limit: DEFAULT_SEGMENT_SIZE,
            request_timeout_secs: 30,
            compress_order_data: true,
        }
    }
}

impl TransferConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, EbicsError> {
        let config: TransferConfig =
            toml::from_str(s).map_err(|e| EbicsError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, EbicsError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EbicsError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "transfer configuration loaded");
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, EbicsError> {
        toml::to_string_pretty(self).map_err(|e| EbicsError::Configuration(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), EbicsError> {
        if self.segment_size_limit == 0 || self.segment_size_limit > MAX_SEGMENT_SIZE {
            return Err(EbicsError::Configuration(format!(
                "segment_size_limit must be between 1 and {MAX_SEGMENT_SIZE}, got {}",
                self.segment_size_limit
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(EbicsError::Configuration(
                "request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
