use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Bank-issued identifier binding all messages of one transaction.
///
/// Opaque bytes, rendered as upper-case hex on the wire. Never empty.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId(Vec<u8>);

impl TransactionId {
    /// Wraps raw identifier bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ProtocolError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ProtocolError::InvalidTransactionId("empty".into()));
        }
        Ok(Self(bytes))
    }

    /// Parses the hex wire form (case-insensitive).
    pub fn from_hex(s: &str) -> Result<Self, ProtocolError> {
        let bytes = hex::decode(s)
            .map_err(|e| ProtocolError::InvalidTransactionId(format!("{s}: {e}")))?;
        Self::new(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.to_hex())
    }
}

impl TryFrom<String> for TransactionId {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_rejected() {
        assert!(TransactionId::new(Vec::new()).is_err());
        assert!(TransactionId::from_hex("").is_err());
    }

    #[test]
    fn hex_is_upper_case_and_case_insensitive_on_parse() {
        let id = TransactionId::from_hex("0a1b2c3d").unwrap();
        assert_eq!(id.as_bytes(), &[0x0a, 0x1b, 0x2c, 0x3d]);
        assert_eq!(id.to_string(), "0A1B2C3D");
        assert_eq!(TransactionId::from_hex("0A1B2C3D").unwrap(), id);
    }

    #[test]
    fn invalid_hex_rejected() {
        assert!(TransactionId::from_hex("zz").is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = TransactionId::new(vec![0xde, 0xad, 0xbe, 0xef]).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"DEADBEEF\"");
        let parsed: TransactionId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<TransactionId>("\"\"").is_err());
    }
}
