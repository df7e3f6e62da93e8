//! Order type codes and order attributes.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::constants::ProtocolVersion;

/// Whether payload flows client -> bank or bank -> client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    Upload,
    Download,
}

/// Business operation a transfer belongs to.
///
/// Only the subset of the catalog that moves order data through segmented
/// transfers is modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    /// Generic file upload.
    #[serde(rename = "FUL")]
    Ful,
    /// Generic file download.
    #[serde(rename = "FDL")]
    Fdl,
    /// SEPA credit transfer initiation.
    #[serde(rename = "CCT")]
    Cct,
    /// SEPA direct debit initiation.
    #[serde(rename = "CDD")]
    Cdd,
    /// MT940 account statement.
    #[serde(rename = "STA")]
    Sta,
    /// MT942 interim transaction report.
    #[serde(rename = "VMK")]
    Vmk,
    /// camt.053 bank statement.
    #[serde(rename = "C53")]
    C53,
    /// Customer acknowledgement (XML).
    #[serde(rename = "HAC")]
    Hac,
    /// Customer protocol overview (text).
    #[serde(rename = "PTK")]
    Ptk,
    /// Business transaction format upload.
    #[serde(rename = "BTU")]
    Btu,
    /// Business transaction format download.
    #[serde(rename = "BTD")]
    Btd,
}

impl OrderType {
    pub const ALL: [OrderType; 11] = [
        Self::Ful,
        Self::Fdl,
        Self::Cct,
        Self::Cdd,
        Self::Sta,
        Self::Vmk,
        Self::C53,
        Self::Hac,
        Self::Ptk,
        Self::Btu,
        Self::Btd,
    ];

    /// Three-letter code used on the wire.
    pub fn code(self) -> &'static str {
        match self {
            Self::Ful => "FUL",
            Self::Fdl => "FDL",
            Self::Cct => "CCT",
            Self::Cdd => "CDD",
            Self::Sta => "STA",
            Self::Vmk => "VMK",
            Self::C53 => "C53",
            Self::Hac => "HAC",
            Self::Ptk => "PTK",
            Self::Btu => "BTU",
            Self::Btd => "BTD",
        }
    }

    /// Parses a wire code.
    pub fn from_code(code: &str) -> Result<Self, ProtocolError> {
        Self::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| ProtocolError::UnknownOrderType(code.to_string()))
    }

    pub fn direction(self) -> OrderDirection {
        match self {
            Self::Ful | Self::Cct | Self::Cdd | Self::Btu => OrderDirection::Upload,
            Self::Fdl | Self::Sta | Self::Vmk | Self::C53 | Self::Hac | Self::Ptk | Self::Btd => {
                OrderDirection::Download
            }
        }
    }

    /// Returns `true` if `version` defines this order type.
    ///
    /// H005 replaced FUL/FDL with BTU/BTD; the BTF types do not exist before H005.
    pub fn is_supported_by(self, version: ProtocolVersion) -> bool {
        match self {
            Self::Ful | Self::Fdl => version != ProtocolVersion::H005,
            Self::Btu | Self::Btd => version == ProtocolVersion::H005,
            _ => true,
        }
    }

    /// Order attribute the transfer must announce.
    pub fn attribute(self) -> OrderAttribute {
        match self.direction() {
            OrderDirection::Upload => OrderAttribute::Ozhnn,
            OrderDirection::Download => OrderAttribute::Dzhnn,
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OrderType {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

/// Order attribute: which of order data, signature and encryption are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderAttribute {
    /// Order data + electronic signature, encrypted.
    #[serde(rename = "OZHNN")]
    Ozhnn,
    /// Order data without signature, encrypted.
    #[serde(rename = "DZHNN")]
    Dzhnn,
}

impl OrderAttribute {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ozhnn => "OZHNN",
            Self::Dzhnn => "DZHNN",
        }
    }
}

/// Inclusive date range restricting a download order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ProtocolError> {
        if start > end {
            return Err(ProtocolError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_roundtrip_for_all_types() {
        for t in OrderType::ALL {
            assert_eq!(OrderType::from_code(t.code()).unwrap(), t);
        }
    }

    #[test]
    fn unknown_code_rejected() {
        let err = OrderType::from_code("XYZ").unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownOrderType(c) if c == "XYZ"));
    }

    #[test]
    fn directions() {
        assert_eq!(OrderType::Ful.direction(), OrderDirection::Upload);
        assert_eq!(OrderType::Sta.direction(), OrderDirection::Download);
        assert_eq!(OrderType::Btd.direction(), OrderDirection::Download);
    }

    #[test]
    fn version_support() {
        assert!(OrderType::Ful.is_supported_by(ProtocolVersion::H003));
        assert!(!OrderType::Ful.is_supported_by(ProtocolVersion::H005));
        assert!(!OrderType::Btu.is_supported_by(ProtocolVersion::H004));
        assert!(OrderType::Btu.is_supported_by(ProtocolVersion::H005));
        assert!(OrderType::Sta.is_supported_by(ProtocolVersion::H005));
    }

    #[test]
    fn attribute_follows_direction() {
        assert_eq!(OrderType::Cct.attribute(), OrderAttribute::Ozhnn);
        assert_eq!(OrderType::C53.attribute(), OrderAttribute::Dzhnn);
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let a = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(DateRange::new(a, b).is_err());
        assert!(DateRange::new(b, a).is_ok());
        assert!(DateRange::new(a, a).is_ok());
    }

    #[test]
    fn order_type_serializes_as_code() {
        let json = serde_json::to_string(&OrderType::Vmk).unwrap();
        assert_eq!(json, "\"VMK\"");
    }
}
