//! Order descriptors: which business operation a transfer belongs to.

use ebics_protocol::{
    DateRange, OrderAttribute, OrderDetails, OrderDirection, OrderType, ProtocolVersion,
};

use crate::error::EbicsError;

/// Validated order type + schema version pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderDescriptor {
    order_type: OrderType,
    schema_version: ProtocolVersion,
    date_range: Option<DateRange>,
}

impl OrderDescriptor {
    /// Fails with a validation error when `schema_version` does not define `order_type`.
    pub fn new(order_type: OrderType, schema_version: ProtocolVersion) -> Result<Self, EbicsError> {
        if !order_type.is_supported_by(schema_version) {
            return Err(EbicsError::Validation(format!(
                "order type {order_type} is not defined in {schema_version}"
            )));
        }
        Ok(Self {
            order_type,
            schema_version,
            date_range: None,
        })
    }

    /// Parses a wire code such as `"FUL"`.
    pub fn from_code(code: &str, schema_version: ProtocolVersion) -> Result<Self, EbicsError> {
        let order_type = OrderType::from_code(code)
            .map_err(|e| EbicsError::Validation(e.to_string()))?;
        Self::new(order_type, schema_version)
    }

    /// Restricts a download order to a date range.
    pub fn with_date_range(mut self, range: DateRange) -> Result<Self, EbicsError> {
        if self.direction() != OrderDirection::Download {
            return Err(EbicsError::Validation(format!(
                "date range not allowed for upload order {}",
                self.order_type
            )));
        }
        self.date_range = Some(range);
        Ok(self)
    }

    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    pub fn schema_version(&self) -> ProtocolVersion {
        self.schema_version
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }

    pub fn direction(&self) -> OrderDirection {
        self.order_type.direction()
    }

    pub fn attribute(&self) -> OrderAttribute {
        self.order_type.attribute()
    }

    /// Wire form announced at initialization.
    pub fn details(&self) -> OrderDetails {
        OrderDetails {
            order_type: self.order_type.code().to_string(),
            order_attribute: self.attribute(),
            date_range: self.date_range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn known_code_accepted() {
        let order = OrderDescriptor::from_code("FUL", ProtocolVersion::H003).unwrap();
        assert_eq!(order.order_type(), OrderType::Ful);
        assert_eq!(order.direction(), OrderDirection::Upload);
        assert_eq!(order.attribute(), OrderAttribute::Ozhnn);
    }

    #[test]
    fn unknown_code_is_validation_error() {
        let err = OrderDescriptor::from_code("ZZZ", ProtocolVersion::H003).unwrap_err();
        assert!(matches!(err, EbicsError::Validation(_)));
    }

    #[test]
    fn code_unknown_to_version_is_validation_error() {
        let err = OrderDescriptor::new(OrderType::Btu, ProtocolVersion::H003).unwrap_err();
        assert!(matches!(err, EbicsError::Validation(_)));
        assert!(OrderDescriptor::new(OrderType::Fdl, ProtocolVersion::H005).is_err());
    }

    #[test]
    fn date_range_only_for_downloads() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();

        let sta = OrderDescriptor::new(OrderType::Sta, ProtocolVersion::H004)
            .unwrap()
            .with_date_range(range)
            .unwrap();
        assert_eq!(sta.details().date_range, Some(range));
        assert_eq!(sta.details().order_type, "STA");

        let ful = OrderDescriptor::new(OrderType::Ful, ProtocolVersion::H004).unwrap();
        assert!(ful.with_date_range(range).is_err());
    }
}
