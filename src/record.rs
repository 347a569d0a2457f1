//! The record extracted from each listing row

/// Column names written as the first CSV row, in field order
pub const CSV_HEADER: [&str; 5] = ["Attacker", "Country", "Web Url", "Ip", "Date"];

/// One extracted entity
///
/// All fields are kept as text exactly as the page parser produced them.
/// No uniqueness is enforced; the same record may appear on several pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Actor (attacker) identifier
    pub actor: String,

    /// Region code, without surrounding parentheses
    pub region: String,

    /// Resource locator of the affected site
    pub locator: String,

    /// Network address of the affected site
    pub address: String,

    /// Timestamp as displayed on the page
    pub timestamp: String,
}

impl Record {
    /// Creates a record from its five column values
    pub fn new(
        actor: impl Into<String>,
        region: impl Into<String>,
        locator: impl Into<String>,
        address: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            region: region.into(),
            locator: locator.into(),
            address: address.into(),
            timestamp: timestamp.into(),
        }
    }

    /// Returns the fields in CSV column order
    pub fn as_row(&self) -> [&str; 5] {
        [
            &self.actor,
            &self.region,
            &self.locator,
            &self.address,
            &self.timestamp,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_row_matches_header_order() {
        let record = Record::new("A", "VN", "http://x", "1.2.3.4", "2024-01-01");
        assert_eq!(
            record.as_row(),
            ["A", "VN", "http://x", "1.2.3.4", "2024-01-01"]
        );
        assert_eq!(record.as_row().len(), CSV_HEADER.len());
    }
}
