//! Domain data structures for councils, address queries, and bin collections.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ports::PortError;

/// Built-in councils supported by the application.
pub enum Councils {
    /// Bolton Council, England.
    Bolton,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Identifier for a council known to binday.
pub struct CouncilId(pub String);

impl fmt::Display for Councils {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slug = match self {
            Councils::Bolton => "bolton",
        };
        write!(formatter, "{slug}")
    }
}

impl From<Councils> for CouncilId {
    fn from(council: Councils) -> Self {
        CouncilId(council.to_string())
    }
}

impl fmt::Display for CouncilId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Metadata describing a council and its human-friendly name.
pub struct CouncilMeta {
    /// Unique identifier.
    pub id: CouncilId,
    /// Display name.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Household to look up on a council's collection form.
pub struct AddressQuery {
    /// Postcode typed into the form.
    pub postcode: String,
    /// House number or name used to pick an entry from the address list.
    pub house_number: String,
}

impl AddressQuery {
    /// Build a query from raw user input, trimming both parts.
    ///
    /// # Errors
    ///
    /// Returns [`PortError::InvalidQuery`] when either part is blank.
    pub fn new<P: AsRef<str>, H: AsRef<str>>(postcode: P, house_number: H) -> Result<Self, PortError> {
        let postcode = postcode.as_ref().trim();
        let house_number = house_number.as_ref().trim();

        if postcode.is_empty() {
            return Err(PortError::InvalidQuery("postcode is empty".to_owned()));
        }
        if house_number.is_empty() {
            return Err(PortError::InvalidQuery("house number is empty".to_owned()));
        }

        Ok(Self {
            postcode: postcode.to_owned(),
            house_number: house_number.to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// A bin label paired with the day it is collected.
pub struct BinCollection {
    /// Label as scraped from the page, e.g. "Grey Bin".
    pub label: String,
    /// Collection day.
    pub date: NaiveDate,
}

impl BinCollection {
    /// Pair a label with a collection date.
    #[must_use]
    pub fn new<L: Into<String>>(label: L, date: NaiveDate) -> Self {
        Self {
            label: label.into(),
            date,
        }
    }
}

impl fmt::Display for BinCollection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} on {}", self.label, self.date.format("%A %-d %B %Y"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_query_trims_input() {
        let query = AddressQuery::new("  BL1 1AA ", " 12 ").expect("valid query");
        assert_eq!(query.postcode, "BL1 1AA", "postcode should be trimmed");
        assert_eq!(query.house_number, "12", "house number should be trimmed");
    }

    #[test]
    fn address_query_rejects_blank_parts() {
        assert!(
            matches!(AddressQuery::new(" ", "12"), Err(PortError::InvalidQuery(_))),
            "blank postcode must be rejected"
        );
        assert!(
            matches!(AddressQuery::new("BL1 1AA", ""), Err(PortError::InvalidQuery(_))),
            "blank house number must be rejected"
        );
    }

    #[test]
    fn council_slug_round_trips_into_id() {
        let id = CouncilId::from(Councils::Bolton);
        assert_eq!(id, CouncilId("bolton".to_owned()), "slug should be lowercase");
        assert_eq!(id.to_string(), "bolton", "display should print the slug");
    }

    #[test]
    fn collection_displays_long_date() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 7).expect("valid date");
        let collection = BinCollection::new("Grey Bin", date);
        assert_eq!(collection.to_string(), "Grey Bin on Tuesday 7 October 2025", "display format");
    }
}
