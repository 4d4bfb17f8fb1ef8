use std::collections::BTreeMap;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};

use crate::client::HubSpotClient;
use crate::error::CrmError;

/// Bucket key for line items whose product type or flight group is absent.
const UNKNOWN: &str = "Unknown";

/// One line item as read back from the CRM: the requested property bag,
/// values as HubSpot returns them (strings or null).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LineItemRecord {
    properties: BTreeMap<String, Option<String>>,
}

impl LineItemRecord {
    pub fn new(properties: BTreeMap<String, Option<String>>) -> Self {
        Self { properties }
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(|v| v.as_deref())
    }

    pub fn product_type(&self) -> &str {
        self.property("hs_product_type").unwrap_or(UNKNOWN)
    }

    pub fn flight_group_id(&self) -> &str {
        self.property("flight_group_id").unwrap_or(UNKNOWN)
    }

    pub fn object_id(&self) -> Option<&str> {
        self.property("hs_object_id")
    }
}

/// Line items of one deal, grouped the way the UI renders them: flights by
/// flight group, everything else as a flat list per product type.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct GroupedLineItems {
    #[serde(rename = "Flight", skip_serializing_if = "BTreeMap::is_empty")]
    pub flights: BTreeMap<String, Vec<LineItemRecord>>,
    #[serde(rename = "Hotel", skip_serializing_if = "Vec::is_empty")]
    pub hotels: Vec<LineItemRecord>,
    #[serde(rename = "Transport", skip_serializing_if = "Vec::is_empty")]
    pub transports: Vec<LineItemRecord>,
    #[serde(rename = "Unknown", skip_serializing_if = "Vec::is_empty")]
    pub unknown: Vec<LineItemRecord>,
}

impl GroupedLineItems {
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
            && self.hotels.is_empty()
            && self.transports.is_empty()
            && self.unknown.is_empty()
    }
}

/// Group fetched records by product type; flights sub-grouped by flight
/// group id. Pure so it can be exercised without a live CRM.
pub fn group_line_items(records: Vec<LineItemRecord>) -> GroupedLineItems {
    let mut grouped = GroupedLineItems::default();
    for record in records {
        match record.product_type() {
            "Flight" => {
                let group_id = record.flight_group_id().to_string();
                grouped.flights.entry(group_id).or_default().push(record);
            }
            "Hotel" => grouped.hotels.push(record),
            "Transport" => grouped.transports.push(record),
            _ => grouped.unknown.push(record),
        }
    }
    grouped
}

/// Resolve a deal's line-item ids, fan out the detail fetches, drop the
/// failures, and group what remains.
pub async fn get_deal_line_items(
    client: &HubSpotClient,
    deal_id: &str,
) -> Result<GroupedLineItems, CrmError> {
    let ids = client.list_deal_line_item_ids(deal_id).await?;

    let fetched = join_all(ids.iter().map(|id| client.get_line_item(id))).await;
    let records: Vec<LineItemRecord> = fetched.into_iter().flatten().collect();

    tracing::debug!(
        deal_id,
        resolved = ids.len(),
        fetched = records.len(),
        "deal line items aggregated"
    );
    Ok(group_line_items(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> LineItemRecord {
        LineItemRecord::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect(),
        )
    }

    #[test]
    fn test_flights_sub_grouped_by_group_id() {
        let grouped = group_line_items(vec![
            record(&[("hs_product_type", "Flight"), ("flight_group_id", "g1"), ("passenger_type", "Adult")]),
            record(&[("hs_product_type", "Flight"), ("flight_group_id", "g1"), ("passenger_type", "Children")]),
            record(&[("hs_product_type", "Hotel"), ("hotel_name", "The Grand")]),
        ]);

        assert_eq!(grouped.flights.len(), 1);
        assert_eq!(grouped.flights["g1"].len(), 2);
        assert_eq!(grouped.hotels.len(), 1);
        assert!(grouped.transports.is_empty());
    }

    #[test]
    fn test_missing_keys_fall_back_to_unknown() {
        let grouped = group_line_items(vec![
            record(&[("hs_product_type", "Flight")]),
            record(&[("name", "untyped item")]),
            record(&[("hs_product_type", "Insurance")]),
        ]);

        assert_eq!(grouped.flights["Unknown"].len(), 1);
        assert_eq!(grouped.unknown.len(), 2);
    }

    #[test]
    fn test_serialized_shape_matches_ui_contract() {
        let grouped = group_line_items(vec![
            record(&[("hs_product_type", "Flight"), ("flight_group_id", "g1")]),
            record(&[("hs_product_type", "Flight"), ("flight_group_id", "g1")]),
            record(&[("hs_product_type", "Hotel")]),
        ]);

        let value = serde_json::to_value(&grouped).unwrap();
        assert_eq!(value["Flight"]["g1"].as_array().unwrap().len(), 2);
        assert_eq!(value["Hotel"].as_array().unwrap().len(), 1);
        // Empty buckets stay out of the payload entirely.
        assert!(value.get("Transport").is_none());
        assert!(value.get("Unknown").is_none());
    }

    #[test]
    fn test_empty_input_serializes_to_empty_object() {
        let grouped = group_line_items(vec![]);
        assert!(grouped.is_empty());
        let value = serde_json::to_value(&grouped).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn test_record_accessors() {
        let r = record(&[("hs_object_id", "42"), ("hs_product_type", "Transport")]);
        assert_eq!(r.object_id(), Some("42"));
        assert_eq!(r.product_type(), "Transport");
        assert_eq!(r.flight_group_id(), "Unknown");
        assert_eq!(r.property("missing"), None);
    }
}
