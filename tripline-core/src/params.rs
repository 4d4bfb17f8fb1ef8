use serde::Deserialize;

/// A numeric form field, tolerated either as a JSON number or as the
/// string a text input produced.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Whole non-negative number, for counts and quantities.
    pub fn as_count(&self) -> Option<u32> {
        let n = self.as_f64()?;
        if n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
            return None;
        }
        Some(n as u32)
    }
}

/// A date field: either a plain string or the date-picker object
/// `{ "formattedDate": "MM/DD/YYYY" }`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum DateValue {
    Picker {
        #[serde(rename = "formattedDate")]
        formatted_date: String,
    },
    Text(String),
}

impl DateValue {
    pub fn formatted(&self) -> &str {
        match self {
            Self::Picker { formatted_date } => formatted_date,
            Self::Text(s) => s,
        }
    }
}

/// Amenities arrive as a multi-select array or, from older forms, a scalar.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AmenityInput {
    Many(Vec<String>),
    One(String),
}

impl AmenityInput {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Many(v) => v.iter().map(String::as_str).collect(),
            Self::One(s) => vec![s.as_str()],
        }
    }
}

/// The raw line-item submission: every field optional, exactly as the form
/// sends it. Validation turns this into a typed draft.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItemParams {
    pub deal_id: Option<String>,
    pub name: Option<String>,
    pub sku: Option<String>,
    pub product_type: Option<String>,
    pub price: Option<NumberOrText>,
    pub quantity: Option<NumberOrText>,

    // Flight
    pub flight_number: Option<String>,
    pub airline_name: Option<String>,
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub departure_date: Option<DateValue>,
    pub arrival_date: Option<DateValue>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    pub departure_date_time: Option<String>,
    pub arrival_date_time: Option<String>,
    pub flight_additional_notes: Option<String>,
    pub seat_type: Option<String>,
    pub passenger_type: Option<String>,
    pub adult_count: Option<NumberOrText>,
    pub adult_unit_price: Option<NumberOrText>,
    pub child_count: Option<NumberOrText>,
    pub child_unit_price: Option<NumberOrText>,
    pub infant_count: Option<NumberOrText>,
    pub infant_unit_price: Option<NumberOrText>,

    // Hotel
    pub hotel_name: Option<String>,
    pub hotel_address: Option<String>,
    pub check_in_date: Option<DateValue>,
    pub check_out_date: Option<DateValue>,
    pub room_type: Option<String>,
    pub amenities: Option<AmenityInput>,
    pub room_count: Option<NumberOrText>,
    pub room_unit_price: Option<NumberOrText>,

    // Transport
    pub transport_type: Option<String>,
    pub pickup_location: Option<String>,
    pub transport_drop_off: Option<String>,
    pub vehicle_details: Option<String>,
    pub estimated_travel_duration: Option<NumberOrText>,
    pub pickup_date: Option<DateValue>,
    pub pickup_time: Option<String>,
    pub pickup_date_time: Option<String>,
    pub vehicle_count: Option<NumberOrText>,
    pub vehicle_unit_price: Option<NumberOrText>,
}

impl LineItemParams {
    /// True when the submission uses the multi-passenger flight form.
    pub fn has_passenger_tiers(&self) -> bool {
        self.adult_count.is_some() || self.child_count.is_some() || self.infant_count.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_or_text_parses_both_shapes() {
        let n: NumberOrText = serde_json::from_str("42").unwrap();
        assert_eq!(n.as_f64(), Some(42.0));
        assert_eq!(n.as_count(), Some(42));

        let s: NumberOrText = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(s.as_f64(), Some(19.99));
        assert_eq!(s.as_count(), None);

        let bad: NumberOrText = serde_json::from_str("\"two\"").unwrap();
        assert_eq!(bad.as_f64(), None);
    }

    #[test]
    fn test_count_rejects_negative_and_fractional() {
        assert_eq!(NumberOrText::Number(-1.0).as_count(), None);
        assert_eq!(NumberOrText::Number(2.5).as_count(), None);
        assert_eq!(NumberOrText::Number(0.0).as_count(), Some(0));
    }

    #[test]
    fn test_date_value_picker_and_text() {
        let picker: DateValue =
            serde_json::from_str(r#"{"formattedDate":"05/01/2025"}"#).unwrap();
        assert_eq!(picker.formatted(), "05/01/2025");

        let text: DateValue = serde_json::from_str("\"2025-05-01\"").unwrap();
        assert_eq!(text.formatted(), "2025-05-01");
    }

    #[test]
    fn test_params_deserialize_from_camel_case() {
        let raw = r#"{
            "dealId": "901",
            "name": "NYC trip",
            "productType": "Hotel",
            "checkInDate": {"formattedDate": "05/01/2025"},
            "amenities": ["breakfast", "parking"],
            "roomCount": "2",
            "roomUnitPrice": 120.5
        }"#;
        let params: LineItemParams = serde_json::from_str(raw).unwrap();
        assert_eq!(params.deal_id.as_deref(), Some("901"));
        assert_eq!(params.room_count.unwrap().as_count(), Some(2));
        assert_eq!(params.room_unit_price.unwrap().as_f64(), Some(120.5));
        assert_eq!(
            params.amenities.unwrap().values(),
            vec!["breakfast", "parking"]
        );
    }

    #[test]
    fn test_amenities_scalar_form() {
        let one: AmenityInput = serde_json::from_str("\"breakfast\"").unwrap();
        assert_eq!(one.values(), vec!["breakfast"]);
    }
}
