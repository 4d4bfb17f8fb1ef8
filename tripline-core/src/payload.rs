use chrono::NaiveTime;
use rand::Rng;
use serde::Serialize;

use crate::draft::{FlightDraft, HotelDraft, LineItemDraft, TransportDraft};
use crate::product::{filter_amenities, PassengerType, ProductType, RoomType, SeatType, TransportKind};

/// CRM properties for one flight passenger tier.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FlightProperties {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub hs_product_type: ProductType,
    pub flight_number: String,
    pub airline_name: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    #[serde(rename = "departure_date___time")]
    pub departure_date_time: String,
    #[serde(rename = "arrival_date___time")]
    pub arrival_date_time: String,
    pub additional_notes_flight: String,
    pub seat_type: SeatType,
    pub passenger_type: PassengerType,
    pub quantity: u32,
    pub price: f64,
    pub flight_group_id: String,
}

/// CRM properties for one hotel room block.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HotelProperties {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub hs_product_type: ProductType,
    pub hotel_name: String,
    pub hotel_address: String,
    /// Epoch millis at UTC midnight
    pub check_in_date: i64,
    /// Epoch millis at UTC midnight
    pub check_out_date: i64,
    pub room_type: RoomType,
    pub additional_amenities: String,
    pub quantity: u32,
    pub price: f64,
}

/// CRM properties for one transport booking.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransportProperties {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub hs_product_type: ProductType,
    pub transport_type: TransportKind,
    pub pickup_location: String,
    pub drop_off_location: String,
    pub vehicle_type_details: String,
    pub estimated_travel_duration_minutes: f64,
    #[serde(rename = "pickup_date___time")]
    pub pickup_date_time: String,
    pub quantity: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum LineItemProperties {
    Flight(FlightProperties),
    Hotel(HotelProperties),
    Transport(TransportProperties),
}

impl LineItemProperties {
    pub fn name(&self) -> &str {
        match self {
            Self::Flight(p) => &p.name,
            Self::Hotel(p) => &p.name,
            Self::Transport(p) => &p.name,
        }
    }
}

/// Group id shared by all line items of one flight booking. Keeps the
/// `<epoch-millis>-<suffix>` shape existing CRM records already carry.
pub fn generate_flight_group_id() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::rng().random_range(0..100_000);
    format!("{millis}-{suffix}")
}

/// Expand a validated draft into the CRM payloads to create. Flights emit
/// one payload per passenger tier; hotel and transport emit one payload
/// when their count is non-zero.
pub fn build_payloads(draft: &LineItemDraft) -> Vec<LineItemProperties> {
    let payloads = match draft {
        LineItemDraft::Flight(f) => build_flight(f, generate_flight_group_id()),
        LineItemDraft::Hotel(h) => build_hotel(h).into_iter().collect(),
        LineItemDraft::Transport(t) => build_transport(t).into_iter().collect(),
    };
    tracing::debug!(
        product_type = draft.product_type().as_str(),
        count = payloads.len(),
        "line item payloads built"
    );
    payloads
}

fn build_flight(draft: &FlightDraft, group_id: String) -> Vec<LineItemProperties> {
    draft
        .tiers
        .iter()
        .filter(|tier| tier.count > 0)
        .map(|tier| {
            LineItemProperties::Flight(FlightProperties {
                name: draft.name.clone(),
                sku: draft.sku.clone(),
                hs_product_type: ProductType::Flight,
                flight_number: draft.flight_number.clone(),
                airline_name: draft.airline_name.clone(),
                departure_airport: draft.departure_airport.clone(),
                arrival_airport: draft.arrival_airport.clone(),
                departure_date_time: draft.departure_date_time.clone(),
                arrival_date_time: draft.arrival_date_time.clone(),
                additional_notes_flight: draft.additional_notes.clone(),
                seat_type: draft.seat_type,
                passenger_type: tier.passenger_type,
                quantity: tier.count,
                price: tier.unit_price,
                flight_group_id: group_id.clone(),
            })
        })
        .collect()
}

fn build_hotel(draft: &HotelDraft) -> Option<LineItemProperties> {
    if draft.room_count == 0 {
        return None;
    }

    let amenities =
        filter_amenities(draft.amenities.iter().map(String::as_str)).join(";");

    let check_in = draft.check_in.and_time(NaiveTime::MIN).and_utc().timestamp_millis();
    let check_out = draft.check_out.and_time(NaiveTime::MIN).and_utc().timestamp_millis();

    Some(LineItemProperties::Hotel(HotelProperties {
        name: format!("{} - {}", draft.name, draft.room_type.as_str()),
        sku: draft.sku.clone(),
        hs_product_type: ProductType::Hotel,
        hotel_name: draft.hotel_name.clone(),
        hotel_address: draft.hotel_address.clone(),
        check_in_date: check_in,
        check_out_date: check_out,
        room_type: draft.room_type,
        additional_amenities: amenities,
        quantity: draft.room_count,
        price: draft.unit_price,
    }))
}

fn build_transport(draft: &TransportDraft) -> Option<LineItemProperties> {
    if draft.vehicle_count == 0 {
        return None;
    }

    Some(LineItemProperties::Transport(TransportProperties {
        name: draft.name.clone(),
        sku: draft.sku.clone(),
        hs_product_type: ProductType::Transport,
        transport_type: draft.kind,
        pickup_location: draft.pickup_location.clone(),
        drop_off_location: draft.drop_off.clone(),
        vehicle_type_details: draft.vehicle_details.clone(),
        estimated_travel_duration_minutes: draft.duration_minutes,
        pickup_date_time: draft.pickup_date_time.clone(),
        quantity: draft.vehicle_count,
        price: draft.unit_price,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{LineItemDraft, ValidationOptions};
    use crate::params::LineItemParams;
    use serde_json::json;

    fn validated(value: serde_json::Value) -> LineItemDraft {
        let params: LineItemParams = serde_json::from_value(value).unwrap();
        LineItemDraft::validate(&params, &ValidationOptions::default()).unwrap()
    }

    #[test]
    fn test_flight_expansion_one_payload_per_nonzero_tier() {
        let draft = validated(json!({
            "dealId": "901",
            "name": "LHR-JFK",
            "productType": "Flight",
            "flightNumber": "BA117",
            "airlineName": "British Airways",
            "departureAirport": "LHR",
            "arrivalAirport": "JFK",
            "departureDateTime": "2025-06-10T09:00",
            "arrivalDateTime": "2025-06-10T17:00",
            "seatType": "Business",
            "adultCount": 2,
            "adultUnitPrice": 450,
            "childCount": 1,
            "childUnitPrice": 300,
            "infantCount": 0
        }));

        let payloads = build_payloads(&draft);
        assert_eq!(payloads.len(), 2);

        let group_ids: Vec<&str> = payloads
            .iter()
            .map(|p| match p {
                LineItemProperties::Flight(f) => f.flight_group_id.as_str(),
                _ => panic!("expected flight payloads"),
            })
            .collect();
        assert_eq!(group_ids[0], group_ids[1]);

        let LineItemProperties::Flight(adult) = &payloads[0] else { unreachable!() };
        assert_eq!(adult.passenger_type, PassengerType::Adult);
        assert_eq!(adult.quantity, 2);
        assert_eq!(adult.price, 450.0);
        let LineItemProperties::Flight(child) = &payloads[1] else { unreachable!() };
        assert_eq!(child.passenger_type, PassengerType::Children);
        assert_eq!(child.quantity, 1);
    }

    #[test]
    fn test_flight_group_id_shape() {
        let id = generate_flight_group_id();
        let (millis, suffix) = id.split_once('-').unwrap();
        assert!(millis.parse::<i64>().unwrap() > 0);
        assert!(suffix.parse::<u32>().unwrap() < 100_000);
    }

    #[test]
    fn test_flight_payload_serializes_crm_property_names() {
        let draft = validated(json!({
            "dealId": "901",
            "name": "LHR-JFK",
            "productType": "Flight",
            "flightNumber": "BA117",
            "airlineName": "British Airways",
            "departureAirport": "LHR",
            "arrivalAirport": "JFK",
            "departureDateTime": "2025-06-10T09:00",
            "arrivalDateTime": "2025-06-10T17:00",
            "seatType": "First Class",
            "adultCount": 1,
            "adultUnitPrice": 900
        }));
        let payloads = build_payloads(&draft);
        let value = serde_json::to_value(&payloads[0]).unwrap();
        assert_eq!(value["hs_product_type"], "Flight");
        assert_eq!(value["departure_date___time"], "2025-06-10T09:00");
        assert_eq!(value["arrival_date___time"], "2025-06-10T17:00");
        assert_eq!(value["seat_type"], "First Class");
        assert_eq!(value["passenger_type"], "Adult");
        assert!(value.get("sku").is_none());
    }

    #[test]
    fn test_hotel_round_trip_dates_are_utc_midnights() {
        let draft = validated(json!({
            "dealId": "901",
            "name": "NYC stay",
            "productType": "Hotel",
            "hotelName": "The Grand",
            "hotelAddress": "1 Main St",
            "checkInDate": {"formattedDate": "05/01/2025"},
            "checkOutDate": {"formattedDate": "05/03/2025"},
            "roomType": "Suite",
            "roomCount": 2,
            "roomUnitPrice": 250
        }));
        let payloads = build_payloads(&draft);
        assert_eq!(payloads.len(), 1);
        let LineItemProperties::Hotel(h) = &payloads[0] else { panic!("expected hotel") };
        assert!(h.check_in_date < h.check_out_date);
        assert_eq!(h.check_in_date % 86_400_000, 0);
        assert_eq!(h.check_out_date % 86_400_000, 0);
        assert_eq!(h.name, "NYC stay - Suite");
    }

    #[test]
    fn test_hotel_amenities_filtered_and_joined() {
        let draft = validated(json!({
            "dealId": "901",
            "name": "NYC stay",
            "productType": "Hotel",
            "hotelName": "The Grand",
            "hotelAddress": "1 Main St",
            "checkInDate": {"formattedDate": "05/01/2025"},
            "checkOutDate": {"formattedDate": "05/03/2025"},
            "roomType": "Standard",
            "amenities": ["breakfast", "pool", "Wi-Fi", "WiFi"],
            "roomCount": 1,
            "roomUnitPrice": 99
        }));
        let LineItemProperties::Hotel(h) = &build_payloads(&draft)[0] else { panic!() };
        assert_eq!(h.additional_amenities, "breakfast;Wi-Fi");
    }

    #[test]
    fn test_hotel_zero_rooms_builds_nothing() {
        let draft = validated(json!({
            "dealId": "901",
            "name": "NYC stay",
            "productType": "Hotel",
            "hotelName": "The Grand",
            "hotelAddress": "1 Main St",
            "checkInDate": {"formattedDate": "05/01/2025"},
            "checkOutDate": {"formattedDate": "05/03/2025"},
            "roomType": "Standard",
            "roomCount": 0
        }));
        assert!(build_payloads(&draft).is_empty());
    }

    #[test]
    fn test_transport_payload_passes_combined_pickup_through() {
        let draft = validated(json!({
            "dealId": "901",
            "name": "Airport pickup",
            "productType": "Transport",
            "transportType": "Private Car",
            "pickupLocation": "JFK Terminal 4",
            "transportDropOff": "The Grand",
            "vehicleDetails": "SUV, 6 seats",
            "estimatedTravelDuration": 45,
            "pickupDateTime": "2025-05-01T14:30",
            "vehicleCount": 1,
            "vehicleUnitPrice": 85
        }));
        let payloads = build_payloads(&draft);
        let value = serde_json::to_value(&payloads[0]).unwrap();
        assert_eq!(value["pickup_date___time"], "2025-05-01T14:30");
        assert_eq!(value["transport_type"], "Private Car");
        assert_eq!(value["estimated_travel_duration_minutes"], 45.0);
    }
}
