use chrono::{NaiveDate, Utc};

use crate::datetime::{combine_date_time, parse_form_date, DateTimeError};
use crate::params::{DateValue, LineItemParams, NumberOrText};
use crate::product::{PassengerType, ProductType, RoomType, SeatType, TransportKind};

/// Knobs that vary between form variants.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationOptions {
    /// Reject hotel stays that start in the past (newer form behavior).
    pub require_future_dates: bool,
}

/// A submission rejected before any CRM call. Each variant renders exactly
/// one user-facing message.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required common parameters ({0})")]
    MissingCommon(String),

    #[error("Missing required flight parameters ({0})")]
    MissingFlight(String),

    #[error("Missing required hotel parameters ({0})")]
    MissingHotel(String),

    #[error("Missing required transport parameters ({0})")]
    MissingTransport(String),

    #[error("Invalid product type provided.")]
    UnknownProductType,

    #[error("Invalid seat type provided.")]
    UnknownSeatType,

    #[error("Invalid room type provided.")]
    UnknownRoomType,

    #[error("Invalid transport type provided.")]
    UnknownTransportKind,

    #[error("Invalid passenger type provided.")]
    UnknownPassengerType,

    #[error("At least one passenger (Adult, Children, or Infant) is required.")]
    NoPassengers,

    #[error("For flights on the same day, departure time must be earlier than arrival time.")]
    SameDayOrdering,

    #[error("Check-out date must be after check-in date.")]
    CheckOutBeforeCheckIn,

    #[error("Check-in and check-out dates must not be in the past.")]
    PastStayDates,

    #[error("Invalid check-in or check-out date.")]
    InvalidStayDates,

    #[error("Invalid pickup date and time.")]
    InvalidPickup,

    #[error("{0} must be a non-negative number.")]
    NonNegativeNumber(&'static str),

    #[error("{0}")]
    InvalidDateTime(#[from] DateTimeError),
}

/// One passenger tier of a flight booking; only tiers with a non-zero
/// count survive validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PassengerTier {
    pub passenger_type: PassengerType,
    pub count: u32,
    pub unit_price: f64,
}

#[derive(Debug, Clone)]
pub struct FlightDraft {
    pub deal_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub flight_number: String,
    pub airline_name: String,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub departure_date_time: String,
    pub arrival_date_time: String,
    pub additional_notes: String,
    pub seat_type: SeatType,
    pub tiers: Vec<PassengerTier>,
}

#[derive(Debug, Clone)]
pub struct HotelDraft {
    pub deal_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub hotel_name: String,
    pub hotel_address: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub room_type: RoomType,
    pub amenities: Vec<String>,
    pub room_count: u32,
    pub unit_price: f64,
}

#[derive(Debug, Clone)]
pub struct TransportDraft {
    pub deal_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub kind: TransportKind,
    pub pickup_location: String,
    pub drop_off: String,
    pub vehicle_details: String,
    pub duration_minutes: f64,
    pub pickup_date_time: String,
    pub vehicle_count: u32,
    pub unit_price: f64,
}

/// A validated submission. Constructing one is only possible through
/// [`LineItemDraft::validate`], so payload builders can assume every field
/// is well-formed.
#[derive(Debug, Clone)]
pub enum LineItemDraft {
    Flight(FlightDraft),
    Hotel(HotelDraft),
    Transport(TransportDraft),
}

impl LineItemDraft {
    pub fn deal_id(&self) -> &str {
        match self {
            Self::Flight(f) => &f.deal_id,
            Self::Hotel(h) => &h.deal_id,
            Self::Transport(t) => &t.deal_id,
        }
    }

    pub fn product_type(&self) -> ProductType {
        match self {
            Self::Flight(_) => ProductType::Flight,
            Self::Hotel(_) => ProductType::Hotel,
            Self::Transport(_) => ProductType::Transport,
        }
    }

    pub fn validate(
        params: &LineItemParams,
        opts: &ValidationOptions,
    ) -> Result<Self, ValidationError> {
        let mut missing = Vec::new();
        let deal_id = require(&params.deal_id, "dealId", &mut missing);
        let name = require(&params.name, "name", &mut missing);
        let product_type = require(&params.product_type, "productType", &mut missing);
        if !missing.is_empty() {
            return Err(ValidationError::MissingCommon(missing.join(", ")));
        }

        let product_type =
            ProductType::parse(product_type.trim()).ok_or(ValidationError::UnknownProductType)?;

        let common = Common {
            deal_id: deal_id.to_string(),
            name: name.to_string(),
            sku: trimmed(&params.sku).map(str::to_string),
        };

        match product_type {
            ProductType::Flight => validate_flight(params, common),
            ProductType::Hotel => validate_hotel(params, common, opts),
            ProductType::Transport => validate_transport(params, common),
        }
    }
}

struct Common {
    deal_id: String,
    name: String,
    sku: Option<String>,
}

fn trimmed(opt: &Option<String>) -> Option<&str> {
    opt.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Track a required text field, recording its name when absent.
fn require<'a>(opt: &'a Option<String>, field: &'static str, missing: &mut Vec<&'static str>) -> &'a str {
    match trimmed(opt) {
        Some(s) => s,
        None => {
            missing.push(field);
            ""
        }
    }
}

fn require_date<'a>(
    opt: &'a Option<DateValue>,
    field: &'static str,
    missing: &mut Vec<&'static str>,
) -> Option<&'a DateValue> {
    match opt {
        Some(v) if !v.formatted().trim().is_empty() => Some(v),
        _ => {
            missing.push(field);
            None
        }
    }
}

fn parse_money(
    value: &NumberOrText,
    field: &'static str,
) -> Result<f64, ValidationError> {
    value
        .as_f64()
        .filter(|n| *n >= 0.0)
        .ok_or(ValidationError::NonNegativeNumber(field))
}

fn parse_count(
    value: &NumberOrText,
    field: &'static str,
) -> Result<u32, ValidationError> {
    value.as_count().ok_or(ValidationError::NonNegativeNumber(field))
}

// ============================================================================
// Flight
// ============================================================================

fn validate_flight(params: &LineItemParams, common: Common) -> Result<LineItemDraft, ValidationError> {
    let mut missing = Vec::new();
    let flight_number = require(&params.flight_number, "flightNumber", &mut missing);
    let airline_name = require(&params.airline_name, "airlineName", &mut missing);
    let departure_airport = require(&params.departure_airport, "departureAirport", &mut missing);
    let arrival_airport = require(&params.arrival_airport, "arrivalAirport", &mut missing);
    let seat_type = require(&params.seat_type, "seatType", &mut missing);

    // The schedule arrives either as separate date + time fields or as
    // frontend-combined date-time strings.
    let has_combined =
        trimmed(&params.departure_date_time).is_some() && trimmed(&params.arrival_date_time).is_some();
    let mut separate = Vec::new();
    let departure_date = require_date(&params.departure_date, "departureDate", &mut separate);
    let arrival_date = require_date(&params.arrival_date, "arrivalDate", &mut separate);
    let departure_time = trimmed(&params.departure_time);
    let arrival_time = trimmed(&params.arrival_time);
    if departure_time.is_none() {
        separate.push("departureTime");
    }
    if arrival_time.is_none() {
        separate.push("arrivalTime");
    }
    if !has_combined {
        missing.extend(separate.iter().copied());
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingFlight(missing.join(", ")));
    }

    let seat_type = SeatType::parse(seat_type).ok_or(ValidationError::UnknownSeatType)?;

    let (departure_date_time, arrival_date_time) = if separate.is_empty() {
        // Both endpoints fully specified as date + time: normalize, then
        // enforce same-day ordering.
        let dep_date = parse_form_date(departure_date.map(DateValue::formatted).unwrap_or(""))?;
        let arr_date = parse_form_date(arrival_date.map(DateValue::formatted).unwrap_or(""))?;
        let dep = combine_date_time(
            departure_date.map(DateValue::formatted).unwrap_or(""),
            departure_time.unwrap_or(""),
        )?;
        let arr = combine_date_time(
            arrival_date.map(DateValue::formatted).unwrap_or(""),
            arrival_time.unwrap_or(""),
        )?;
        if dep_date == arr_date && dep >= arr {
            return Err(ValidationError::SameDayOrdering);
        }
        match (trimmed(&params.departure_date_time), trimmed(&params.arrival_date_time)) {
            (Some(d), Some(a)) => (d.to_string(), a.to_string()),
            _ => (
                dep.format("%Y-%m-%dT%H:%M").to_string(),
                arr.format("%Y-%m-%dT%H:%M").to_string(),
            ),
        }
    } else {
        (
            trimmed(&params.departure_date_time).unwrap_or("").to_string(),
            trimmed(&params.arrival_date_time).unwrap_or("").to_string(),
        )
    };

    let tiers = if params.has_passenger_tiers() {
        validate_passenger_tiers(params)?
    } else {
        validate_legacy_passenger(params)?
    };

    Ok(LineItemDraft::Flight(FlightDraft {
        deal_id: common.deal_id,
        name: common.name,
        sku: common.sku,
        flight_number: flight_number.to_string(),
        airline_name: airline_name.to_string(),
        departure_airport: departure_airport.to_string(),
        arrival_airport: arrival_airport.to_string(),
        departure_date_time,
        arrival_date_time,
        additional_notes: trimmed(&params.flight_additional_notes).unwrap_or("").to_string(),
        seat_type,
        tiers,
    }))
}

/// Multi-passenger path: per-tier counts with per-tier unit prices.
fn validate_passenger_tiers(params: &LineItemParams) -> Result<Vec<PassengerTier>, ValidationError> {
    let specs: [(PassengerType, &Option<NumberOrText>, &'static str, &Option<NumberOrText>, &'static str); 3] = [
        (PassengerType::Adult, &params.adult_count, "adultCount", &params.adult_unit_price, "adultUnitPrice"),
        (PassengerType::Children, &params.child_count, "childCount", &params.child_unit_price, "childUnitPrice"),
        (PassengerType::Infant, &params.infant_count, "infantCount", &params.infant_unit_price, "infantUnitPrice"),
    ];

    let mut tiers = Vec::new();
    for (passenger_type, count, count_field, unit_price, price_field) in specs {
        let count = match count {
            Some(v) => parse_count(v, count_field)?,
            None => 0,
        };
        if count == 0 {
            continue;
        }
        let price = match (unit_price, &params.price) {
            (Some(v), _) => parse_money(v, price_field)?,
            (None, Some(v)) => parse_money(v, "price")?,
            (None, None) => return Err(ValidationError::MissingFlight(price_field.to_string())),
        };
        tiers.push(PassengerTier {
            passenger_type,
            count,
            unit_price: price,
        });
    }

    if tiers.is_empty() {
        return Err(ValidationError::NoPassengers);
    }
    Ok(tiers)
}

/// Legacy single-passenger path: passengerType + quantity + price.
fn validate_legacy_passenger(params: &LineItemParams) -> Result<Vec<PassengerTier>, ValidationError> {
    let mut missing = Vec::new();
    let passenger_type = require(&params.passenger_type, "passengerType", &mut missing);
    if params.quantity.is_none() {
        missing.push("quantity");
    }
    if params.price.is_none() {
        missing.push("price");
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingFlight(missing.join(", ")));
    }

    let passenger_type =
        PassengerType::parse(passenger_type).ok_or(ValidationError::UnknownPassengerType)?;
    let count = match &params.quantity {
        Some(v) => parse_count(v, "quantity")?,
        None => 0,
    };
    let unit_price = match &params.price {
        Some(v) => parse_money(v, "price")?,
        None => 0.0,
    };

    Ok(vec![PassengerTier {
        passenger_type,
        count,
        unit_price,
    }])
}

// ============================================================================
// Hotel
// ============================================================================

fn validate_hotel(
    params: &LineItemParams,
    common: Common,
    opts: &ValidationOptions,
) -> Result<LineItemDraft, ValidationError> {
    let mut missing = Vec::new();
    let hotel_name = require(&params.hotel_name, "hotelName", &mut missing);
    let hotel_address = require(&params.hotel_address, "hotelAddress", &mut missing);
    let check_in = require_date(&params.check_in_date, "checkInDate", &mut missing);
    let check_out = require_date(&params.check_out_date, "checkOutDate", &mut missing);
    let room_type = require(&params.room_type, "roomType", &mut missing);
    if params.room_count.is_none() && params.quantity.is_none() {
        missing.push("roomCount");
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingHotel(missing.join(", ")));
    }

    let room_type = RoomType::parse(room_type).ok_or(ValidationError::UnknownRoomType)?;

    let check_in = check_in
        .map(DateValue::formatted)
        .and_then(|s| parse_form_date(s).ok())
        .ok_or(ValidationError::InvalidStayDates)?;
    let check_out = check_out
        .map(DateValue::formatted)
        .and_then(|s| parse_form_date(s).ok())
        .ok_or(ValidationError::InvalidStayDates)?;

    if check_out < check_in {
        return Err(ValidationError::CheckOutBeforeCheckIn);
    }
    if opts.require_future_dates && check_in < Utc::now().date_naive() {
        return Err(ValidationError::PastStayDates);
    }

    let room_count = match (&params.room_count, &params.quantity) {
        (Some(v), _) => parse_count(v, "roomCount")?,
        (None, Some(v)) => parse_count(v, "quantity")?,
        (None, None) => 0,
    };
    let unit_price = match (&params.room_unit_price, &params.price) {
        (Some(v), _) => parse_money(v, "roomUnitPrice")?,
        (None, Some(v)) => parse_money(v, "price")?,
        (None, None) if room_count > 0 => {
            return Err(ValidationError::MissingHotel("roomUnitPrice".to_string()))
        }
        (None, None) => 0.0,
    };

    let amenities = params
        .amenities
        .as_ref()
        .map(|a| a.values().iter().map(|s| s.to_string()).collect())
        .unwrap_or_default();

    Ok(LineItemDraft::Hotel(HotelDraft {
        deal_id: common.deal_id,
        name: common.name,
        sku: common.sku,
        hotel_name: hotel_name.to_string(),
        hotel_address: hotel_address.to_string(),
        check_in,
        check_out,
        room_type,
        amenities,
        room_count,
        unit_price,
    }))
}

// ============================================================================
// Transport
// ============================================================================

const PICKUP_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

fn pickup_parseable(s: &str) -> bool {
    PICKUP_FORMATS
        .iter()
        .any(|f| chrono::NaiveDateTime::parse_from_str(s, f).is_ok())
        || chrono::DateTime::parse_from_rfc3339(s).is_ok()
}

fn validate_transport(params: &LineItemParams, common: Common) -> Result<LineItemDraft, ValidationError> {
    let mut missing = Vec::new();
    let transport_type = require(&params.transport_type, "transportType", &mut missing);
    let pickup_location = require(&params.pickup_location, "pickupLocation", &mut missing);
    let drop_off = require(&params.transport_drop_off, "transportDropOff", &mut missing);
    let vehicle_details = require(&params.vehicle_details, "vehicleDetails", &mut missing);
    if params.estimated_travel_duration.is_none() {
        missing.push("estimatedTravelDuration");
    }

    let combined = trimmed(&params.pickup_date_time);
    if combined.is_none() {
        let mut separate = Vec::new();
        require_date(&params.pickup_date, "pickupDate", &mut separate);
        if trimmed(&params.pickup_time).is_none() {
            separate.push("pickupTime");
        }
        missing.extend(separate.iter().copied());
    }
    if !missing.is_empty() {
        return Err(ValidationError::MissingTransport(missing.join(", ")));
    }

    let kind = TransportKind::parse(transport_type).ok_or(ValidationError::UnknownTransportKind)?;

    let duration_minutes = params
        .estimated_travel_duration
        .as_ref()
        .and_then(NumberOrText::as_f64)
        .filter(|n| *n >= 0.0)
        .ok_or(ValidationError::NonNegativeNumber("estimatedTravelDuration"))?;

    let pickup_date_time = match combined {
        Some(s) => {
            if !pickup_parseable(s) {
                return Err(ValidationError::InvalidPickup);
            }
            s.to_string()
        }
        None => {
            let date = params.pickup_date.as_ref().map(DateValue::formatted).unwrap_or("");
            let time = trimmed(&params.pickup_time).unwrap_or("");
            combine_date_time(date, time)
                .map_err(|_| ValidationError::InvalidPickup)?
                .format("%Y-%m-%dT%H:%M")
                .to_string()
        }
    };

    let vehicle_count = match (&params.vehicle_count, &params.quantity) {
        (Some(v), _) => parse_count(v, "vehicleCount")?,
        (None, Some(v)) => parse_count(v, "quantity")?,
        (None, None) => 1,
    };
    let unit_price = match (&params.vehicle_unit_price, &params.price) {
        (Some(v), _) => parse_money(v, "vehicleUnitPrice")?,
        (None, Some(v)) => parse_money(v, "price")?,
        (None, None) if vehicle_count > 0 => {
            return Err(ValidationError::MissingTransport("vehicleUnitPrice".to_string()))
        }
        (None, None) => 0.0,
    };

    Ok(LineItemDraft::Transport(TransportDraft {
        deal_id: common.deal_id,
        name: common.name,
        sku: common.sku,
        kind,
        pickup_location: pickup_location.to_string(),
        drop_off: drop_off.to_string(),
        vehicle_details: vehicle_details.to_string(),
        duration_minutes,
        pickup_date_time,
        vehicle_count,
        unit_price,
    }))
}
