use serde::{Deserialize, Serialize};

/// Product types a deal line item can carry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ProductType {
    Flight,
    Hotel,
    Transport,
}

impl ProductType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Flight" => Some(Self::Flight),
            "Hotel" => Some(Self::Hotel),
            "Transport" => Some(Self::Transport),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flight => "Flight",
            Self::Hotel => "Hotel",
            Self::Transport => "Transport",
        }
    }
}

/// Passenger tiers of a flight booking, in display order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum PassengerType {
    Adult,
    Children,
    Infant,
}

impl PassengerType {
    pub const ALL: [PassengerType; 3] = [Self::Adult, Self::Children, Self::Infant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adult => "Adult",
            Self::Children => "Children",
            Self::Infant => "Infant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Adult" => Some(Self::Adult),
            "Children" => Some(Self::Children),
            "Infant" => Some(Self::Infant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SeatType {
    Economy,
    Business,
    #[serde(rename = "First Class")]
    FirstClass,
}

impl SeatType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Economy" => Some(Self::Economy),
            "Business" => Some(Self::Business),
            "First Class" => Some(Self::FirstClass),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Economy => "Economy",
            Self::Business => "Business",
            Self::FirstClass => "First Class",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoomType {
    Standard,
    Deluxe,
    Suite,
}

impl RoomType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Standard" => Some(Self::Standard),
            "Deluxe" => Some(Self::Deluxe),
            "Suite" => Some(Self::Suite),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::Deluxe => "Deluxe",
            Self::Suite => "Suite",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransportKind {
    Taxi,
    Shuttle,
    #[serde(rename = "Private Car")]
    PrivateCar,
}

impl TransportKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Taxi" => Some(Self::Taxi),
            "Shuttle" => Some(Self::Shuttle),
            "Private Car" => Some(Self::PrivateCar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Taxi => "Taxi",
            Self::Shuttle => "Shuttle",
            Self::PrivateCar => "Private Car",
        }
    }
}

/// Amenity values the CRM schema accepts; anything else is dropped
pub const ALLOWED_AMENITIES: [&str; 3] = ["breakfast", "Wi-Fi", "parking"];

/// Keep only allow-listed amenities, preserving submission order
pub fn filter_amenities<'a, I>(amenities: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    amenities
        .into_iter()
        .filter(|a| ALLOWED_AMENITIES.contains(a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_type_round_trip() {
        for s in ["Flight", "Hotel", "Transport"] {
            assert_eq!(ProductType::parse(s).unwrap().as_str(), s);
        }
        assert!(ProductType::parse("Cruise").is_none());
        assert!(ProductType::parse("flight").is_none());
    }

    #[test]
    fn test_amenity_filter_drops_unknown_values() {
        let input = vec!["breakfast", "WiFi", "Wi-Fi", "pool", "parking"];
        let kept = filter_amenities(input);
        assert_eq!(kept, vec!["breakfast", "Wi-Fi", "parking"]);
    }

    #[test]
    fn test_amenity_filter_empty_input() {
        assert!(filter_amenities(Vec::<&str>::new()).is_empty());
    }

    #[test]
    fn test_seat_type_first_class_label() {
        assert_eq!(SeatType::parse("First Class"), Some(SeatType::FirstClass));
        let json = serde_json::to_string(&SeatType::FirstClass).unwrap();
        assert_eq!(json, "\"First Class\"");
    }
}
