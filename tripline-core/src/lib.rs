pub mod datetime;
pub mod draft;
pub mod envelope;
pub mod params;
pub mod payload;
pub mod product;

pub use datetime::{combine_date_time, utc_midnight_timestamp, DateTimeError};
pub use draft::{LineItemDraft, ValidationError, ValidationOptions};
pub use envelope::Envelope;
pub use params::LineItemParams;
pub use payload::{build_payloads, LineItemProperties};
pub use product::{PassengerType, ProductType, RoomType, SeatType, TransportKind};
