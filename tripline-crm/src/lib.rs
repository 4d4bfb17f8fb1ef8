pub mod aggregate;
pub mod client;
pub mod config;
pub mod error;
pub mod meeting;

pub use aggregate::{get_deal_line_items, group_line_items, GroupedLineItems, LineItemRecord};
pub use client::HubSpotClient;
pub use config::Config;
pub use error::CrmError;
pub use meeting::{
    fetch_contact, log_meeting, ContactSummary, MeetingError, MeetingLogRequest, MeetingOutcome,
};
