use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use tripline_core::combine_date_time;
use tripline_core::params::{DateValue, NumberOrText};
use tripline_core::DateTimeError;

use crate::client::{HubSpotClient, MEETING_TO_CONTACT, MEETING_TO_DEAL};
use crate::error::CrmError;

/// Meeting outcomes offered by the form, mapped to HubSpot's engagement
/// outcome values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MeetingOutcome {
    Completed,
    Scheduled,
    Rescheduled,
    NoShow,
    Canceled,
}

impl MeetingOutcome {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Completed" => Some(Self::Completed),
            "Scheduled" => Some(Self::Scheduled),
            "Rescheduled" => Some(Self::Rescheduled),
            "No Show" => Some(Self::NoShow),
            "Canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn hubspot_value(&self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Scheduled => "SCHEDULED",
            Self::Rescheduled => "RESCHEDULED",
            Self::NoShow => "NO_SHOW",
            Self::Canceled => "CANCELED",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MeetingError {
    #[error("Missing required meeting parameters ({0})")]
    Missing(String),

    #[error("Invalid meeting outcome provided.")]
    UnknownOutcome,

    #[error("duration must be a positive number of minutes.")]
    InvalidDuration,

    #[error("{0}")]
    DateTime(#[from] DateTimeError),

    #[error(transparent)]
    Crm(#[from] CrmError),
}

/// The meeting-log form submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeetingLogRequest {
    /// Contact ids selected as attendees.
    pub attendees: Vec<String>,
    pub outcome: Option<String>,
    pub date: Option<DateValue>,
    pub time: Option<String>,
    /// Duration in minutes.
    pub duration: Option<NumberOrText>,
    pub description: Option<String>,
    pub deal_id: Option<String>,
}

/// A contact rendered in the attendee picker.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub object_id: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_main: bool,
}

fn summarize(id: String, mut properties: BTreeMap<String, Option<String>>, is_main: bool) -> ContactSummary {
    let mut take = |name: &str| properties.remove(name).flatten();
    ContactSummary {
        firstname: take("firstname"),
        lastname: take("lastname"),
        email: take("email"),
        phone: take("phone"),
        object_id: id,
        is_main,
    }
}

/// Display name for the meeting title; falls back to the contact id when
/// no name properties are set.
fn display_name(summary: &ContactSummary) -> String {
    let name = [summary.firstname.as_deref(), summary.lastname.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if name.trim().is_empty() {
        summary.object_id.clone()
    } else {
        name
    }
}

/// Resolve the meeting's start and end instants from the form fields.
fn meeting_window(req: &MeetingLogRequest) -> Result<(DateTime<Utc>, DateTime<Utc>), MeetingError> {
    let mut missing = Vec::new();
    if req.attendees.is_empty() {
        missing.push("attendees");
    }
    let date = match &req.date {
        Some(d) if !d.formatted().trim().is_empty() => Some(d),
        _ => {
            missing.push("date");
            None
        }
    };
    let time = match req.time.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => Some(t),
        _ => {
            missing.push("time");
            None
        }
    };
    if req.duration.is_none() {
        missing.push("duration");
    }
    if !missing.is_empty() {
        return Err(MeetingError::Missing(missing.join(", ")));
    }

    let start = combine_date_time(
        date.map(DateValue::formatted).unwrap_or(""),
        time.unwrap_or(""),
    )?;
    let minutes = req
        .duration
        .as_ref()
        .and_then(NumberOrText::as_count)
        .filter(|m| *m > 0)
        .ok_or(MeetingError::InvalidDuration)?;

    Ok((start, start + Duration::minutes(minutes as i64)))
}

/// The main contact plus its associated contacts, main flagged first.
/// Associated-contact fetch failures are logged and skipped.
pub async fn fetch_contact(
    client: &HubSpotClient,
    contact_id: &str,
) -> Result<Vec<ContactSummary>, CrmError> {
    let (id, properties) = client.get_contact(contact_id).await?;
    let mut contacts = vec![summarize(id, properties, true)];

    let associated = client.list_contact_association_ids(contact_id).await?;
    let fetched = join_all(associated.iter().map(|aid| client.get_contact(aid))).await;
    for (aid, result) in associated.iter().zip(fetched) {
        match result {
            Ok((id, properties)) => contacts.push(summarize(id, properties, false)),
            Err(err) => {
                tracing::warn!(contact_id = %aid, error = %err, "associated contact fetch failed, skipping");
            }
        }
    }

    Ok(contacts)
}

/// Create the meeting with its contact (and optional deal) associations,
/// then verify them in the same request. The old deployment re-checked
/// associations from a detached timer after a fixed delay; this version
/// awaits the follow-up instead.
pub async fn log_meeting(
    client: &HubSpotClient,
    req: &MeetingLogRequest,
) -> Result<String, MeetingError> {
    let (start, end) = meeting_window(req)?;

    let outcome = match req.outcome.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => {
            Some(MeetingOutcome::parse(s).ok_or(MeetingError::UnknownOutcome)?)
        }
        _ => None,
    };

    // Attendee names for the title; an unfetchable contact keeps its id.
    let fetched = join_all(req.attendees.iter().map(|id| client.get_contact(id))).await;
    let names: Vec<String> = req
        .attendees
        .iter()
        .zip(fetched)
        .map(|(id, result)| match result {
            Ok((cid, properties)) => display_name(&summarize(cid, properties, false)),
            Err(_) => id.clone(),
        })
        .collect();

    let mut properties = json!({
        "hs_timestamp": start.timestamp_millis(),
        "hs_meeting_title": format!("Meeting with {}", names.join(", ")),
        "hs_meeting_body": req.description.clone().unwrap_or_default(),
        "hs_meeting_start_time": start.timestamp_millis(),
        "hs_meeting_end_time": end.timestamp_millis(),
    });
    if let Some(outcome) = outcome {
        properties["hs_meeting_outcome"] = json!(outcome.hubspot_value());
    }

    let deal_id = req.deal_id.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let mut associations: Vec<Value> = req
        .attendees
        .iter()
        .map(|id| inline_association(id, MEETING_TO_CONTACT))
        .collect();
    if let Some(deal_id) = deal_id {
        associations.push(inline_association(deal_id, MEETING_TO_DEAL));
    }

    let meeting_id = client.create_meeting(&properties, &associations).await?;
    verify_associations(client, &meeting_id, &req.attendees, deal_id).await?;

    Ok(meeting_id)
}

fn inline_association(to_id: &str, type_id: u32) -> Value {
    json!({
        "to": { "id": to_id },
        "types": [{
            "associationCategory": "HUBSPOT_DEFINED",
            "associationTypeId": type_id,
        }],
    })
}

/// Re-create any association the create call dropped.
async fn verify_associations(
    client: &HubSpotClient,
    meeting_id: &str,
    attendees: &[String],
    deal_id: Option<&str>,
) -> Result<(), CrmError> {
    let existing = client.list_meeting_association_ids(meeting_id, "contacts").await?;
    for contact_id in attendees {
        if !existing.contains(contact_id) {
            tracing::warn!(meeting_id, %contact_id, "contact association missing, re-creating");
            client
                .associate_meeting(meeting_id, "contacts", contact_id, MEETING_TO_CONTACT)
                .await?;
        }
    }

    if let Some(deal_id) = deal_id {
        let existing = client.list_meeting_association_ids(meeting_id, "deals").await?;
        if !existing.iter().any(|id| id == deal_id) {
            tracing::warn!(meeting_id, deal_id, "deal association missing, re-creating");
            client
                .associate_meeting(meeting_id, "deals", deal_id, MEETING_TO_DEAL)
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_values() {
        assert_eq!(MeetingOutcome::parse("No Show"), Some(MeetingOutcome::NoShow));
        assert_eq!(MeetingOutcome::NoShow.hubspot_value(), "NO_SHOW");
        assert_eq!(MeetingOutcome::parse("no show"), None);
    }

    #[test]
    fn test_request_deserializes_form_shapes() {
        let req: MeetingLogRequest = serde_json::from_value(json!({
            "attendees": ["301", "302"],
            "outcome": "Completed",
            "date": {"formattedDate": "05/01/2025"},
            "time": "10:15",
            "duration": "45",
            "description": "Quarterly review"
        }))
        .unwrap();
        assert_eq!(req.attendees.len(), 2);
        assert_eq!(req.duration.unwrap().as_count(), Some(45));
    }

    #[test]
    fn test_meeting_window_spans_duration() {
        let req: MeetingLogRequest = serde_json::from_value(json!({
            "attendees": ["301"],
            "date": "2025-05-01",
            "time": "10:15",
            "duration": 45
        }))
        .unwrap();
        let (start, end) = meeting_window(&req).unwrap();
        assert_eq!((end - start).num_minutes(), 45);
        assert_eq!(start.timestamp_millis() % 60_000, 0);
    }

    #[test]
    fn test_meeting_window_lists_missing_fields() {
        let err = meeting_window(&MeetingLogRequest::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required meeting parameters (attendees, date, time, duration)"
        );
    }

    #[test]
    fn test_zero_duration_rejected() {
        let req: MeetingLogRequest = serde_json::from_value(json!({
            "attendees": ["301"],
            "date": "2025-05-01",
            "time": "10:15",
            "duration": 0
        }))
        .unwrap();
        assert!(matches!(meeting_window(&req), Err(MeetingError::InvalidDuration)));
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let named = ContactSummary {
            object_id: "301".into(),
            firstname: Some("Ada".into()),
            lastname: Some("Lovelace".into()),
            email: None,
            phone: None,
            is_main: true,
        };
        assert_eq!(display_name(&named), "Ada Lovelace");

        let bare = ContactSummary {
            object_id: "302".into(),
            firstname: None,
            lastname: None,
            email: None,
            phone: None,
            is_main: false,
        };
        assert_eq!(display_name(&bare), "302");
    }
}
