use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::json;

use tripline_core::Envelope;
use tripline_crm::{fetch_contact, log_meeting, MeetingError, MeetingLogRequest};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/functions/meeting-log", post(meeting_log))
}

/// The meeting-log function multiplexes on `action`, as the UI extension
/// calls one serverless function for both the contact lookup and the log.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingLogParams {
    pub action: Option<String>,
    pub contact_id: Option<String>,
    #[serde(flatten)]
    pub request: MeetingLogRequest,
}

/// POST /functions/meeting-log
pub async fn meeting_log(
    State(state): State<AppState>,
    Json(params): Json<MeetingLogParams>,
) -> Json<Envelope> {
    let envelope = match params.action.as_deref() {
        Some("fetchContact") => fetch_contact_action(&state, params.contact_id.as_deref()).await,
        Some("logMeeting") => log_meeting_action(&state, &params.request).await,
        _ => Envelope::fail("Unsupported action provided."),
    };
    Json(envelope)
}

async fn fetch_contact_action(state: &AppState, contact_id: Option<&str>) -> Envelope {
    let Some(contact_id) = contact_id.map(str::trim).filter(|s| !s.is_empty()) else {
        return Envelope::fail("Missing required parameter: contactId");
    };

    match fetch_contact(&state.crm, contact_id).await {
        Ok(contacts) => Envelope::ok_with(
            format!("Retrieved {} contact(s)", contacts.len()),
            json!(contacts),
        ),
        Err(err) => {
            tracing::error!(contact_id, error = %err, "failed to fetch contact");
            Envelope::fail_with("Failed to fetch contact and associations", err.detail())
        }
    }
}

async fn log_meeting_action(state: &AppState, request: &MeetingLogRequest) -> Envelope {
    match log_meeting(&state.crm, request).await {
        Ok(meeting_id) => {
            Envelope::ok_with("Meeting successfully logged!", json!({ "meetingId": meeting_id }))
        }
        Err(MeetingError::Crm(err)) => {
            tracing::error!(error = %err, "failed to log meeting");
            Envelope::fail_with("Failed to log meeting", err.detail())
        }
        Err(err) => Envelope::fail(err.to_string()),
    }
}
