use serde_json::{json, Value};

/// Failures talking to HubSpot. Validation never reaches this type; these
/// are configuration and remote errors only.
#[derive(Debug, thiserror::Error)]
pub enum CrmError {
    #[error("PRIVATE_APP_ACCESS_TOKEN is not configured")]
    MissingCredential,

    #[error("HubSpot request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HubSpot API error (HTTP {status})")]
    Api { status: u16, body: Value },

    #[error("Unexpected HubSpot response shape: {0}")]
    Decode(String),
}

impl CrmError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// User-facing message for a failed delete batch.
    pub fn delete_message(&self) -> &'static str {
        match self.status() {
            Some(404) => "One or more line items not found",
            Some(401) => "Authentication failed",
            _ => "An unexpected error occurred while deleting line items",
        }
    }

    /// Error detail carried in the response envelope.
    pub fn detail(&self) -> Value {
        match self {
            Self::Api { status, body } => json!({ "status": status, "details": body }),
            other => json!({ "status": other.status().unwrap_or(500), "details": other.to_string() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_message_mapping() {
        let not_found = CrmError::Api { status: 404, body: Value::Null };
        assert_eq!(not_found.delete_message(), "One or more line items not found");

        let unauthorized = CrmError::Api { status: 401, body: Value::Null };
        assert_eq!(unauthorized.delete_message(), "Authentication failed");

        let server = CrmError::Api { status: 500, body: Value::Null };
        assert_eq!(
            server.delete_message(),
            "An unexpected error occurred while deleting line items"
        );
        assert_eq!(
            CrmError::MissingCredential.delete_message(),
            "An unexpected error occurred while deleting line items"
        );
    }

    #[test]
    fn test_detail_preserves_remote_body() {
        let err = CrmError::Api {
            status: 400,
            body: json!({"message": "Property does not exist"}),
        };
        let detail = err.detail();
        assert_eq!(detail["status"], 400);
        assert_eq!(detail["details"]["message"], "Property does not exist");
    }
}
