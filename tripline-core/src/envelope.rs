use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The response contract every function answers with: one human-readable
/// message, plus optional data / error detail. Failures are values, never
/// escaped exceptions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl Envelope {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn ok_with(message: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    pub fn fail_with(message: impl Into<String>, error: Value) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let value = serde_json::to_value(Envelope::ok("done")).unwrap();
        assert_eq!(value, json!({"success": true, "message": "done"}));
    }

    #[test]
    fn test_failure_carries_error_detail() {
        let env = Envelope::fail_with("nope", json!({"status": 404}));
        let value = serde_json::to_value(env).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"]["status"], 404);
    }
}
