use serde::{Deserialize, Serialize};

// Response payloads

/// Success body returned by the upload endpoint.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UploadReceipt {
    pub id: String,
    pub filename: String,
    pub size: u64,
}

/// Failure body. The endpoint puts the user-facing text in `error`;
/// some deployments use `message` instead, so consumers check both.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            message: None,
        }
    }

    /// The text to show the user: `error` first, then `message`.
    pub fn user_message(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_field_wins_over_message() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"disk full","message":"ignored"}"#).unwrap();
        assert_eq!(body.user_message(), Some("disk full"));
    }

    #[test]
    fn falls_back_to_message_field() {
        let body: ErrorBody = serde_json::from_str(r#"{"message":"try later"}"#).unwrap();
        assert_eq!(body.user_message(), Some("try later"));
    }

    #[test]
    fn empty_object_has_no_message() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.user_message(), None);
    }
}
