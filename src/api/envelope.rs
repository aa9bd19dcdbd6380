use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or protocol failure before a response was read.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status without a readable envelope.
    #[error("HTTP {0}")]
    Status(u16),

    /// The backend answered `success: false`.
    #[error("Rejected by backend: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),

    /// `success: true` but no `data` where data was required.
    #[error("Response carried no data")]
    MissingData,

    /// The response body was not the expected JSON.
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// An upload file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A link could not be resolved against the base URL.
    #[error("Invalid URL: {0}")]
    Url(String),
}

impl ApiError {
    /// Message shown to the operator: the backend's own reason when it gave
    /// one, otherwise the action-specific fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected(Some(reason)) if !reason.trim().is_empty() => reason.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T: DeserializeOwned> Envelope<T> {
    /// Data of a successful response.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(self.error));
        }
        self.data.ok_or(ApiError::MissingData)
    }

    /// Data of a successful response, with `null`/missing treated as empty.
    pub fn into_data_or_default(self) -> Result<T, ApiError>
    where
        T: Default,
    {
        if !self.success {
            return Err(ApiError::Rejected(self.error));
        }
        Ok(self.data.unwrap_or_default())
    }

    /// Acknowledge a mutation, discarding any data.
    pub fn into_ack(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(self.error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;
    use serde_json::Value;

    #[test]
    fn test_success_with_data() {
        let env: Envelope<Vec<Tag>> =
            serde_json::from_str(r#"{"success": true, "data": [{"name": "a"}]}"#).unwrap();
        assert_eq!(env.into_data().unwrap(), vec![Tag::new("a")]);
    }

    #[test]
    fn test_null_list_is_empty() {
        let env: Envelope<Vec<Tag>> =
            serde_json::from_str(r#"{"success": true, "data": null}"#).unwrap();
        assert!(env.into_data_or_default().unwrap().is_empty());
    }

    #[test]
    fn test_missing_data_is_error() {
        let env: Envelope<Tag> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(env.into_data(), Err(ApiError::MissingData)));
    }

    #[test]
    fn test_rejection_keeps_message() {
        let env: Envelope<Value> =
            serde_json::from_str(r#"{"success": false, "error": "invalid format"}"#).unwrap();
        let err = env.into_ack().unwrap_err();
        assert_eq!(err.user_message("Error doing bulk upload"), "invalid format");
    }

    #[test]
    fn test_rejection_without_message_uses_fallback() {
        let env: Envelope<Value> = serde_json::from_str(r#"{"success": false}"#).unwrap();
        let err = env.into_ack().unwrap_err();
        assert_eq!(err.user_message("Error creating tag."), "Error creating tag.");
    }
}
