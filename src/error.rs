use reqwest::StatusCode;

/// Failure of a call to the IVS backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401 from the backend. The session has already been cleared by the
    /// time a caller sees this.
    #[error("unauthorized")]
    Unauthorized,
    #[error("HTTP {status}{}", .message.as_deref().map(|m| format!(": {}", m)).unwrap_or_default())]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Reduce to the string shown to the operator: the server's `message`
    /// field when it sent one, the page's static fallback otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}
