use thiserror::Error;

/// Failure talking to the dashboard backend
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered outside the 2xx range
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request payload could not be serialized
    #[error("Invalid request body: {0}")]
    Encode(String),

    /// The response body was not the JSON we expected
    #[error("Invalid response: {0}")]
    Decode(String),

    /// A body was required but the backend sent none
    #[error("Empty response from {0}")]
    EmptyResponse(String),
}

impl ApiError {
    /// HTTP status, when the backend answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
