//! HTTP request helper
//!
//! Every store talks to the backend through [`Transport`]. The production
//! implementation is [`HttpTransport`]; tests substitute their own.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;

pub use reqwest::Method;

/// Message used when an error response carries none
const FALLBACK_ERROR_MESSAGE: &str = "Request failed";

/// A single call against the REST API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, e.g. `/projects/42`
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Performs API calls
///
/// Returns `Ok(None)` for a successful response without content, the parsed
/// JSON otherwise. Non-2xx answers become [`ApiError::Status`] carrying the
/// server's `message` when it sent one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>, ApiError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Option<Value>, ApiError> {
        let url = self.config.url(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!("{} {} failed: {}", request.method, url, e);
            ApiError::from(e)
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        interpret_response(status, &body)
    }
}

/// Map a raw status + body onto the transport contract
pub(crate) fn interpret_response(status: u16, body: &[u8]) -> Result<Option<Value>, ApiError> {
    if !(200..300).contains(&status) {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());
        return Err(ApiError::Status { status, message });
    }

    if status == 204 || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_returns_json() {
        let body = br#"{"_id":"p1"}"#;
        let value = interpret_response(200, body).unwrap();
        assert_eq!(value, Some(json!({"_id": "p1"})));
    }

    #[test]
    fn test_no_content_returns_none() {
        assert_eq!(interpret_response(204, b"").unwrap(), None);
        assert_eq!(interpret_response(200, b"  ").unwrap(), None);
        assert_eq!(interpret_response(200, b"null").unwrap(), None);
    }

    #[test]
    fn test_error_uses_server_message() {
        let err = interpret_response(400, br#"{"message":"Name is required"}"#).unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 400,
                message: "Name is required".to_string()
            }
        );
        assert_eq!(err.to_string(), "Name is required");
    }

    #[test]
    fn test_error_without_message_falls_back() {
        let err = interpret_response(502, b"<html>Bad Gateway</html>").unwrap_err();
        assert_eq!(err.to_string(), "Request failed");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn test_malformed_success_body() {
        let err = interpret_response(200, b"{not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::patch("/tasks/t1/status", json!({"status": "Complete"}));
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(request.path, "/tasks/t1/status");
        assert!(request.body.is_some());

        assert!(ApiRequest::delete("/tasks/t1").body.is_none());
    }
}
