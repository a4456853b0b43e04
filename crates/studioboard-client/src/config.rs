//! Client configuration

use std::time::Duration;

/// Environment variable holding the API base URL
pub const API_URL_ENV: &str = "STUDIOBOARD_API_URL";

/// Base URL used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every request path is appended to (no trailing slash)
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults, with the base URL taken from `STUDIOBOARD_API_URL` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = normalize_base_url(&url);
            }
        }
        config
    }

    /// Absolute URL for an API path such as `/projects`
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl AsRef<str>) -> Self {
        self.config.base_url = normalize_base_url(url.as_ref());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ClientConfig, String> {
        let url = &self.config.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("base URL must start with http:// or https://: {}", url));
        }
        if self.config.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.url("/projects"), "http://localhost:5000/api/projects");
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let config = ClientConfig::builder()
            .base_url("https://studio.example.com/api/")
            .build()
            .unwrap();

        assert_eq!(config.url("items"), "https://studio.example.com/api/items");
    }

    #[test]
    fn test_builder_rejects_bad_url() {
        let result = ClientConfig::builder().base_url("localhost:5000").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_env_reads_api_url() {
        std::env::set_var(API_URL_ENV, "https://env.example.com/api/");
        let config = ClientConfig::from_env();
        std::env::remove_var(API_URL_ENV);

        assert_eq!(config.base_url, "https://env.example.com/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_builder_rejects_zero_timeout() {
        let result = ClientConfig::builder().timeout(Duration::ZERO).build();
        assert!(result.is_err());
    }
}
