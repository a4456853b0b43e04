//! Studioboard API client
//!
//! Request helper and typed endpoint surface for the dashboard backend.

pub mod api;
pub mod config;
pub mod error;
pub mod transport;

pub use api::StudioApi;
pub use config::{ClientConfig, ClientConfigBuilder, API_URL_ENV, DEFAULT_API_URL};
pub use error::ApiError;
pub use transport::{ApiRequest, HttpTransport, Method, Transport};
