//! `skillhub-client`
//!
//! **Responsibility:** the HTTP boundary of the client.
//!
//! This crate provides:
//! - `PlatformApi`, the seam the workflows call through
//! - `HttpPlatformApi`, its reqwest implementation against `/api/v1`
//! - the `{ success, data, error, message, pagination }` response envelope
//! - environment-driven `ClientConfig`

pub mod api;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;

pub use api::PlatformApi;
pub use config::ClientConfig;
pub use envelope::{ApiEnvelope, Pagination};
pub use error::ApiError;
pub use http::HttpPlatformApi;
