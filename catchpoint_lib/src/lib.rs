//! Catchpoint REST API client library.
//!
//! Provides a blocking, typed client for the Catchpoint performance-monitoring
//! API: OAuth2 client-credentials authentication with a cached bearer token,
//! plus raw test data, favorite charts, and nodes endpoints.

pub mod auth;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod secret;
pub mod time_range;
pub mod transport;

#[cfg(test)]
mod testing;

pub use auth::{Authenticator, Token};
pub use client::{Client, ClientBuilder, Params};
pub use clock::{Clock, SystemClock};
pub use config::{BearerEncoding, Config, DEFAULT_HOST, DEFAULT_VERSION};
pub use error::{ApiError, AuthError, Error, Result, TransportError, UsageError};
pub use reqwest::Method;
pub use secret::Secret;
pub use time_range::{resolve as resolve_time_range, NOW};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Library version for User-Agent and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
