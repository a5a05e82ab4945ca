//! Error types for the Catchpoint API client.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Base error type for Catchpoint operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid usage: {0}")]
    Usage(#[from] UsageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Response body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// HTTP status attached to the error, if the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Auth(e) => e.status_code,
            Error::Api(e) => Some(e.status_code),
            _ => None,
        }
    }

    /// True for caller mistakes that were rejected before any network I/O.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::Usage(_))
    }
}

/// Raised when the token endpoint refuses the credentials or answers with
/// something that is not a usable token.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct AuthError {
    pub message: String,
    pub status_code: Option<u16>,
    pub reason: Option<String>,
    pub body: Vec<u8>,
}

impl AuthError {
    pub fn new(
        message: impl Into<String>,
        status_code: Option<u16>,
        reason: Option<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            message: message.into(),
            status_code,
            reason,
            body,
        }
    }

    /// Raw body as lossy UTF-8, for diagnostics.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Raised when a resource call returns a status outside 200..=299.
#[derive(Error, Debug)]
#[error("{status_code} {reason} was returned. Body: {}", String::from_utf8_lossy(.body))]
pub struct ApiError {
    pub status_code: u16,
    pub reason: String,
    pub body: Vec<u8>,
}

impl ApiError {
    pub fn new(status_code: u16, reason: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status_code,
            reason: reason.into(),
            body,
        }
    }

    /// Raw body as lossy UTF-8, for diagnostics.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON, when the server sent JSON with the error.
    pub fn body_json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Caller mistakes detected before a request is issued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error(
        "When using relative times, startTime must be a negative number \
         (number of minutes minus 'now'), got '{value}'."
    )]
    InvalidRelativeStart { value: String },

    #[error(
        "Unknown Timezone '{name}'. Use tz database format: \
         http://en.wikipedia.org/wiki/List_of_tz_database_time_zones"
    )]
    UnknownTimezone { name: String },
}

/// The transport could not complete the exchange (DNS, TLS, timeout, ...).
#[derive(Error, Debug)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an arbitrary transport failure.
    pub fn from_source(src: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: src.to_string(),
            source: Some(Box::new(src)),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::from_source(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(e.into())
    }
}
