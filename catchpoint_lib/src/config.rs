//! Client configuration: host, API version, and token handling knobs.

use chrono::TimeDelta;
use std::time::Duration;
use url::Url;

use crate::error::Result;

pub const DEFAULT_HOST: &str = "io.catchpoint.com";
pub const DEFAULT_VERSION: u32 = 1;
/// Seconds shaved off every token lifetime to absorb clock skew and latency.
pub const DEFAULT_SAFETY_BUFFER_SECS: i64 = 60;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

const TOKEN_PATH: &str = "ui/api/token";

/// How the access token is presented in the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BearerEncoding {
    /// `Bearer base64(access_token)`, as the Catchpoint API expects.
    #[default]
    Base64,
    /// `Bearer access_token`.
    Plain,
}

/// Everything the client needs besides credentials.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub version: u32,
    /// Overrides `https://{host}` (proxies, local mocks).
    pub base_url: Option<Url>,
    pub safety_buffer: TimeDelta,
    pub bearer_encoding: BearerEncoding,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            version: DEFAULT_VERSION,
            base_url: None,
            safety_buffer: TimeDelta::seconds(DEFAULT_SAFETY_BUFFER_SECS),
            bearer_encoding: BearerEncoding::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("catchpoint-rs/{}", crate::VERSION),
        }
    }
}

impl Config {
    fn root(&self) -> String {
        match &self.base_url {
            Some(u) => u.as_str().trim_end_matches('/').to_string(),
            None => format!("https://{}", self.host),
        }
    }

    /// `https://{host}/ui/api/token`
    pub fn token_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("{}/{}", self.root(), TOKEN_PATH))?)
    }

    /// `https://{host}/ui/api/v{version}/{path}`
    pub fn resource_url(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}/ui/api/v{}/{}",
            self.root(),
            self.version,
            path.trim_start_matches('/')
        ))?)
    }
}
