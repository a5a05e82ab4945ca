//! Blocking HTTP client for the Catchpoint REST API.

use chrono::TimeDelta;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Authenticator;
use crate::clock::{Clock, SystemClock};
use crate::config::{BearerEncoding, Config};
use crate::error::{ApiError, Result};
use crate::secret::Secret;
use crate::time_range;
use crate::transport::{HttpRequest, ReqwestTransport, Transport};

/// Query string or form pairs.
pub type Params = Vec<(String, String)>;

/// Catchpoint API client.
///
/// Every endpoint method makes sure a bearer token is cached (requesting one
/// when needed), then issues a single blocking request and returns the JSON
/// body.
pub struct Client {
    config: Config,
    auth: Authenticator,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

/// Builder for [`Client`]; everything except the credentials is optional.
pub struct ClientBuilder {
    client_id: String,
    client_secret: Secret,
    config: Config,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl ClientBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.config.version = version;
        self
    }

    /// Replace `https://{host}` with an arbitrary root URL.
    pub fn base_url(mut self, url: Url) -> Self {
        self.config.base_url = Some(url);
        self
    }

    pub fn safety_buffer(mut self, buffer: TimeDelta) -> Self {
        self.config.safety_buffer = buffer;
        self
    }

    pub fn bearer_encoding(mut self, encoding: BearerEncoding) -> Self {
        self.config.bearer_encoding = encoding;
        self
    }

    /// Request timeout for the default transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// `User-Agent` for the default transport.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Client> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(
                self.config.timeout,
                &self.config.user_agent,
            )?),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(c) => c,
            None => Arc::new(SystemClock),
        };
        let auth = Authenticator::new(
            self.client_id,
            self.client_secret,
            self.config.token_url()?,
            self.config.safety_buffer,
            self.config.bearer_encoding,
            transport.clone(),
            clock.clone(),
        );
        Ok(Client {
            config: self.config,
            auth,
            transport,
            clock,
        })
    }
}

impl Client {
    /// Create a client for `io.catchpoint.com`, API v1.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<Secret>) -> Result<Self> {
        Self::builder(client_id, client_secret).build()
    }

    pub fn builder(
        client_id: impl Into<String>,
        client_secret: impl Into<Secret>,
    ) -> ClientBuilder {
        ClientBuilder {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            config: Config::default(),
            transport: None,
            clock: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current request headers, refreshing the token first if it expired.
    pub fn ensure_valid_headers(&self) -> Result<HeaderMap> {
        self.auth.ensure_valid_headers()
    }

    /// Drop the cached token; the next call requests a new one.
    pub fn invalidate_token(&self) {
        self.auth.invalidate();
    }

    /// Retrieve raw performance data for a test over a time window.
    ///
    /// Pass `end = "now"` with a negative `start` (minutes) for a window
    /// relative to the current time in `tz`.
    pub fn raw(
        &self,
        test_id: u64,
        start: Option<&str>,
        end: Option<&str>,
        tz: &str,
    ) -> Result<Value> {
        let (start, end) = time_range::resolve(start, end, tz, self.clock.now())?;
        debug!("Creating raw_chart url...");
        let mut params = Params::new();
        if let Some(s) = start {
            params.push(("startTime".to_string(), s));
        }
        if let Some(e) = end {
            params.push(("endTime".to_string(), e));
        }
        self.call(
            Method::GET,
            &format!("performance/raw/{}", test_id),
            params,
            None,
        )
    }

    /// List favorite charts.
    pub fn favorite_charts(&self) -> Result<Value> {
        debug!("Creating get_favorites url...");
        self.call(Method::GET, "performance/favoriteCharts", Params::new(), None)
    }

    /// Get a favorite chart's details.
    pub fn favorite_details(&self, fav_id: u64) -> Result<Value> {
        debug!("Creating favorite_details url...");
        self.call(
            Method::GET,
            &format!("performance/favoriteCharts/{}", fav_id),
            Params::new(),
            None,
        )
    }

    /// Get a favorite chart's data, optionally overriding its time frame or
    /// test set. The time frame is only sent when both bounds are given.
    pub fn favorite_data(
        &self,
        fav_id: u64,
        start: Option<&str>,
        end: Option<&str>,
        tz: &str,
        tests: Option<&[u64]>,
    ) -> Result<Value> {
        let (start, end) = time_range::resolve(start, end, tz, self.clock.now())?;
        debug!("Creating favorite_data url...");
        let mut params = Params::new();
        if let (Some(s), Some(e)) = (start, end) {
            params.push(("startTime".to_string(), s));
            params.push(("endTime".to_string(), e));
        }
        if let Some(tests) = tests {
            let ids: Vec<String> = tests.iter().map(|t| t.to_string()).collect();
            params.push(("tests".to_string(), ids.join(",")));
        }
        self.call(
            Method::GET,
            &format!("performance/favoriteCharts/{}/data", fav_id),
            params,
            None,
        )
    }

    /// List nodes available to the API consumer.
    pub fn nodes(&self) -> Result<Value> {
        debug!("Creating nodes url...");
        self.call(Method::GET, "nodes", Params::new(), None)
    }

    /// Get a single node.
    pub fn node(&self, node_id: u64) -> Result<Value> {
        debug!("Creating node url...");
        self.call(
            Method::GET,
            &format!("nodes/{}", node_id),
            Params::new(),
            None,
        )
    }

    /// Issue an authenticated request against `/ui/api/v{version}/{path}`.
    ///
    /// Statuses outside 200..=299 become [`ApiError`]; success bodies are
    /// parsed as JSON.
    pub fn call(
        &self,
        method: Method,
        path: &str,
        params: Params,
        data: Option<Params>,
    ) -> Result<Value> {
        let url = self.config.resource_url(path)?;
        let headers = self.auth.ensure_valid_headers()?;
        debug!(%method, %url, "Making request...");
        let mut req = HttpRequest::new(method, url, headers);
        req.query = params;
        req.form = data;
        let res = self.transport.send(req)?;
        if !res.is_success() {
            warn!(status = res.status.as_u16(), path, "API request failed");
            let reason = res.reason();
            return Err(ApiError::new(res.status.as_u16(), reason, res.body).into());
        }
        Ok(serde_json::from_slice(&res.body)?)
    }
}
