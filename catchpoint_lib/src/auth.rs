//! OAuth2 client-credentials token cache.
//!
//! [`Authenticator::ensure_valid_headers`] runs before every resource call. It
//! returns the shared header set and refreshes the bearer token first when
//! none is cached or the cached one has expired. The cache lock is held across
//! the refresh, so callers sharing a client wait for a single token request
//! instead of each issuing their own.

use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::clock::Clock;
use crate::config::BearerEncoding;
use crate::error::{AuthError, Result};
use crate::secret::Secret;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// A bearer token and the instant after which it must not be used.
#[derive(Debug, Clone)]
pub struct Token {
    pub access_token: Secret,
    /// Already reduced by the safety buffer.
    pub expires_at: DateTime<Utc>,
}

impl Token {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: ExpiresIn,
}

/// Some deployments send `expires_in` as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(i64),
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Option<i64> {
        match self {
            ExpiresIn::Seconds(s) => Some(*s),
            ExpiresIn::Text(t) => t.trim().parse().ok(),
        }
    }
}

struct CacheState {
    token: Option<Token>,
    headers: HeaderMap,
}

/// Owns the credentials and the cached token for one client.
pub struct Authenticator {
    client_id: String,
    client_secret: Secret,
    token_url: Url,
    safety_buffer: TimeDelta,
    encoding: BearerEncoding,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState>,
}

impl Authenticator {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<Secret>,
        token_url: Url,
        safety_buffer: TimeDelta,
        encoding: BearerEncoding,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url,
            safety_buffer,
            encoding,
            transport,
            clock,
            state: Mutex::new(CacheState {
                token: None,
                headers,
            }),
        }
    }

    /// Headers for the next resource call, refreshing the token if needed.
    pub fn ensure_valid_headers(&self) -> Result<HeaderMap> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let fresh = state
            .token
            .as_ref()
            .is_some_and(|t| !t.is_expired_at(now));
        if !fresh {
            match &state.token {
                Some(t) => debug!(expired_at = %t.expires_at, "Access token expired, refreshing"),
                None => debug!("No access token cached, requesting one"),
            }
            self.refresh(&mut state)?;
        }
        Ok(state.headers.clone())
    }

    /// Expiry of the cached token, if any.
    pub fn token_expires_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().token.as_ref().map(|t| t.expires_at)
    }

    /// Forgets the cached token so the next call refreshes.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.token = None;
        state.headers.remove(AUTHORIZATION);
    }

    fn refresh(&self, state: &mut CacheState) -> Result<()> {
        state.headers.remove(AUTHORIZATION);
        state.token = None;

        debug!(url = %self.token_url, client_id = %self.client_id, "Requesting access token");
        let mut req = HttpRequest::new(Method::POST, self.token_url.clone(), state.headers.clone());
        req.form = Some(vec![
            ("grant_type".to_string(), "client_credentials".to_string()),
            ("client_id".to_string(), self.client_id.clone()),
            (
                "client_secret".to_string(),
                self.client_secret.expose().to_string(),
            ),
        ]);
        let res = self.transport.send(req)?;
        if !res.is_success() {
            warn!(status = res.status.as_u16(), "Token endpoint rejected the request");
            return Err(auth_error(
                format!(
                    "{} {} was returned. Body: {}",
                    res.status.as_u16(),
                    res.reason(),
                    String::from_utf8_lossy(&res.body)
                ),
                Some(res),
            )
            .into());
        }

        let parsed: TokenResponse = match serde_json::from_slice(&res.body) {
            Ok(p) => p,
            Err(e) => {
                return Err(auth_error(format!("Malformed token response: {e}"), Some(res)).into())
            }
        };
        let expires_at = parsed
            .expires_in
            .seconds()
            .and_then(TimeDelta::try_seconds)
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .and_then(|at| at.checked_sub_signed(self.safety_buffer));
        let Some(expires_at) = expires_at else {
            return Err(auth_error("Malformed token response: bad expires_in", Some(res)).into());
        };

        let bearer = match self.encoding {
            BearerEncoding::Base64 => {
                base64::engine::general_purpose::STANDARD.encode(parsed.access_token.as_bytes())
            }
            BearerEncoding::Plain => parsed.access_token.clone(),
        };
        let mut value = HeaderValue::from_str(&format!("Bearer {bearer}")).map_err(|_| {
            auth_error("Access token contains characters not allowed in a header", None)
        })?;
        value.set_sensitive(true);

        state.headers.insert(AUTHORIZATION, value);
        state.token = Some(Token {
            access_token: Secret::new(parsed.access_token),
            expires_at,
        });
        info!(expires_at = %expires_at, client_id = %self.client_id, "Obtained new access token");
        Ok(())
    }
}

fn auth_error(message: impl Into<String>, res: Option<HttpResponse>) -> AuthError {
    match res {
        Some(res) => {
            let reason = res.reason();
            AuthError::new(message, Some(res.status.as_u16()), Some(reason), res.body)
        }
        None => AuthError::new(message, None, None, Vec::new()),
    }
}
