//! Synchronous HTTP transport seam.
//!
//! [`Transport`] is the client's only dependency on an HTTP stack. The default
//! [`ReqwestTransport`] wraps `reqwest`'s blocking client; tests and embedders
//! can supply their own implementation.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::time::Duration;
use url::Url;

use crate::error::TransportError;

/// A fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    /// Sent as `application/x-www-form-urlencoded` when present.
    pub form: Option<Vec<(String, String)>>,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url, headers: HeaderMap) -> Self {
        Self {
            method,
            url,
            headers,
            query: Vec::new(),
            form: None,
        }
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200..=299
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Canonical reason phrase for the status, empty for unknown codes.
    pub fn reason(&self) -> String {
        self.status.canonical_reason().unwrap_or("").to_string()
    }
}

/// Blocking request/response primitive.
pub trait Transport: Send + Sync {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by `reqwest::blocking::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Builds a client with the given request timeout and `User-Agent`.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { http })
    }

    /// Wraps an existing reqwest client.
    pub fn with_client(http: reqwest::blocking::Client) -> Self {
        Self { http }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let HttpRequest {
            method,
            url,
            headers,
            query,
            form,
        } = request;
        let mut req = self.http.request(method, url).headers(headers);
        if !query.is_empty() {
            req = req.query(&query);
        }
        if let Some(form) = form {
            req = req.form(&form);
        }
        let res = req.send()?;
        let status = res.status();
        let body = res.bytes()?.to_vec();
        Ok(HttpResponse { status, body })
    }
}
