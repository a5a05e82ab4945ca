//! Scripted transport and manual clock shared by the unit tests.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::collections::VecDeque;

use crate::clock::Clock;
use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    pub requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, status: u16, body: &str) -> &Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.responses
            .lock()
            .push_back(HttpResponse::new(status, body.as_bytes().to_vec()));
        self
    }

    pub fn push_token(&self, access_token: &str, expires_in: i64) -> &Self {
        self.push(
            200,
            &format!(r#"{{"access_token":"{access_token}","expires_in":{expires_in}}}"#),
        )
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn token_request_count(&self) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url.path().ends_with("/ui/api/token"))
            .count()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().last().cloned().unwrap()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| TransportError::new("no scripted response left"))
    }
}

/// Clock that only moves when told to.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    /// 2024-03-10 12:00:00.750 UTC
    pub fn fixed() -> Self {
        let base = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        Self(Mutex::new(base + TimeDelta::milliseconds(750)))
    }

    pub fn advance(&self, by: TimeDelta) {
        *self.0.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}
