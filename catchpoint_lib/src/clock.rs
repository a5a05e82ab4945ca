//! Time source used by the token cache and the time-range resolver.

use chrono::{DateTime, Utc};

/// Supplies the current instant. Swap in a fixed clock for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
