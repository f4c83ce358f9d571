//! Time source injection for the response cache.

use std::sync::{Arc, RwLock};

use time::{Duration, OffsetDateTime};

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::clock";

/// Time source for cache expiry decisions. Injected at construction so
/// expiry can be driven deterministically in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Hand-advanced clock for tests and tooling.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<OffsetDateTime>>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = rw_write(&self.now, SOURCE, "advance");
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *rw_read(&self.now, SOURCE, "now")
    }
}
