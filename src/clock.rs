//! "Now UTC" seam (§9 design note: the core must not call a global clock directly).

use chrono::{DateTime, Utc};

/// Supplies the current UTC time to a [`crate::BeaconTracker`].
///
/// Implemented generically (not as a trait object) since a tracker owns exactly
/// one clock for its whole lifetime.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test double that returns a fixed, settable instant.
///
/// Lets tests freeze time the way the original integration's test suite pinned
/// concrete `FAKE_TIME_*` fixtures. Cloning a `FixedClock` shares its
/// underlying cell, so a test can hand a tracker one clone and keep another
/// to advance time out from under it.
#[derive(Clone, Debug)]
pub struct FixedClock {
    now: std::rc::Rc<std::cell::Cell<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: std::rc::Rc::new(std::cell::Cell::new(now)),
        }
    }

    /// Move the frozen clock forward or backward to a new instant.
    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    /// Advance the frozen clock by a whole number of seconds.
    pub fn advance(&self, seconds: i64) {
        self.now.set(self.now.get() + chrono::Duration::seconds(seconds));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}
