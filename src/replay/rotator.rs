//! Map rotation over a fixed set of point-cloud fixtures
//!
//! Each map request advances a call counter. The fixture served is
//!
//! ```text
//! index = (counter / threshold) mod fixture_count
//! ```
//!
//! so one fixture is served for a block of `threshold` consecutive calls,
//! then the next one, wrapping back to the first after the last. The counter
//! never resets.
//!
//! Increment and index computation happen under one lock, so concurrent
//! callers each observe a distinct counter value.

use parking_lot::Mutex;
use std::sync::Arc;

/// Outcome of one map request
#[derive(Debug, Clone)]
pub struct MapSelection {
    /// Fixture chosen for this call
    pub payload: Arc<[u8]>,
    /// Counter value after this call's increment
    pub counter: u64,
    /// Index of the chosen fixture
    pub index: usize,
}

/// Rotates through preloaded point-cloud fixtures as calls accumulate
pub struct MapRotator {
    fixtures: Arc<[Arc<[u8]>]>,
    threshold: u64,
    counter: Mutex<u64>,
}

impl MapRotator {
    /// Create a rotator.
    ///
    /// `fixtures` must be non-empty (enforced by [`FixtureSet`](super::fixtures::FixtureSet)).
    /// A `threshold` of 0 is raised to 1.
    pub fn new(fixtures: Arc<[Arc<[u8]>]>, threshold: u64) -> Self {
        debug_assert!(!fixtures.is_empty(), "rotator needs at least one fixture");
        Self {
            fixtures,
            threshold: threshold.max(1),
            counter: Mutex::new(0),
        }
    }

    /// Advance the counter and pick the fixture for this call
    pub fn select(&self) -> MapSelection {
        let (counter, index) = {
            let mut counter = self.counter.lock();
            *counter += 1;
            (*counter, self.index_for(*counter))
        };

        log::debug!(
            "Map request #{}: serving fixture {}/{}",
            counter,
            index,
            self.fixtures.len()
        );

        MapSelection {
            payload: Arc::clone(&self.fixtures[index]),
            counter,
            index,
        }
    }

    /// Fixture index served for a given counter value
    pub fn index_for(&self, counter: u64) -> usize {
        ((counter / self.threshold) % self.fixtures.len() as u64) as usize
    }

    /// Calls served so far
    pub fn counter(&self) -> u64 {
        *self.counter.lock()
    }

    /// Calls per fixture
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Number of fixtures in rotation
    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }
}
