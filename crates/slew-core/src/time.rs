use std::fmt;
use std::time::Duration;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SimTime
// ---------------------------------------------------------------------------

/// Integer-nanosecond simulation clock.
///
/// Advanced once per control tick.  Tracking elapsed time as a monotonically
/// increasing `u64` nanosecond count avoids the floating-point accumulation
/// drift a long-running continuous rotation would otherwise suffer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Resource,
)]
pub struct SimTime {
    nanos: u64,
    ticks: u64,
}

impl SimTime {
    /// Clock at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { nanos: 0, ticks: 0 }
    }

    /// Elapsed simulated nanoseconds.
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    /// Elapsed simulated seconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_secs(&self) -> f64 {
        self.nanos as f64 / 1_000_000_000.0
    }

    /// Number of control ticks applied so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance the clock by one control tick of `dt` seconds.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn tick(&mut self, dt: f64) {
        self.nanos += (dt * 1_000_000_000.0) as u64;
        self.ticks += 1;
    }

    /// Elapsed time as a [`Duration`].
    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        Duration::from_nanos(self.nanos)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_secs())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
