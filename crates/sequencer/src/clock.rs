//! Time sources for block and batch timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// A source of wall-clock seconds.
///
/// Production uses [SystemClock]; tests inject [FixedClock] so produced
/// blocks and batches are replayable.
pub trait Clock: std::fmt::Debug + Send + Sync {
    /// Seconds since the Unix epoch.
    fn now(&self) -> u64;
}

/// The system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
    }
}

/// A clock frozen at a fixed instant.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fixed_clock_is_frozen() {
        let clock = FixedClock(1_700_000_000);
        assert_eq!(clock.now(), 1_700_000_000);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn system_clock_is_past_2023() {
        assert!(SystemClock.now() > 1_672_531_200);
    }
}
