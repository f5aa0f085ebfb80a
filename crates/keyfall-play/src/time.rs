use std::cell::Cell;
use std::time::Instant;

/// Wall-clock source for session drivers. [`PlaySession`] takes raw
/// microsecond timestamps rather than a clock, so hosts sample a
/// provider once per frame and pass the reading through `update` and
/// the key entry points.
///
/// [`PlaySession`]: crate::session::PlaySession
pub trait TimeProvider {
    /// Microseconds since the provider's epoch.
    fn now_us(&self) -> i64;
}

/// Monotonic clock with its epoch fixed at construction.
#[derive(Debug)]
pub struct SystemTimeProvider {
    epoch: Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn now_us(&self) -> i64 {
        self.epoch.elapsed().as_micros() as i64
    }
}

/// Manually stepped clock for deterministic tests and headless
/// simulation.
#[derive(Debug, Default)]
pub struct MockTimeProvider {
    now_us: Cell<i64>,
}

impl MockTimeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, us: i64) {
        self.now_us.set(us);
    }

    /// Advance by one frame step and return the new reading, so a
    /// frame loop reads `session.update(clock.step(FRAME_US))`.
    pub fn step(&self, delta_us: i64) -> i64 {
        self.now_us.set(self.now_us.get() + delta_us);
        self.now_us.get()
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_us(&self) -> i64 {
        self.now_us.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepped_clock_returns_each_new_reading() {
        let clock = MockTimeProvider::new();
        assert_eq!(clock.now_us(), 0);
        assert_eq!(clock.step(8_000), 8_000);
        assert_eq!(clock.step(8_000), 16_000);
        clock.set_time(3_000_000);
        assert_eq!(clock.step(8_000), 3_008_000);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemTimeProvider::new();
        let a = clock.now_us();
        let b = clock.now_us();
        assert!(b >= a);
    }
}
