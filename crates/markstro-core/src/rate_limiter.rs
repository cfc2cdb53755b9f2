use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use governor::clock::{Clock, DefaultClock, Reference};

use crate::config::RateLimitConfig;

/// Sliding-window admission control over recent call timestamps.
///
/// Timestamps older than `cooldown` are pruned lazily, on access, before the
/// window is counted. Nothing runs on a timer.
pub struct RateLimiter<C: Clock = DefaultClock> {
    config: RateLimitConfig,
    window: Mutex<VecDeque<C::Instant>>,
    clock: C,
}

impl RateLimiter<DefaultClock> {
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, DefaultClock::default())
    }
}

impl Default for RateLimiter<DefaultClock> {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl<C: Clock> Debug for RateLimiter<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("in_window", &self.lock_window().len())
            .finish()
    }
}

impl<C: Clock> RateLimiter<C> {
    pub fn with_clock(config: RateLimitConfig, clock: C) -> Self {
        Self {
            config,
            window: Mutex::new(VecDeque::new()),
            clock,
        }
    }

    pub const fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Prunes the window and reports whether another call would be admitted.
    ///
    /// Checking does not reserve a slot. Two tasks that both check before
    /// either records can overshoot `max_calls`; use [`Self::try_admit`] when
    /// callers may run concurrently.
    pub fn can_make_request(&self) -> bool {
        let now = self.clock.now();
        let mut window = self.lock_window();
        self.prune(&mut window, now);
        window.len() < self.max_calls()
    }

    /// Appends the current time to the window.
    pub fn record_request(&self) {
        let now = self.clock.now();
        self.lock_window().push_back(now);
    }

    /// Time until the oldest recorded call leaves the window, or zero when the
    /// window is empty.
    pub fn wait_time(&self) -> Duration {
        let now = self.clock.now();
        let window = self.lock_window();
        self.wait_from(&window, now)
    }

    /// Prunes, checks and records as one step under a single lock.
    ///
    /// Returns the wait time when the window is full.
    pub fn try_admit(&self) -> Result<(), Duration> {
        let now = self.clock.now();
        let mut window = self.lock_window();
        self.prune(&mut window, now);

        if window.len() < self.max_calls() {
            window.push_back(now);
            Ok(())
        } else {
            Err(self.wait_from(&window, now))
        }
    }

    /// Calls still admissible in the current window.
    pub fn remaining(&self) -> u32 {
        let now = self.clock.now();
        let mut window = self.lock_window();
        self.prune(&mut window, now);
        let used = u32::try_from(window.len()).unwrap_or(u32::MAX);
        self.config.max_calls.saturating_sub(used)
    }

    /// Forgets every recorded call.
    pub fn reset(&self) {
        self.lock_window().clear();
    }

    fn max_calls(&self) -> usize {
        usize::try_from(self.config.max_calls).unwrap_or(usize::MAX)
    }

    fn prune(&self, window: &mut VecDeque<C::Instant>, now: C::Instant) {
        while let Some(oldest) = window.front() {
            if Duration::from(now.duration_since(*oldest)) < self.config.cooldown {
                break;
            }
            window.pop_front();
        }
    }

    fn wait_from(&self, window: &VecDeque<C::Instant>, now: C::Instant) -> Duration {
        window.front().map_or(Duration::ZERO, |oldest| {
            let elapsed = Duration::from(now.duration_since(*oldest));
            self.config.cooldown.saturating_sub(elapsed)
        })
    }

    fn lock_window(&self) -> MutexGuard<'_, VecDeque<C::Instant>> {
        // The window holds plain timestamps, so a panic mid-update cannot leave
        // it inconsistent.
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
