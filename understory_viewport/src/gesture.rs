// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-based gesture helpers.
//!
//! Everything takes the current [`Instant`] from the caller so behaviour is
//! deterministic under test.

use std::time::{Duration, Instant};

use kurbo::{Point, Vec2};

/// Lets an action through at most once per interval.
#[derive(Copy, Clone, Debug)]
pub struct RateLimiter {
    interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    /// Create a limiter.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Returns true, and starts a new interval, if the previous one elapsed.
    pub fn allow(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Holds the latest value until it has been stable for a delay.
#[derive(Copy, Clone, Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T: Copy> Debouncer<T> {
    /// Create a debouncer.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace the pending value and restart the delay.
    pub fn schedule(&mut self, now: Instant, value: T) {
        self.pending = Some((now, value));
    }

    /// Whether a value is waiting.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the value if its delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let (at, value) = self.pending?;
        if now.saturating_duration_since(at) >= self.delay {
            self.pending = None;
            Some(value)
        } else {
            None
        }
    }
}

/// A window during which something is blocked.
#[derive(Copy, Clone, Debug, Default)]
pub struct Suppression {
    until: Option<Instant>,
}

impl Suppression {
    /// Block until `now + window`.
    pub fn start(&mut self, now: Instant, window: Duration) {
        self.until = Some(now + window);
    }

    /// Whether `now` falls inside the window.
    pub fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|u| now < u)
    }
}

/// Pointer position and pan offset at the start of a drag.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DragAnchor {
    /// Pointer position at press.
    pub pointer: Point,
    /// View offset at press.
    pub offset: Vec2,
}

impl DragAnchor {
    /// Offset that keeps the grabbed point under the pointer.
    pub fn offset_for(&self, pointer: Point) -> Vec2 {
        self.offset + (pointer - self.pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_spaces_events() {
        let t0 = Instant::now();
        let mut r = RateLimiter::new(Duration::from_millis(16));
        assert!(r.allow(t0));
        assert!(!r.allow(t0 + Duration::from_millis(10)));
        assert!(r.allow(t0 + Duration::from_millis(16)));
    }

    #[test]
    fn debouncer_waits_for_quiet() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut d = Debouncer::new(ms(100));
        d.schedule(t0, (10, 10));
        d.schedule(t0 + ms(50), (20, 20));
        assert_eq!(d.poll(t0 + ms(120)), None);
        assert_eq!(d.poll(t0 + ms(150)), Some((20, 20)));
        assert!(!d.is_pending());
    }

    #[test]
    fn suppression_window() {
        let t0 = Instant::now();
        let mut s = Suppression::default();
        assert!(!s.is_active(t0));
        s.start(t0, Duration::from_millis(120));
        assert!(s.is_active(t0 + Duration::from_millis(119)));
        assert!(!s.is_active(t0 + Duration::from_millis(120)));
    }

    #[test]
    fn drag_accumulates() {
        let a = DragAnchor {
            pointer: Point::new(10.0, 10.0),
            offset: Vec2::new(5.0, 0.0),
        };
        assert_eq!(a.offset_for(Point::new(14.0, 7.0)), Vec2::new(9.0, -3.0));
    }
}
