//! Remaining time until a fixed instant.
//!
//! The arithmetic is a pure function of two epoch-millisecond values so it can
//! be tested without a browser. The periodic refresh lives in
//! [`crate::hooks::use_countdown`], which owns the interval for exactly as long
//! as the component displaying the countdown is mounted.

use crate::error::InvalidTargetError;
use chrono::{DateTime, Utc};
use log::info;
use std::cell::Cell;
use std::fmt;

const MS_PER_SEC: i64 = 1000;
const SECS_PER_DAY: u64 = 86_400;
const SECS_PER_HOUR: u64 = 3_600;
const SECS_PER_MIN: u64 = 60;

/// The fixed instant a countdown runs towards, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountdownTarget(i64);

impl CountdownTarget {
    /// Parse an RFC 3339 / ISO-8601 timestamp carrying an explicit offset,
    /// e.g. `2026-02-17T19:00:00Z` or `2026-02-18T04:00:00+09:00`.
    pub fn parse(input: &str) -> Result<Self, InvalidTargetError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InvalidTargetError::Empty);
        }

        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| Self(dt.with_timezone(&Utc).timestamp_millis()))
            .map_err(|e| InvalidTargetError::Unparsable {
                input: trimmed.to_string(),
                reason: e.to_string(),
            })
    }

    pub const fn from_millis(epoch_ms: i64) -> Self {
        Self(epoch_ms)
    }

    pub const fn as_millis(&self) -> i64 {
        self.0
    }
}

impl std::str::FromStr for CountdownTarget {
    type Err = InvalidTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One reading of the countdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountdownValue {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub done: bool,
}

impl CountdownValue {
    /// Reading for a target that has already passed.
    pub const FINISHED: CountdownValue = CountdownValue {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
        done: true,
    };

    /// Decompose `max(0, target - now)` into whole days/hours/minutes/seconds.
    ///
    /// Sub-second remainders are floored away, so the last reading before the
    /// target shows all zeros with `done == false`.
    pub fn remaining(target_ms: i64, now_ms: i64) -> Self {
        let remaining_ms = target_ms.saturating_sub(now_ms).max(0);
        if remaining_ms == 0 {
            return Self::FINISHED;
        }

        let total_secs = (remaining_ms / MS_PER_SEC) as u64;
        Self {
            days: total_secs / SECS_PER_DAY,
            hours: (total_secs % SECS_PER_DAY) / SECS_PER_HOUR,
            minutes: (total_secs % SECS_PER_HOUR) / SECS_PER_MIN,
            seconds: total_secs % SECS_PER_MIN,
            done: false,
        }
    }

    /// Whole seconds represented by this reading.
    pub fn total_seconds(&self) -> u64 {
        self.days * SECS_PER_DAY + self.hours * SECS_PER_HOUR + self.minutes * SECS_PER_MIN + self.seconds
    }
}

impl fmt::Display for CountdownValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {:02}h {:02}m {:02}s",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// The real clock. On wasm32 this resolves to `Date.now()` via chrono's
/// `wasmbind` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Countdown bound to a target and a clock.
///
/// Once a reading reports `done`, the clock latches and keeps reporting
/// [`CountdownValue::FINISHED`] even if the wall clock is later moved back.
pub struct CountdownClock<C: Clock = SystemClock> {
    target: CountdownTarget,
    clock: C,
    finished: Cell<bool>,
}

impl CountdownClock<SystemClock> {
    pub fn system(target: CountdownTarget) -> Self {
        Self::new(target, SystemClock)
    }
}

impl<C: Clock> CountdownClock<C> {
    pub fn new(target: CountdownTarget, clock: C) -> Self {
        Self {
            target,
            clock,
            finished: Cell::new(false),
        }
    }

    pub fn target(&self) -> CountdownTarget {
        self.target
    }

    /// Reading at the clock's current time.
    pub fn current(&self) -> CountdownValue {
        self.value_at(self.clock.now_millis())
    }

    /// Reading at an explicit instant.
    pub fn value_at(&self, now_ms: i64) -> CountdownValue {
        if self.finished.get() {
            return CountdownValue::FINISHED;
        }

        let value = CountdownValue::remaining(self.target.as_millis(), now_ms);
        if value.done {
            info!("Countdown to {} reached zero", self.target.as_millis());
            self.finished.set(true);
        }
        value
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }
}
