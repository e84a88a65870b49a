//! Run clock: owns "now" for a pipeline run.
//!
//! Every stage that needs the current time reads it from the RunClock
//! instead of the system, so a fixed clock makes a run reproducible.

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClock {
    now: NaiveDateTime,
}

impl RunClock {
    /// Clock frozen at the local wall time of construction.
    pub fn system() -> Self {
        Self::fixed(Local::now().naive_local())
    }

    /// Clock frozen at `now`, truncated to whole seconds.
    pub fn fixed(now: NaiveDateTime) -> Self {
        Self { now: now.with_nanosecond(0).unwrap_or(now) }
    }

    /// Clock frozen at the last second of `today`.
    pub fn end_of_day(today: NaiveDate) -> Self {
        match today.and_hms_opt(23, 59, 59) {
            Some(now) => Self::fixed(now),
            None      => Self::fixed(today.and_time(Default::default())),
        }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }
}
