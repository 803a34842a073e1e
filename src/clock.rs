use std::cell::Cell;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use thiserror::Error;

pub trait Clock {
    fn now(&self) -> Instant;
    fn wall(&self) -> DateTime<Local>;
}

#[derive(Debug, Error, Clone, Copy, Eq, PartialEq)]
#[error("manual clock cannot advance by {0:?}: instant out of range")]
pub struct ClockOverflow(pub Duration);

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Local> {
        Local::now()
    }
}

#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Cell<Duration>,
    wall_origin: DateTime<Local>,
}

impl ManualClock {
    pub fn new(wall_origin: DateTime<Local>) -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
            wall_origin,
        }
    }

    pub fn advance(&self, by: Duration) -> Result<(), ClockOverflow> {
        let elapsed = self
            .elapsed
            .get()
            .checked_add(by)
            .filter(|elapsed| self.origin.checked_add(*elapsed).is_some())
            .ok_or(ClockOverflow(by))?;
        self.elapsed.set(elapsed);
        Ok(())
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        // advance keeps origin + elapsed representable
        self.origin
            .checked_add(self.elapsed.get())
            .unwrap_or(self.origin)
    }

    fn wall(&self) -> DateTime<Local> {
        let elapsed =
            chrono::Duration::from_std(self.elapsed.get()).unwrap_or(chrono::Duration::MAX);
        self.wall_origin
            .checked_add_signed(elapsed)
            .unwrap_or(self.wall_origin)
    }
}
