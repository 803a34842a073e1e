use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use serde::Serialize;
use thiserror::Error;

use crate::field::kind::{FieldBounds, FieldKind};
use crate::field::timer::{TimerKind, TimerSlot, TimerToken};

pub const DEFAULT_BUFFER: &str = "00";

const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct FieldTiming {
    pub timeout: Duration,
    pub reset: Duration,
}

impl Default for FieldTiming {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PERIOD,
            reset: DEFAULT_PERIOD,
        }
    }
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum FieldError {
    #[error("'{0}' is not a decimal digit")]
    NotADigit(char),
    #[error("{kind} field buffer '{buffer}' is not numeric; reset to 00")]
    CorruptBuffer { kind: FieldKind, buffer: String },
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EntryState {
    Idle,
    Accumulating,
    TimedOut,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DigitOutcome {
    Committed(u32),
    Suppressed,
    Rejected,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Keystroke {
    pub outcome: DigitOutcome,
    pub armed: Option<TimerToken>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StepOutcome {
    Committed(u32),
    Ignored,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FieldView {
    pub kind: FieldKind,
    pub text: String,
    pub focused: bool,
}

#[derive(Debug, Clone)]
pub struct DigitField {
    kind: FieldKind,
    bounds: FieldBounds,
    timing: FieldTiming,
    committed: u32,
    buffer: String,
    timeout: TimerSlot,
    reset: TimerSlot,
}

impl DigitField {
    pub fn new(kind: FieldKind, bounds: FieldBounds, timing: FieldTiming) -> Self {
        Self {
            kind,
            bounds,
            timing,
            committed: bounds.lower(),
            buffer: DEFAULT_BUFFER.to_string(),
            timeout: TimerSlot::default(),
            reset: TimerSlot::default(),
        }
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn bounds(&self) -> FieldBounds {
        self.bounds
    }

    pub fn committed_value(&self) -> u32 {
        self.committed
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn input_timeout_active(&self) -> bool {
        self.timeout.is_armed()
    }

    pub fn reset_deadline(&self) -> Option<Instant> {
        self.reset.deadline()
    }

    pub fn timeout_deadline(&self) -> Option<Instant> {
        self.timeout.deadline()
    }

    pub fn state(&self) -> EntryState {
        if self.timeout.is_armed() {
            EntryState::TimedOut
        } else if self.reset.is_armed() {
            EntryState::Accumulating
        } else {
            EntryState::Idle
        }
    }

    pub fn display(&self) -> String {
        format!("{:02}", self.committed)
    }

    pub fn view(&self, focused: bool) -> FieldView {
        FieldView {
            kind: self.kind,
            text: self.display(),
            focused,
        }
    }

    pub fn receive_digit(&mut self, digit: char, now: Instant) -> Result<Keystroke, FieldError> {
        if !digit.is_ascii_digit() {
            return Err(FieldError::NotADigit(digit));
        }
        if self.timeout.is_armed() {
            trace!("{} field suppressed '{digit}' during timeout", self.kind);
            return Ok(Keystroke {
                outcome: DigitOutcome::Suppressed,
                armed: None,
            });
        }

        let mut candidate = self.buffer.clone();
        candidate.push(digit);
        let value = match candidate.parse::<u32>() {
            Ok(value) if self.bounds.contains(value) => value,
            _ => {
                debug!("{} field rejected candidate {candidate}", self.kind);
                let token = self.enter_timeout_period(now);
                return Ok(Keystroke {
                    outcome: DigitOutcome::Rejected,
                    armed: Some(token),
                });
            }
        };

        self.committed = value;
        let armed = if value == 0 {
            self.buffer = DEFAULT_BUFFER.to_string();
            self.reset.cancel();
            None
        } else {
            let start = candidate.len().saturating_sub(2);
            self.buffer = candidate[start..].to_string();
            if value >= 10 {
                Some(self.enter_timeout_period(now))
            } else {
                Some(self.enter_reset_countdown(now))
            }
        };
        debug!(
            "{} field committed {value} (buffer {})",
            self.kind, self.buffer
        );

        Ok(Keystroke {
            outcome: DigitOutcome::Committed(value),
            armed,
        })
    }

    pub fn increment(&mut self) -> Result<StepOutcome, FieldError> {
        self.step(1)
    }

    pub fn decrement(&mut self) -> Result<StepOutcome, FieldError> {
        self.step(-1)
    }

    pub fn fire(&mut self, token: &TimerToken) -> bool {
        let slot = match token.kind {
            TimerKind::Timeout => &mut self.timeout,
            TimerKind::Reset => &mut self.reset,
        };
        if !slot.claim(token) {
            trace!(
                "{} field dropped stale {:?} timer (generation {})",
                self.kind, token.kind, token.generation
            );
            return false;
        }
        self.buffer = DEFAULT_BUFFER.to_string();
        debug!("{} field {:?} timer expired", self.kind, token.kind);
        true
    }

    pub fn reset(&mut self) {
        self.timeout.cancel();
        self.reset.cancel();
        self.buffer = DEFAULT_BUFFER.to_string();
    }

    pub fn adopt(&mut self, value: u32) {
        if !self.bounds.contains(value) {
            debug!("{} field ignored out-of-bounds value {value}", self.kind);
            return;
        }
        self.reset();
        self.committed = value;
    }

    fn step(&mut self, delta: i64) -> Result<StepOutcome, FieldError> {
        if self.buffer.parse::<u32>().is_err() {
            let buffer = std::mem::replace(&mut self.buffer, DEFAULT_BUFFER.to_string());
            self.timeout.cancel();
            self.reset.cancel();
            warn!("{} field healed corrupt buffer '{buffer}'", self.kind);
            return Err(FieldError::CorruptBuffer {
                kind: self.kind,
                buffer,
            });
        }

        let Ok(target) = u32::try_from(i64::from(self.committed) + delta) else {
            return Ok(StepOutcome::Ignored);
        };
        if !self.bounds.contains(target) {
            return Ok(StepOutcome::Ignored);
        }

        self.committed = target;
        self.buffer = format!("{target:02}");
        debug!("{} field stepped to {target}", self.kind);
        Ok(StepOutcome::Committed(target))
    }

    fn enter_timeout_period(&mut self, now: Instant) -> TimerToken {
        self.reset.cancel();
        self.timeout
            .arm(TimerKind::Timeout, now, self.timing.timeout)
    }

    fn enter_reset_countdown(&mut self, now: Instant) -> TimerToken {
        self.reset.arm(TimerKind::Reset, now, self.timing.reset)
    }
}
