pub mod digit;
pub mod kind;
pub mod timer;

pub use digit::{
    DEFAULT_BUFFER, DigitField, DigitOutcome, EntryState, FieldError, FieldTiming, FieldView,
    Keystroke, StepOutcome,
};
pub use kind::{BoundsError, FieldBounds, FieldKind, UnknownFieldKind};
pub use timer::{TimerKind, TimerQueue, TimerSlot, TimerToken};
