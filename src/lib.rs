pub mod clock;
pub mod compose;
pub mod config;
pub mod field;
pub mod group;
pub mod input;
pub mod logging;
pub mod replay;
pub mod ui;

pub use compose::{CalendarComposer, CompositionMode, FieldValues};
pub use config::ControlConfig;
pub use field::{DigitField, FieldBounds, FieldKind};
pub use group::{EventOutcome, TimeFieldGroup};
pub use input::{FocusDirection, InputEvent, MoveCommand};
