use crate::field::FieldKind;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MoveCommand {
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FocusDirection {
    Previous,
    Next,
}

impl MoveCommand {
    pub fn focus_direction(self) -> Option<FocusDirection> {
        match self {
            MoveCommand::Left => Some(FocusDirection::Previous),
            MoveCommand::Right => Some(FocusDirection::Next),
            MoveCommand::Up | MoveCommand::Down => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputEvent {
    Digit(char),
    Move(MoveCommand),
    Increment,
    Decrement,
    Focus(FieldKind),
    Blur,
    Reset,
}
