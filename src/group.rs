use std::time::Instant;

use chrono::{DateTime, Local};
use log::{debug, warn};
use thiserror::Error;

use crate::compose::{CalendarComposer, ComposeError, FieldValues};
use crate::config::ControlConfig;
use crate::field::{
    DigitField, DigitOutcome, FieldError, FieldKind, FieldView, StepOutcome, TimerQueue,
};
use crate::input::{FocusDirection, InputEvent, MoveCommand};

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("a time field group needs at least one field")]
    Empty,
    #[error("{0} field is not displayed")]
    NotDisplayed(FieldKind),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum EventOutcome {
    Committed { kind: FieldKind, value: u32 },
    Suppressed,
    Rejected,
    Ignored,
    FocusChanged(Option<FieldKind>),
    Reset(FieldKind),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct CompositeUpdate {
    pub composite: DateTime<Local>,
    pub interval: Option<chrono::Duration>,
}

type Listener = Box<dyn FnMut(&CompositeUpdate)>;

pub struct TimeFieldGroup {
    fields: Vec<DigitField>,
    focused: Option<FieldKind>,
    aggregate: FieldValues,
    baseline: DateTime<Local>,
    composite: DateTime<Local>,
    track_interval: bool,
    composer: Box<dyn CalendarComposer>,
    timers: TimerQueue,
    listeners: Vec<Listener>,
}

impl TimeFieldGroup {
    pub fn new(config: &ControlConfig, baseline: DateTime<Local>) -> Result<Self, GroupError> {
        Self::with_composer(config, baseline, config.composition.composer())
    }

    pub fn with_composer(
        config: &ControlConfig,
        baseline: DateTime<Local>,
        composer: Box<dyn CalendarComposer>,
    ) -> Result<Self, GroupError> {
        if config.fields.is_empty() {
            return Err(GroupError::Empty);
        }

        let fields = config
            .fields
            .iter()
            .map(|kind| DigitField::new(*kind, config.bounds_for(*kind), config.timing))
            .collect::<Vec<_>>();
        let aggregate = fields
            .iter()
            .map(|field| (field.kind(), field.committed_value()))
            .collect::<FieldValues>();
        let composite = composer.compose(&baseline, &aggregate)?;

        Ok(Self {
            fields,
            focused: None,
            aggregate,
            baseline,
            composite,
            track_interval: config.track_interval,
            composer,
            timers: TimerQueue::new(),
            listeners: Vec::new(),
        })
    }

    pub fn ordered_fields(&self) -> Vec<FieldKind> {
        self.fields.iter().map(DigitField::kind).collect()
    }

    pub fn field(&self, kind: FieldKind) -> Option<&DigitField> {
        self.fields.iter().find(|field| field.kind() == kind)
    }

    pub fn displays(&self, kind: FieldKind) -> bool {
        self.index_of(kind).is_some()
    }

    pub fn focused(&self) -> Option<FieldKind> {
        self.focused
    }

    pub fn values(&self) -> &FieldValues {
        &self.aggregate
    }

    pub fn baseline(&self) -> DateTime<Local> {
        self.baseline
    }

    pub fn composite(&self) -> DateTime<Local> {
        self.composite
    }

    pub fn interval(&self) -> Option<chrono::Duration> {
        self.track_interval
            .then(|| self.composite - self.baseline)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&CompositeUpdate) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn set_baseline(&mut self, baseline: DateTime<Local>) {
        self.baseline = baseline;
        self.recompose();
    }

    pub fn focus(&mut self, kind: FieldKind) -> Result<(), GroupError> {
        if !self.displays(kind) {
            return Err(GroupError::NotDisplayed(kind));
        }
        self.set_focus(Some(kind));
        Ok(())
    }

    pub fn focus_first(&mut self) {
        let first = self.fields.first().map(DigitField::kind);
        self.set_focus(first);
    }

    pub fn blur(&mut self) {
        self.set_focus(None);
    }

    pub fn move_focus(&mut self, direction: FocusDirection) -> Option<FieldKind> {
        let current = self.focused?;
        let mut candidate = current;
        for _ in 0..FieldKind::ALL.len() {
            candidate = match direction {
                FocusDirection::Next => candidate.next(),
                FocusDirection::Previous => candidate.previous(),
            };
            if self.displays(candidate) {
                break;
            }
        }
        debug!("focus {current} -> {candidate}");
        self.set_focus(Some(candidate));
        Some(candidate)
    }

    pub fn handle(&mut self, event: InputEvent, now: Instant) -> Result<EventOutcome, GroupError> {
        match event {
            InputEvent::Digit(digit) => self.receive_digit(digit, now),
            InputEvent::Move(command) => Ok(self.handle_move(command)),
            InputEvent::Increment => Ok(self.step(true)),
            InputEvent::Decrement => Ok(self.step(false)),
            InputEvent::Focus(kind) => {
                self.focus(kind)?;
                Ok(EventOutcome::FocusChanged(Some(kind)))
            }
            InputEvent::Blur => {
                self.blur();
                Ok(EventOutcome::FocusChanged(None))
            }
            InputEvent::Reset => Ok(self.reset_focused()),
        }
    }

    pub fn handle_move(&mut self, command: MoveCommand) -> EventOutcome {
        match command.focus_direction() {
            Some(direction) => match self.move_focus(direction) {
                Some(kind) => EventOutcome::FocusChanged(Some(kind)),
                None => EventOutcome::Ignored,
            },
            None => self.step(command == MoveCommand::Up),
        }
    }

    pub fn receive_digit(&mut self, digit: char, now: Instant) -> Result<EventOutcome, GroupError> {
        let Some(index) = self.focused_index() else {
            return Ok(EventOutcome::Ignored);
        };
        let stroke = self.fields[index].receive_digit(digit, now)?;
        if let Some(token) = stroke.armed {
            self.timers.schedule(index, token);
        }

        let outcome = match stroke.outcome {
            DigitOutcome::Committed(value) => {
                let kind = self.fields[index].kind();
                self.on_field_committed(kind, value);
                EventOutcome::Committed { kind, value }
            }
            DigitOutcome::Suppressed => EventOutcome::Suppressed,
            DigitOutcome::Rejected => EventOutcome::Rejected,
        };
        Ok(outcome)
    }

    pub fn increment(&mut self) -> EventOutcome {
        self.step(true)
    }

    pub fn decrement(&mut self) -> EventOutcome {
        self.step(false)
    }

    pub fn on_field_committed(&mut self, kind: FieldKind, value: u32) {
        // fields sharing a kind all render the aggregate value
        for field in self
            .fields
            .iter_mut()
            .filter(|field| field.kind() == kind && field.committed_value() != value)
        {
            field.adopt(value);
        }
        self.aggregate.set(kind, value);
        self.recompose();
    }

    pub fn tick(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        while let Some((owner, token)) = self.timers.pop_due(now) {
            if let Some(field) = self.fields.get_mut(owner)
                && field.fire(&token)
            {
                fired += 1;
            }
        }
        fired
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    pub fn separators(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .skip(1)
            .map(|field| separator_before(field.kind()))
            .collect()
    }

    pub fn views(&self) -> Vec<FieldView> {
        let focused_index = self.focused_index();
        self.fields
            .iter()
            .enumerate()
            .map(|(index, field)| field.view(Some(index) == focused_index))
            .collect()
    }

    pub fn display_line(&self) -> String {
        let mut line = String::new();
        for (index, field) in self.fields.iter().enumerate() {
            if index > 0 {
                line.push_str(separator_before(field.kind()));
            }
            line.push_str(&field.display());
        }
        line
    }

    fn step(&mut self, up: bool) -> EventOutcome {
        let Some(index) = self.focused_index() else {
            return EventOutcome::Ignored;
        };
        let field = &mut self.fields[index];
        let kind = field.kind();
        let result = if up {
            field.increment()
        } else {
            field.decrement()
        };
        match result {
            Ok(StepOutcome::Committed(value)) => {
                self.on_field_committed(kind, value);
                EventOutcome::Committed { kind, value }
            }
            Ok(StepOutcome::Ignored) => EventOutcome::Ignored,
            Err(err) => {
                warn!("step ignored: {err}");
                EventOutcome::Ignored
            }
        }
    }

    fn reset_focused(&mut self) -> EventOutcome {
        match self.focused_index() {
            Some(index) => {
                self.fields[index].reset();
                EventOutcome::Reset(self.fields[index].kind())
            }
            None => EventOutcome::Ignored,
        }
    }

    fn set_focus(&mut self, target: Option<FieldKind>) {
        if self.focused == target {
            return;
        }
        if let Some(index) = self.focused_index() {
            self.fields[index].reset();
        }
        self.focused = target;
    }

    fn focused_index(&self) -> Option<usize> {
        self.focused.and_then(|kind| self.index_of(kind))
    }

    fn index_of(&self, kind: FieldKind) -> Option<usize> {
        self.fields.iter().position(|field| field.kind() == kind)
    }

    fn recompose(&mut self) {
        match self.composer.compose(&self.baseline, &self.aggregate) {
            Ok(composite) => self.composite = composite,
            Err(err) => {
                warn!("keeping previous composite: {err}");
                return;
            }
        }
        let update = CompositeUpdate {
            composite: self.composite,
            interval: self.interval(),
        };
        debug!("composite now {}", update.composite);
        for listener in &mut self.listeners {
            listener(&update);
        }
    }
}

pub fn separator_before(kind: FieldKind) -> &'static str {
    if kind == FieldKind::Second { "." } else { ":" }
}
