use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local};
use eframe::egui::{self, Color32, Key, RichText, Sense, TopBottomPanel};
use log::warn;

use crate::clock::{Clock, SystemClock};
use crate::config::ControlConfig;
use crate::field::FieldKind;
use crate::group::{EventOutcome, TimeFieldGroup, separator_before};
use crate::input::{InputEvent, MoveCommand};

const IDLE_REPAINT: Duration = Duration::from_millis(250);
const FIELD_TEXT: Color32 = Color32::from_rgb(226, 234, 246);
const FOCUS_FILL: Color32 = Color32::from_rgb(236, 146, 48);
const MUTED: Color32 = Color32::from_rgb(161, 180, 201);
const ACCENT: Color32 = Color32::from_rgb(104, 221, 205);

pub fn run_gui(config: ControlConfig, baseline: Option<DateTime<Local>>) -> Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("TimeField")
            .with_inner_size([560.0, 300.0])
            .with_min_inner_size([420.0, 240.0]),
        ..Default::default()
    };

    let app = TimeFieldApp::new(&config, baseline)?;

    eframe::run_native(
        "TimeField",
        native_options,
        Box::new(move |cc| {
            configure_theme(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow::anyhow!("failed to launch TimeField GUI: {err}"))?;

    Ok(())
}

fn configure_theme(ctx: &egui::Context) {
    let mut visuals = egui::Visuals::dark();
    visuals.override_text_color = Some(FIELD_TEXT);
    visuals.panel_fill = Color32::from_rgb(8, 16, 26);
    visuals.window_fill = Color32::from_rgb(12, 20, 32);
    visuals.widgets.inactive.bg_fill = Color32::from_rgb(16, 24, 38);
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(26, 42, 62);
    visuals.widgets.active.bg_fill = Color32::from_rgb(34, 60, 88);
    visuals.selection.bg_fill = Color32::from_rgb(43, 148, 178);
    ctx.set_visuals(visuals);
}

struct TimeFieldApp {
    clock: SystemClock,
    group: TimeFieldGroup,
    status_message: Option<(String, Instant)>,
}

impl TimeFieldApp {
    fn new(config: &ControlConfig, baseline: Option<DateTime<Local>>) -> Result<Self> {
        let clock = SystemClock;
        let mut group = TimeFieldGroup::new(config, baseline.unwrap_or_else(|| clock.wall()))?;
        group.focus_first();
        Ok(Self {
            clock,
            group,
            status_message: None,
        })
    }

    fn set_status(&mut self, text: impl Into<String>, ttl: Duration) {
        self.status_message = Some((text.into(), Instant::now() + ttl));
    }

    fn apply(&mut self, event: InputEvent, now: Instant) {
        match self.group.handle(event, now) {
            Ok(EventOutcome::Rejected) => {
                self.set_status("Out of range, input paused", Duration::from_secs(1));
            }
            Ok(_) => {}
            Err(err) => {
                warn!("input {event:?} failed: {err}");
                self.set_status(format!("{err}"), Duration::from_secs(2));
            }
        }
    }

    fn show_fields(&mut self, ui: &mut egui::Ui) {
        let mut clicked: Option<FieldKind> = None;
        ui.horizontal(|ui| {
            for (index, view) in self.group.views().into_iter().enumerate() {
                if index > 0 {
                    ui.label(
                        RichText::new(separator_before(view.kind))
                            .size(44.0)
                            .monospace()
                            .color(MUTED),
                    );
                }
                let fill = if view.focused {
                    FOCUS_FILL
                } else {
                    Color32::TRANSPARENT
                };
                let response = ui.add(
                    egui::Label::new(
                        RichText::new(&view.text)
                            .size(52.0)
                            .monospace()
                            .strong()
                            .background_color(fill),
                    )
                    .sense(Sense::click()),
                );
                if response.clicked() {
                    clicked = Some(view.kind);
                }
            }
        });

        if let Some(kind) = clicked {
            let now = self.clock.now();
            self.apply(InputEvent::Focus(kind), now);
        }
    }

    fn show_steppers(&mut self, ui: &mut egui::Ui) {
        let mut requested = None;
        ui.horizontal(|ui| {
            if ui.button("Increment").clicked() {
                requested = Some(InputEvent::Increment);
            }
            if ui.button("Decrement").clicked() {
                requested = Some(InputEvent::Decrement);
            }
            if ui.button("Reset entry").clicked() {
                requested = Some(InputEvent::Reset);
            }
        });
        if let Some(event) = requested {
            let now = self.clock.now();
            self.apply(event, now);
        }
    }

    fn show_summary(&self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new(format!(
                "Composite {}",
                self.group.composite().format("%Y-%m-%d %H:%M:%S")
            ))
            .color(ACCENT)
            .strong(),
        );
        if let Some(interval) = self.group.interval() {
            ui.label(
                RichText::new(format!("Interval {} s", interval.num_seconds())).color(MUTED),
            );
        }
    }
}

impl eframe::App for TimeFieldApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some((_, expires_at)) = &self.status_message
            && Instant::now() >= *expires_at
        {
            self.status_message = None;
        }

        let now = self.clock.now();
        self.group.tick(now);
        for event in ctx.input(collect_events) {
            self.apply(event, now);
        }

        TopBottomPanel::bottom("footer")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal_wrapped(|ui| {
                    ui.label(
                        RichText::new(
                            "Digits type | Left/Right move focus | Up/Down step | Esc blurs | Backspace resets",
                        )
                        .color(MUTED),
                    );
                    if let Some((text, _)) = &self.status_message {
                        ui.separator();
                        ui.label(RichText::new(text).color(FOCUS_FILL));
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(12.0);
            self.show_fields(ui);
            ui.add_space(8.0);
            self.show_steppers(ui);
            ui.separator();
            self.show_summary(ui);
        });

        let wait = self
            .group
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(IDLE_REPAINT)
            .min(IDLE_REPAINT);
        ctx.request_repaint_after(wait);
    }
}

fn collect_events(input: &egui::InputState) -> Vec<InputEvent> {
    let mut events = Vec::new();
    for event in &input.events {
        match event {
            egui::Event::Text(text) => {
                events.extend(
                    text.chars()
                        .filter(char::is_ascii_digit)
                        .map(InputEvent::Digit),
                );
            }
            egui::Event::Key {
                key, pressed: true, ..
            } => {
                let mapped = match key {
                    Key::ArrowLeft => Some(InputEvent::Move(MoveCommand::Left)),
                    Key::ArrowRight => Some(InputEvent::Move(MoveCommand::Right)),
                    Key::ArrowUp => Some(InputEvent::Move(MoveCommand::Up)),
                    Key::ArrowDown => Some(InputEvent::Move(MoveCommand::Down)),
                    Key::Escape => Some(InputEvent::Blur),
                    Key::Backspace | Key::Delete => Some(InputEvent::Reset),
                    _ => None,
                };
                events.extend(mapped);
            }
            _ => {}
        }
    }
    events
}
