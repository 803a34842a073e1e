use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::clock::{Clock, ManualClock};
use crate::compose::FieldValues;
use crate::field::{FieldKind, FieldView};
use crate::group::{EventOutcome, TimeFieldGroup};
use crate::input::{InputEvent, MoveCommand};

const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ScriptStep {
    Input(InputEvent),
    Wait(Duration),
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub display: String,
    pub focused: Option<FieldKind>,
    pub values: FieldValues,
    pub fields: Vec<FieldView>,
    pub baseline: String,
    pub composite: String,
    pub interval_seconds: Option<i64>,
    pub events: usize,
    pub committed: usize,
    pub rejected: usize,
    pub suppressed: usize,
    pub timers_fired: usize,
}

pub fn parse_script(script: &str) -> Result<Vec<ScriptStep>> {
    let mut steps = Vec::new();
    let tokens = script
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty());
    for token in tokens {
        let lowered = token.to_ascii_lowercase();
        if lowered.chars().all(|c| c.is_ascii_digit()) {
            steps.extend(
                lowered
                    .chars()
                    .map(|digit| ScriptStep::Input(InputEvent::Digit(digit))),
            );
            continue;
        }
        if let Some(kind) = lowered.strip_prefix("focus:") {
            let kind = kind
                .parse::<FieldKind>()
                .with_context(|| format!("invalid replay token '{token}'"))?;
            steps.push(ScriptStep::Input(InputEvent::Focus(kind)));
            continue;
        }
        if let Some(raw) = lowered.strip_prefix("wait:") {
            let wait = parse_wait_token(raw)
                .with_context(|| format!("invalid replay token '{token}'"))?;
            steps.push(ScriptStep::Wait(wait));
            continue;
        }

        let event = match lowered.as_str() {
            "left" => InputEvent::Move(MoveCommand::Left),
            "right" => InputEvent::Move(MoveCommand::Right),
            "up" => InputEvent::Move(MoveCommand::Up),
            "down" => InputEvent::Move(MoveCommand::Down),
            "inc" | "increment" => InputEvent::Increment,
            "dec" | "decrement" => InputEvent::Decrement,
            "blur" => InputEvent::Blur,
            "reset" => InputEvent::Reset,
            _ => bail!("unknown replay token '{token}'"),
        };
        steps.push(ScriptStep::Input(event));
    }
    Ok(steps)
}

pub fn run_replay(
    group: &mut TimeFieldGroup,
    clock: &ManualClock,
    steps: &[ScriptStep],
) -> Result<ReplayReport> {
    group.focus_first();

    let mut events = 0;
    let mut committed = 0;
    let mut rejected = 0;
    let mut suppressed = 0;
    let mut timers_fired = 0;
    for (index, step) in steps.iter().enumerate() {
        match step {
            ScriptStep::Wait(wait) => {
                clock
                    .advance(*wait)
                    .with_context(|| format!("replay step {} (wait) failed", index + 1))?;
                timers_fired += group.tick(clock.now());
            }
            ScriptStep::Input(event) => {
                events += 1;
                let outcome = group
                    .handle(*event, clock.now())
                    .with_context(|| format!("replay step {} ({event:?}) failed", index + 1))?;
                match outcome {
                    EventOutcome::Committed { .. } => committed += 1,
                    EventOutcome::Rejected => rejected += 1,
                    EventOutcome::Suppressed => suppressed += 1,
                    _ => {}
                }
            }
        }
    }

    Ok(ReplayReport {
        display: group.display_line(),
        focused: group.focused(),
        values: group.values().clone(),
        fields: group.views(),
        baseline: group.baseline().to_rfc3339(),
        composite: group.composite().to_rfc3339(),
        interval_seconds: group.interval().map(|interval| interval.num_seconds()),
        events,
        committed,
        rejected,
        suppressed,
        timers_fired,
    })
}

pub fn print_report(report: &ReplayReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!("Display: {}", report.display);
    println!(
        "Focused: {}",
        report
            .focused
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    let values = report
        .values
        .iter()
        .map(|(kind, value)| format!("{kind}={value}"))
        .collect::<Vec<_>>()
        .join(" ");
    println!("Values: {values}");
    println!("Baseline: {}", report.baseline);
    println!("Composite: {}", report.composite);
    if let Some(seconds) = report.interval_seconds {
        println!("Interval (s): {seconds}");
    }
    println!(
        "Events: {} (committed {}, rejected {}, suppressed {})",
        report.events, report.committed, report.rejected, report.suppressed
    );
    println!("Timers fired: {}", report.timers_fired);
    Ok(())
}

pub fn parse_baseline(input: &str) -> Result<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S"))
        .map_err(|_| anyhow!("invalid baseline '{input}', expected ISO local datetime"))?;
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(first, _second) => Ok(first),
        LocalResult::None => bail!("baseline '{input}' does not exist in the local timezone"),
    }
}

fn parse_wait_token(token: &str) -> Result<Duration> {
    let duration = if let Some(raw) = token.strip_suffix("ms") {
        Duration::from_millis(raw.parse()?)
    } else if let Some(raw) = token.strip_suffix('s') {
        Duration::from_secs(raw.parse()?)
    } else {
        Duration::from_secs(token.parse()?)
    };
    if duration.is_zero() {
        bail!("duration must be > 0");
    }
    if duration > MAX_WAIT {
        bail!("duration too large (max 24h)");
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControlConfig;

    fn midnight() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 1, 15, 0, 0, 0)
            .single()
            .expect("valid midnight")
    }

    fn replay(script: &str) -> ReplayReport {
        let steps = parse_script(script).expect("script");
        let clock = ManualClock::new(midnight());
        let mut group =
            TimeFieldGroup::new(&ControlConfig::default(), midnight()).expect("group");
        run_replay(&mut group, &clock, &steps).expect("replay")
    }

    #[test]
    fn digit_runs_expand_to_keystrokes() {
        let steps = parse_script("13 right").expect("script");
        assert_eq!(
            steps,
            vec![
                ScriptStep::Input(InputEvent::Digit('1')),
                ScriptStep::Input(InputEvent::Digit('3')),
                ScriptStep::Input(InputEvent::Move(MoveCommand::Right)),
            ]
        );
    }

    #[test]
    fn parses_named_tokens() {
        let steps = parse_script("focus:second,wait:250ms inc dec blur reset wait:2")
            .expect("script");
        assert_eq!(
            steps,
            vec![
                ScriptStep::Input(InputEvent::Focus(FieldKind::Second)),
                ScriptStep::Wait(Duration::from_millis(250)),
                ScriptStep::Input(InputEvent::Increment),
                ScriptStep::Input(InputEvent::Decrement),
                ScriptStep::Input(InputEvent::Blur),
                ScriptStep::Input(InputEvent::Reset),
                ScriptStep::Wait(Duration::from_secs(2)),
            ]
        );
    }

    #[test]
    fn rejects_unknown_tokens() {
        let err = parse_script("1 jump").expect_err("unknown token");
        assert!(err.to_string().contains("unknown replay token 'jump'"));
        assert!(parse_script("wait:0ms").is_err());
        assert!(parse_script("focus:day").is_err());
    }

    #[test]
    fn replay_composes_hour_and_minutes() {
        let report = replay("1 right 30");
        assert_eq!(report.display, "01:30.00");
        assert_eq!(report.focused, Some(FieldKind::Minute));
        assert_eq!(report.interval_seconds, Some(5_400));
        assert_eq!(report.committed, 3);
    }

    #[test]
    fn replay_counts_rejections_and_suppression() {
        let report = replay("right 6 5 4 wait:1s 4");
        assert_eq!(report.rejected, 1);
        assert_eq!(report.suppressed, 1);
        assert_eq!(report.timers_fired, 1);
        assert_eq!(report.values.get(FieldKind::Minute), Some(4));
    }

    #[test]
    fn oversized_waits_are_errors() {
        let err = parse_script("1 wait:18446744073709551615s").expect_err("too large");
        assert!(format!("{err:#}").contains("duration too large"));
        assert!(parse_script("wait:86400s").is_ok());
        assert!(parse_script("wait:86401s").is_err());

        let clock = ManualClock::new(midnight());
        let mut group =
            TimeFieldGroup::new(&ControlConfig::default(), midnight()).expect("group");
        let steps = [
            ScriptStep::Input(InputEvent::Digit('1')),
            ScriptStep::Wait(Duration::MAX),
        ];
        let err = run_replay(&mut group, &clock, &steps).expect_err("clock overflow");
        assert!(format!("{err:#}").contains("replay step 2 (wait) failed"));
    }

    #[test]
    fn baseline_accepts_iso_and_space_variants() {
        assert!(parse_baseline("2026-02-07T07:30:00").is_ok());
        assert!(parse_baseline("2026-02-07 07:30:00").is_ok());
        assert!(parse_baseline("yesterday").is_err());
    }
}
