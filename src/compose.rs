use std::collections::BTreeMap;

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::FieldKind;

#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ComposeError {
    #[error("{value} is not a valid {kind} component")]
    ComponentOutOfRange { kind: FieldKind, value: u32 },
    #[error("local time {0} does not exist in this timezone")]
    Nonexistent(NaiveDateTime),
    #[error("composed instant is out of the representable range")]
    Overflow,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct FieldValues(BTreeMap<FieldKind, u32>);

impl FieldValues {
    pub fn set(&mut self, kind: FieldKind, value: u32) {
        self.0.insert(kind, value);
    }

    pub fn get(&self, kind: FieldKind) -> Option<u32> {
        self.0.get(&kind).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKind, u32)> + '_ {
        self.0.iter().map(|(kind, value)| (*kind, *value))
    }
}

impl FromIterator<(FieldKind, u32)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (FieldKind, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub trait CalendarComposer {
    fn compose(
        &self,
        baseline: &DateTime<Local>,
        values: &FieldValues,
    ) -> Result<DateTime<Local>, ComposeError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetComposer;

impl CalendarComposer for OffsetComposer {
    fn compose(
        &self,
        baseline: &DateTime<Local>,
        values: &FieldValues,
    ) -> Result<DateTime<Local>, ComposeError> {
        offset_from(baseline, values)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayComposer;

impl CalendarComposer for OverlayComposer {
    fn compose(
        &self,
        baseline: &DateTime<Local>,
        values: &FieldValues,
    ) -> Result<DateTime<Local>, ComposeError> {
        overlay_in_tz(baseline, values, &Local)
    }
}

/// `Offset` adds the field values to the baseline as a duration, so 60 minutes
/// is one hour later. `Overlay` replaces the baseline's hour/minute/second
/// with the field values.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionMode {
    #[default]
    Offset,
    Overlay,
}

impl CompositionMode {
    pub fn composer(self) -> Box<dyn CalendarComposer> {
        match self {
            CompositionMode::Offset => Box::new(OffsetComposer),
            CompositionMode::Overlay => Box::new(OverlayComposer),
        }
    }
}

pub(crate) fn offset_from<Tz: TimeZone>(
    baseline: &DateTime<Tz>,
    values: &FieldValues,
) -> Result<DateTime<Tz>, ComposeError> {
    let seconds = values
        .iter()
        .map(|(kind, value)| i64::from(value) * kind.seconds_per_unit())
        .sum::<i64>();
    let offset = chrono::Duration::try_seconds(seconds).ok_or(ComposeError::Overflow)?;
    baseline
        .clone()
        .checked_add_signed(offset)
        .ok_or(ComposeError::Overflow)
}

pub(crate) fn overlay_in_tz<Tz>(
    baseline: &DateTime<Tz>,
    values: &FieldValues,
    timezone: &Tz,
) -> Result<DateTime<Tz>, ComposeError>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    let naive = baseline.naive_local();
    let mut time = naive.time();
    for (kind, value) in values.iter() {
        let replaced = match kind {
            FieldKind::Hour => time.with_hour(value),
            FieldKind::Minute => time.with_minute(value),
            FieldKind::Second => time.with_second(value),
        };
        time = replaced.ok_or(ComposeError::ComponentOutOfRange { kind, value })?;
    }

    let target = naive.date().and_time(time);
    match timezone.from_local_datetime(&target) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(first, _second) => Ok(first),
        LocalResult::None => Err(ComposeError::Nonexistent(target)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, TimeZone};
    use chrono_tz::America::New_York;

    use super::*;

    fn values(hour: u32, minute: u32, second: u32) -> FieldValues {
        [
            (FieldKind::Hour, hour),
            (FieldKind::Minute, minute),
            (FieldKind::Second, second),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn offset_adds_components_to_midnight() {
        let midnight = Local
            .with_ymd_and_hms(2026, 1, 15, 0, 0, 0)
            .single()
            .expect("valid midnight");
        let composite = OffsetComposer
            .compose(&midnight, &values(1, 30, 0))
            .expect("compose");
        assert_eq!((composite - midnight).num_seconds(), 5_400);
    }

    #[test]
    fn modes_differ_on_a_non_midnight_baseline() {
        let morning = Local
            .with_ymd_and_hms(2026, 1, 15, 9, 15, 0)
            .single()
            .expect("valid morning");
        let fields = values(1, 30, 0);

        assert_eq!(CompositionMode::default(), CompositionMode::Offset);
        let added = CompositionMode::Offset
            .composer()
            .compose(&morning, &fields)
            .expect("offset");
        assert_eq!((added - morning).num_seconds(), 5_400);

        let replaced = CompositionMode::Overlay
            .composer()
            .compose(&morning, &fields)
            .expect("overlay");
        assert_eq!(replaced.time(), NaiveTime::from_hms_opt(1, 30, 0).expect("time"));
        assert_eq!(replaced.date_naive(), morning.date_naive());
    }

    #[test]
    fn offset_accepts_sixty_minutes() {
        let midnight = New_York
            .with_ymd_and_hms(2026, 1, 15, 0, 0, 0)
            .single()
            .expect("valid");
        let composite = offset_from(&midnight, &values(0, 60, 0)).expect("compose");
        assert_eq!(composite.time(), NaiveTime::from_hms_opt(1, 0, 0).expect("time"));
    }

    #[test]
    fn missing_kinds_do_not_affect_offset() {
        let midnight = New_York
            .with_ymd_and_hms(2026, 1, 15, 0, 0, 0)
            .single()
            .expect("valid");
        let only_minutes: FieldValues = [(FieldKind::Minute, 5)].into_iter().collect();
        let composite = offset_from(&midnight, &only_minutes).expect("compose");
        assert_eq!((composite - midnight).num_seconds(), 300);
    }

    #[test]
    fn overlay_replaces_wall_clock_components() {
        let baseline = New_York
            .with_ymd_and_hms(2026, 6, 1, 17, 45, 12)
            .single()
            .expect("valid");
        let only_hour: FieldValues = [(FieldKind::Hour, 9)].into_iter().collect();
        let composite = overlay_in_tz(&baseline, &only_hour, &New_York).expect("compose");
        assert_eq!(
            composite.naive_local(),
            NaiveDate::from_ymd_opt(2026, 6, 1)
                .expect("date")
                .and_hms_opt(9, 45, 12)
                .expect("time")
        );
    }

    #[test]
    fn overlay_rejects_out_of_range_components() {
        let baseline = New_York
            .with_ymd_and_hms(2026, 6, 1, 0, 0, 0)
            .single()
            .expect("valid");
        let err = overlay_in_tz(&baseline, &values(0, 60, 0), &New_York).expect_err("minute 60");
        assert_eq!(
            err,
            ComposeError::ComponentOutOfRange {
                kind: FieldKind::Minute,
                value: 60
            }
        );
    }

    #[test]
    fn overlay_reports_spring_forward_gap() {
        let baseline = New_York
            .with_ymd_and_hms(2026, 3, 8, 0, 0, 0)
            .single()
            .expect("valid");
        let err = overlay_in_tz(&baseline, &values(2, 30, 0), &New_York).expect_err("gap");
        assert!(matches!(err, ComposeError::Nonexistent(_)));
    }

    #[test]
    fn overlay_chooses_first_ambiguous_instance() {
        let baseline = New_York
            .with_ymd_and_hms(2026, 11, 1, 0, 0, 0)
            .single()
            .expect("valid");
        let target = NaiveDate::from_ymd_opt(2026, 11, 1)
            .expect("date")
            .and_hms_opt(1, 30, 0)
            .expect("time");
        let expected = match New_York.from_local_datetime(&target) {
            LocalResult::Ambiguous(first, _second) => first,
            _ => panic!("expected ambiguous local time"),
        };
        let actual = overlay_in_tz(&baseline, &values(1, 30, 0), &New_York).expect("compose");
        assert_eq!(actual, expected);
    }
}
