use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::compose::CompositionMode;
use crate::field::{FieldBounds, FieldKind, FieldTiming};

#[derive(Debug, Clone)]
pub struct ControlConfig {
    pub fields: Vec<FieldKind>,
    pub bounds: BTreeMap<FieldKind, FieldBounds>,
    pub timing: FieldTiming,
    pub composition: CompositionMode,
    pub track_interval: bool,
}

impl ControlConfig {
    pub fn bounds_for(&self, kind: FieldKind) -> FieldBounds {
        self.bounds.get(&kind).copied().unwrap_or_default()
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            fields: FieldKind::ALL.to_vec(),
            bounds: BTreeMap::new(),
            timing: FieldTiming::default(),
            composition: CompositionMode::default(),
            track_interval: true,
        }
    }
}

pub fn load_control_config(path: &Path) -> Result<ControlConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file {}", path.display()))?;
    parse_control_config_text(&content)
}

pub fn parse_control_config_text(content: &str) -> Result<ControlConfig> {
    let raw = serde_json::from_str::<ControlConfigFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow::anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    if raw.version != 1 {
        bail!(
            "unsupported config version {}; expected version 1",
            raw.version
        );
    }
    if raw.fields.is_empty() {
        bail!("config must list at least one field");
    }
    if raw.timeout_ms == 0 {
        bail!("timeout_ms must be > 0");
    }
    if raw.reset_ms == 0 {
        bail!("reset_ms must be > 0");
    }

    let mut bounds = BTreeMap::new();
    for (kind, range) in raw.bounds {
        let parsed = FieldBounds::new(range.lower, range.upper)
            .with_context(|| format!("invalid bounds for {kind} field"))?;
        bounds.insert(kind, parsed);
    }

    Ok(ControlConfig {
        fields: raw.fields,
        bounds,
        timing: FieldTiming {
            timeout: Duration::from_millis(raw.timeout_ms),
            reset: Duration::from_millis(raw.reset_ms),
        },
        composition: raw.composition,
        track_interval: raw.track_interval,
    })
}

#[derive(Debug, Deserialize)]
struct ControlConfigFile {
    version: u32,
    #[serde(default = "default_fields")]
    fields: Vec<FieldKind>,
    #[serde(default)]
    bounds: BTreeMap<FieldKind, BoundsFile>,
    #[serde(default = "default_period_ms")]
    timeout_ms: u64,
    #[serde(default = "default_period_ms")]
    reset_ms: u64,
    #[serde(default)]
    composition: CompositionMode,
    #[serde(default = "default_track_interval")]
    track_interval: bool,
}

#[derive(Debug, Deserialize)]
struct BoundsFile {
    #[serde(default)]
    lower: u32,
    upper: u32,
}

fn default_fields() -> Vec<FieldKind> {
    FieldKind::ALL.to_vec()
}

fn default_period_ms() -> u64 {
    1_000
}

fn default_track_interval() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let json = r#"
{
  "version": 1,
  "fields": ["minute", "second"],
  "bounds": {
    "minute": { "lower": 0, "upper": 59 },
    "second": { "upper": 59 }
  },
  "timeout_ms": 750,
  "reset_ms": 1500,
  "composition": "overlay",
  "track_interval": false
}
"#;
        let config = parse_control_config_text(json).expect("valid config");
        assert_eq!(config.fields, vec![FieldKind::Minute, FieldKind::Second]);
        assert_eq!(config.bounds_for(FieldKind::Minute).upper(), 59);
        assert_eq!(config.bounds_for(FieldKind::Second).lower(), 0);
        assert_eq!(config.bounds_for(FieldKind::Hour), FieldBounds::default());
        assert_eq!(config.timing.timeout, Duration::from_millis(750));
        assert_eq!(config.timing.reset, Duration::from_millis(1_500));
        assert_eq!(config.composition, CompositionMode::Overlay);
        assert!(!config.track_interval);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config = parse_control_config_text(r#"{ "version": 1 }"#).expect("valid config");
        assert_eq!(config.fields, FieldKind::ALL.to_vec());
        assert_eq!(config.timing, FieldTiming::default());
        assert_eq!(config.composition, CompositionMode::Offset);
        assert!(config.track_interval);
    }

    #[test]
    fn duplicate_fields_are_allowed() {
        let config = parse_control_config_text(r#"{ "version": 1, "fields": ["hour", "hour"] }"#)
            .expect("valid config");
        assert_eq!(config.fields.len(), 2);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = parse_control_config_text(r#"{ "version": 2 }"#).expect_err("version 2");
        assert!(err.to_string().contains("unsupported config version"));
    }

    #[test]
    fn rejects_empty_field_list() {
        let err = parse_control_config_text(r#"{ "version": 1, "fields": [] }"#)
            .expect_err("empty fields");
        assert!(err.to_string().contains("at least one field"));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let json = r#"{ "version": 1, "bounds": { "hour": { "lower": 12, "upper": 1 } } }"#;
        let err = parse_control_config_text(json).expect_err("inverted bounds");
        assert!(format!("{err:#}").contains("invalid bounds for hour field"));
    }

    #[test]
    fn rejects_unknown_kind_as_invalid_json() {
        let err = parse_control_config_text(r#"{ "version": 1, "fields": ["day"] }"#)
            .expect_err("unknown kind");
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn rejects_zero_timer_period() {
        let err = parse_control_config_text(r#"{ "version": 1, "reset_ms": 0 }"#)
            .expect_err("zero reset");
        assert!(err.to_string().contains("reset_ms"));
    }
}
