//! TOML-based game configuration.
//!
//! Stores tuning values including:
//! - Night length and clock pacing
//! - Knock and slam intervals, jump-scare delays
//! - Win policy and the RNG seed
//! - Audio levels and outcome texts
//!
//! Configuration is stored at `~/.config/nightwatch/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, ValidationError};
use crate::scheduler::{DoorTiming, IntervalRange};
use crate::services::VolumeMix;
use crate::session::WinPolicy;
use crate::timer::{secs_to_ms, NightClock};

/// Night clock pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_seconds_per_hour")]
    pub seconds_per_hour: f64,
    #[serde(default = "default_hours_per_night")]
    pub hours_per_night: u32,
    /// Wait after the last hour before the night counts as over.
    #[serde(default)]
    pub trailing_delay_secs: f64,
}

/// Door event timing, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoorsConfig {
    #[serde(default = "default_interval")]
    pub knock_interval: IntervalRange,
    #[serde(default = "default_interval")]
    pub slam_interval: IntervalRange,
    #[serde(default = "default_time_before_jumpscare")]
    pub time_before_jumpscare: f64,
    #[serde(default = "default_post_jumpscare_delay")]
    pub post_jumpscare_delay: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub win_policy: WinPolicy,
    #[serde(default = "default_win_transition_delay")]
    pub win_transition_delay_secs: f64,
    /// Fixed RNG seed. Unset means a fresh seed per session.
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_volume")]
    pub master_volume: u8,
    #[serde(default = "default_volume")]
    pub sfx_volume: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_win_text")]
    pub win_text: String,
    #[serde(default = "default_lose_text")]
    pub lose_text: String,
}

/// Game configuration.
///
/// Serialized to/from TOML at `~/.config/nightwatch/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub doors: DoorsConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

// Default functions
fn default_seconds_per_hour() -> f64 {
    90.0
}
fn default_hours_per_night() -> u32 {
    6
}
fn default_interval() -> IntervalRange {
    IntervalRange::DEFAULT
}
fn default_time_before_jumpscare() -> f64 {
    2.0
}
fn default_post_jumpscare_delay() -> f64 {
    1.0
}
fn default_win_transition_delay() -> f64 {
    3.0
}
fn default_volume() -> u8 {
    VolumeMix::MAX_LEVEL
}
fn default_win_text() -> String {
    "You survived the night".into()
}
fn default_lose_text() -> String {
    "You did not make it".into()
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            seconds_per_hour: default_seconds_per_hour(),
            hours_per_night: default_hours_per_night(),
            trailing_delay_secs: 0.0,
        }
    }
}

impl Default for DoorsConfig {
    fn default() -> Self {
        Self {
            knock_interval: default_interval(),
            slam_interval: default_interval(),
            time_before_jumpscare: default_time_before_jumpscare(),
            post_jumpscare_delay: default_post_jumpscare_delay(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            win_policy: WinPolicy::default(),
            win_transition_delay_secs: default_win_transition_delay(),
            seed: None,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            master_volume: default_volume(),
            sfx_volume: default_volume(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            win_text: default_win_text(),
            lose_text: default_lose_text(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    // Clears an optional field; required fields fail to deserialize.
                    existing if value == "null" && !existing.is_string() => serde_json::Value::Null,
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Optional fields: accept JSON literals, fall back to a string.
                    serde_json::Value::Null => serde_json::from_str(value)
                        .unwrap_or_else(|_| serde_json::Value::String(value.into())),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a config file at an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: Config = toml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Update a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the result does not validate.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist. Returns error if key is unknown.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Flat `(key, value)` listing of every leaf, in dot-path form.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Check values serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), ValidationError> {
        non_negative("clock.seconds_per_hour", self.clock.seconds_per_hour)?;
        if self.clock.seconds_per_hour <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "clock.seconds_per_hour".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.clock.hours_per_night == 0 {
            return Err(ValidationError::InvalidValue {
                field: "clock.hours_per_night".into(),
                message: "a night needs at least one hour".into(),
            });
        }
        non_negative("clock.trailing_delay_secs", self.clock.trailing_delay_secs)?;
        non_negative("doors.time_before_jumpscare", self.doors.time_before_jumpscare)?;
        non_negative("doors.post_jumpscare_delay", self.doors.post_jumpscare_delay)?;
        non_negative("game.win_transition_delay_secs", self.game.win_transition_delay_secs)?;
        if self.game.seed.is_some_and(|seed| i64::try_from(seed).is_err()) {
            return Err(ValidationError::InvalidValue {
                field: "game.seed".into(),
                message: format!("must be at most {}", i64::MAX),
            });
        }
        for (field, level) in [
            ("audio.master_volume", self.audio.master_volume),
            ("audio.sfx_volume", self.audio.sfx_volume),
        ] {
            if level > VolumeMix::MAX_LEVEL {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    message: format!("must be at most {}", VolumeMix::MAX_LEVEL),
                });
            }
        }
        Ok(())
    }

    // ── Derived settings ─────────────────────────────────────────────

    pub fn door_timing(&self) -> DoorTiming {
        DoorTiming {
            knock_interval: self.doors.knock_interval,
            slam_interval: self.doors.slam_interval,
            time_before_jumpscare_ms: secs_to_ms(self.doors.time_before_jumpscare),
            post_jumpscare_delay_ms: secs_to_ms(self.doors.post_jumpscare_delay),
        }
    }

    pub fn night_clock(&self) -> NightClock {
        NightClock::new(
            secs_to_ms(self.clock.seconds_per_hour),
            self.clock.hours_per_night,
            secs_to_ms(self.clock.trailing_delay_secs),
        )
    }

    pub fn volume_mix(&self) -> VolumeMix {
        VolumeMix {
            master: self.audio.master_volume,
            sfx: self.audio.sfx_volume,
        }
    }

    pub fn win_transition_delay_ms(&self) -> u64 {
        secs_to_ms(self.game.win_transition_delay_secs)
    }
}

fn non_negative(field: &str, secs: f64) -> Result<(), ValidationError> {
    if secs.is_finite() && secs >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("expected a non-negative duration, got {secs}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.clock.hours_per_night, 6);
        assert_eq!(parsed.doors.knock_interval, IntervalRange::DEFAULT);
        assert_eq!(parsed.game.seed, None);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.clock.seconds_per_hour, 90.0);
        assert_eq!(cfg.clock.trailing_delay_secs, 0.0);
        assert_eq!(cfg.doors.time_before_jumpscare, 2.0);
        assert_eq!(cfg.doors.post_jumpscare_delay, 1.0);
        assert_eq!(cfg.game.win_policy, WinPolicy::ImmediateOnCompletion);
        assert_eq!(cfg.game.win_transition_delay_secs, 3.0);
        assert_eq!(cfg.audio.master_volume, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [clock]
            hours_per_night = 2

            [doors]
            knock_interval = [1.0, 3.0]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.clock.hours_per_night, 2);
        assert_eq!(cfg.clock.seconds_per_hour, 90.0);
        assert_eq!(cfg.doors.knock_interval.max_secs(), 3.0);
        assert_eq!(cfg.doors.slam_interval, IntervalRange::DEFAULT);
    }

    #[test]
    fn inverted_interval_fails_to_parse() {
        let result: Result<Config, _> = toml::from_str("[doors]\nknock_interval = [9.0, 2.0]\n");
        assert!(result.is_err());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("clock.hours_per_night").as_deref(), Some("6"));
        assert_eq!(cfg.get("game.win_policy").as_deref(), Some("immediate_on_completion"));
        assert_eq!(cfg.get("doors.knock_interval").as_deref(), Some("[5.0,15.0]"));
        assert_eq!(cfg.get("game.seed").as_deref(), Some("null"));
        assert!(cfg.get("clock.missing_key").is_none());
    }

    #[test]
    fn apply_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.apply("clock.hours_per_night", "3").unwrap();
        cfg.apply("clock.seconds_per_hour", "1.5").unwrap();
        cfg.apply("doors.knock_interval", "[1.0, 2.0]").unwrap();
        cfg.apply("game.win_policy", "at_night_end").unwrap();
        cfg.apply("game.seed", "42").unwrap();
        assert_eq!(cfg.clock.hours_per_night, 3);
        assert_eq!(cfg.clock.seconds_per_hour, 1.5);
        assert_eq!(cfg.doors.knock_interval.min_secs(), 1.0);
        assert_eq!(cfg.game.win_policy, WinPolicy::AtNightEnd);
        assert_eq!(cfg.game.seed, Some(42));

        cfg.apply("game.seed", "null").unwrap();
        assert_eq!(cfg.game.seed, None);
    }

    #[test]
    fn null_clears_only_optional_values() {
        let mut cfg = Config::default();
        cfg.apply("game.seed", "7").unwrap();
        cfg.apply("game.seed", "null").unwrap();
        assert_eq!(cfg.game.seed, None);
        cfg.apply("game.seed", "8").unwrap();
        assert_eq!(cfg.game.seed, Some(8));

        assert!(matches!(
            cfg.apply("clock.hours_per_night", "null"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg.clock.hours_per_night, 6);

        cfg.apply("ui.win_text", "null").unwrap();
        assert_eq!(cfg.ui.win_text, "null");
    }

    #[test]
    fn seed_must_fit_in_a_toml_integer() {
        let mut cfg = Config::default();
        let max = i64::MAX.to_string();
        cfg.apply("game.seed", &max).unwrap();
        assert_eq!(cfg.game.seed, Some(i64::MAX as u64));

        assert!(matches!(
            cfg.apply("game.seed", "18446744073709551615"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg.game.seed, Some(i64::MAX as u64));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        cfg.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().game.seed, Some(i64::MAX as u64));
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("clock.nonexistent_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.apply("", "1").is_err());
    }

    #[test]
    fn apply_rejects_invalid_values_and_keeps_old_state() {
        let mut cfg = Config::default();
        assert!(cfg.apply("clock.hours_per_night", "many").is_err());
        assert!(cfg.apply("clock.hours_per_night", "0").is_err());
        assert!(cfg.apply("doors.slam_interval", "[4.0, 1.0]").is_err());
        assert!(cfg.apply("game.win_policy", "sometimes").is_err());
        assert!(cfg.apply("audio.sfx_volume", "11").is_err());
        assert_eq!(cfg.clock.hours_per_night, 6);
        assert_eq!(cfg.audio.sfx_volume, 10);
    }

    #[test]
    fn derived_settings_are_in_milliseconds() {
        let cfg = Config::default();
        let timing = cfg.door_timing();
        assert_eq!(timing.time_before_jumpscare_ms, 2_000);
        assert_eq!(timing.post_jumpscare_delay_ms, 1_000);
        assert_eq!(cfg.win_transition_delay_ms(), 3_000);
        assert_eq!(cfg.night_clock().current_hour(), 0);
    }

    #[test]
    fn entries_lists_every_leaf() {
        let entries = Config::default().entries();
        let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
        assert!(keys.contains(&"clock.seconds_per_hour"));
        assert!(keys.contains(&"doors.knock_interval"));
        assert!(keys.contains(&"ui.lose_text"));
    }

    #[test]
    fn save_and_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.apply("game.seed", "7").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.game.seed, Some(7));
        assert!(matches!(
            Config::load_from(&dir.path().join("missing.toml")),
            Err(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[clock]\nseconds_per_hour = -1.0\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
