//! Configuration module
//!
//! Handles loading and saving popout configuration. Window assignments are
//! never stored here; they only live for the duration of one run.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::assignments::AnimationOptions;
use crate::screen::{EdgeDetectorConfig, DEFAULT_OFFSCREEN_PADDING};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Accepted range for slide step counts
pub const STEPS_RANGE: std::ops::RangeInclusive<u32> = 1..=200;

/// Accepted range for slide step intervals (ms)
pub const INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 5..=500;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Edge trigger settings
    #[serde(default)]
    pub trigger: TriggerConfig,

    /// Default slide settings for new assignments
    #[serde(default)]
    pub animation: AnimationConfig,
}

/// General configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log filter directive (e.g. "info", "popout=debug")
    pub log_level: Option<String>,
}

/// Edge trigger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Edge detection margin in pixels
    #[serde(default = "default_edge_margin")]
    pub edge_margin: u32,
    /// Cursor poll interval (ms)
    #[serde(default = "default_edge_poll")]
    pub edge_poll_ms: u64,
    /// Focus poll interval (ms)
    #[serde(default = "default_focus_poll")]
    pub focus_poll_ms: u64,
    /// Time the cursor must rest in a segment before it reveals (ms)
    #[serde(default)]
    pub dwell_time_ms: u64,
    /// Gap between a parked window and the monitor edge (px)
    #[serde(default = "default_offscreen_padding")]
    pub offscreen_padding: i32,
}

fn default_edge_margin() -> u32 {
    3
}

fn default_edge_poll() -> u64 {
    100
}

fn default_focus_poll() -> u64 {
    200
}

fn default_offscreen_padding() -> i32 {
    DEFAULT_OFFSCREEN_PADDING
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            edge_margin: default_edge_margin(),
            edge_poll_ms: default_edge_poll(),
            focus_poll_ms: default_focus_poll(),
            dwell_time_ms: 0,
            offscreen_padding: default_offscreen_padding(),
        }
    }
}

impl TriggerConfig {
    pub fn edge_poll(&self) -> Duration {
        Duration::from_millis(self.edge_poll_ms)
    }

    pub fn focus_poll(&self) -> Duration {
        Duration::from_millis(self.focus_poll_ms)
    }

    pub fn edge_detector(&self) -> EdgeDetectorConfig {
        EdgeDetectorConfig {
            edge_margin: self.edge_margin,
            dwell_time_ms: self.dwell_time_ms,
        }
    }
}

/// Default slide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Steps per slide
    #[serde(default = "default_steps")]
    pub steps: u32,
    /// Time between steps (ms)
    #[serde(default = "default_interval")]
    pub interval_ms: u64,
    /// Smoothstep easing
    #[serde(default)]
    pub ease: bool,
    /// Fade while sliding
    #[serde(default)]
    pub fade: bool,
}

fn default_steps() -> u32 {
    30
}

fn default_interval() -> u64 {
    15
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            interval_ms: default_interval(),
            ease: false,
            fade: false,
        }
    }
}

impl AnimationConfig {
    pub fn options(&self) -> AnimationOptions {
        AnimationOptions {
            step_count: self.steps,
            tick_interval_ms: self.interval_ms,
            use_easing: self.ease,
            use_fade: self.fade,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location
    pub fn load_default() -> ConfigResult<Self> {
        for path in Self::default_paths() {
            if path.exists() {
                return Self::load(&path);
            }
        }

        // Return default config if no file found
        Ok(Self::default())
    }

    /// Locations searched by [`Config::load_default`], in order
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("popout/config.toml")),
            Some(PathBuf::from("./popout.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the trigger cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        let trigger = &self.trigger;
        if trigger.edge_poll_ms == 0 {
            return Err(invalid("trigger.edge_poll_ms", "must be greater than zero"));
        }
        if trigger.focus_poll_ms == 0 {
            return Err(invalid("trigger.focus_poll_ms", "must be greater than zero"));
        }
        if trigger.offscreen_padding < 0 {
            return Err(invalid("trigger.offscreen_padding", "must not be negative"));
        }

        validate_steps(self.animation.steps)?;
        validate_interval(self.animation.interval_ms)?;
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Check a step count against [`STEPS_RANGE`]
pub fn validate_steps(steps: u32) -> ConfigResult<()> {
    if STEPS_RANGE.contains(&steps) {
        Ok(())
    } else {
        Err(invalid(
            "animation.steps",
            format!(
                "{} is outside {}..={}",
                steps,
                STEPS_RANGE.start(),
                STEPS_RANGE.end()
            ),
        ))
    }
}

/// Check a step interval against [`INTERVAL_RANGE`]
pub fn validate_interval(interval_ms: u64) -> ConfigResult<()> {
    if INTERVAL_RANGE.contains(&interval_ms) {
        Ok(())
    } else {
        Err(invalid(
            "animation.interval_ms",
            format!(
                "{} is outside {}..={}",
                interval_ms,
                INTERVAL_RANGE.start(),
                INTERVAL_RANGE.end()
            ),
        ))
    }
}

/// Sample configuration for `config --generate`
pub fn sample_config() -> Config {
    Config {
        general: GeneralConfig {
            log_level: Some("info".to_string()),
        },
        animation: AnimationConfig {
            ease: true,
            ..Default::default()
        },
        ..Default::default()
    }
}
