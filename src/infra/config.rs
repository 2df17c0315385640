//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. VISIT_COUNTDOWN_CONFIG environment variable
//! 3. Default: config/visit_countdown.toml

use crate::domain::types::{CornerZone, SurfaceSize};
use anyhow::{ensure, Context};
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/visit_countdown.toml";
const CONFIG_ENV_VAR: &str = "VISIT_COUNTDOWN_CONFIG";

/// RGB triple, e.g. `[255, 0, 0]`
pub type Rgb = [u8; 3];

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// Longest wait for input between frames
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_background")]
    pub background: Rgb,
    #[serde(default = "default_foreground")]
    pub foreground: Rgb,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            frame_interval_ms: default_frame_interval_ms(),
            background: default_background(),
            foreground: default_foreground(),
        }
    }
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    480
}

fn default_frame_interval_ms() -> u64 {
    100
}

fn default_background() -> Rgb {
    [0, 0, 0]
}

fn default_foreground() -> Rgb {
    [255, 0, 0]
}

/// Font sizes in logical pixels
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontsConfig {
    #[serde(default = "default_number_px")]
    pub number_px: u32,
    #[serde(default = "default_unit_px")]
    pub unit_px: u32,
    #[serde(default = "default_date_px")]
    pub date_px: u32,
    #[serde(default = "default_clock_px")]
    pub clock_px: u32,
    /// Vertical offset of " days" relative to the number
    #[serde(default = "default_unit_y_offset")]
    pub unit_y_offset: u32,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            number_px: default_number_px(),
            unit_px: default_unit_px(),
            date_px: default_date_px(),
            clock_px: default_clock_px(),
            unit_y_offset: default_unit_y_offset(),
        }
    }
}

fn default_number_px() -> u32 {
    400
}

fn default_unit_px() -> u32 {
    200
}

fn default_date_px() -> u32 {
    150
}

fn default_clock_px() -> u32 {
    30
}

fn default_unit_y_offset() -> u32 {
    120
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GestureConfig {
    /// Fraction of width/height counted as a corner, in (0, 0.5)
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,
    /// Idle time after the last tap before the sequence is dropped
    #[serde(default = "default_tap_idle_ms")]
    pub tap_idle_ms: u64,
    #[serde(default = "default_quit_code")]
    pub quit_code: Vec<CornerZone>,
    #[serde(default = "default_set_code")]
    pub set_code: Vec<CornerZone>,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            tap_idle_ms: default_tap_idle_ms(),
            quit_code: default_quit_code(),
            set_code: default_set_code(),
        }
    }
}

fn default_sensitivity() -> f32 {
    0.25
}

fn default_tap_idle_ms() -> u64 {
    1000
}

fn default_quit_code() -> Vec<CornerZone> {
    vec![CornerZone::TopRight, CornerZone::TopRight, CornerZone::BottomRight, CornerZone::BottomLeft]
}

fn default_set_code() -> Vec<CornerZone> {
    vec![CornerZone::TopLeft, CornerZone::TopLeft, CornerZone::TopLeft, CornerZone::BottomRight]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetModeConfig {
    /// Inactivity before set mode saves and returns to the countdown
    #[serde(default = "default_inactivity_secs")]
    pub inactivity_secs: u64,
}

impl Default for SetModeConfig {
    fn default() -> Self {
        Self { inactivity_secs: default_inactivity_secs() }
    }
}

fn default_inactivity_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Single-line `DD,MM,YYYY,HH,MM` file
    #[serde(default = "default_visit_file")]
    pub visit_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { visit_file: default_visit_file() }
    }
}

fn default_visit_file() -> String {
    "visit_countdown.cfg".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log destination; stdout belongs to the display
    #[serde(default = "default_log_file")]
    pub file: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { file: default_log_file() }
    }
}

fn default_log_file() -> String {
    "visit-countdown.log".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub fonts: FontsConfig,
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub set_mode: SetModeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    surface: SurfaceSize,
    frame_interval_ms: u64,
    background: Rgb,
    foreground: Rgb,
    fonts: FontsConfig,
    sensitivity: f32,
    tap_idle_ms: u64,
    quit_code: Vec<CornerZone>,
    set_code: Vec<CornerZone>,
    set_inactivity_secs: u64,
    visit_file: String,
    log_file: String,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

impl Config {
    /// Determine config file path from the command line or environment
    pub fn resolve_config_path(cli_path: Option<&str>) -> String {
        if let Some(path) = cli_path {
            return path.to_string();
        }

        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return path;
        }

        DEFAULT_CONFIG_PATH.to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Self::validate(&toml_config)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Load `path` if it exists.
    ///
    /// `Ok(None)` only when the file is missing; a file that exists but does
    /// not parse or validate is an error so a bad edit never silently points
    /// the program at the default visit file.
    pub fn load_optional<P: AsRef<Path>>(path: P) -> anyhow::Result<Option<Self>> {
        match Self::from_file(path) {
            Ok(config) => Ok(Some(config)),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn validate(toml_config: &TomlConfig) -> anyhow::Result<()> {
        let display = &toml_config.display;
        ensure!(display.width > 0 && display.height > 0, "display size must be non-zero");

        let gesture = &toml_config.gesture;
        ensure!(
            gesture.sensitivity > 0.0 && gesture.sensitivity < 0.5,
            "gesture.sensitivity must be in (0, 0.5), got {}",
            gesture.sensitivity
        );
        ensure!(!gesture.quit_code.is_empty(), "gesture.quit_code must not be empty");
        ensure!(!gesture.set_code.is_empty(), "gesture.set_code must not be empty");
        ensure!(gesture.quit_code != gesture.set_code, "gesture codes must differ");
        Ok(())
    }

    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            surface: SurfaceSize::new(toml_config.display.width, toml_config.display.height),
            frame_interval_ms: toml_config.display.frame_interval_ms,
            background: toml_config.display.background,
            foreground: toml_config.display.foreground,
            fonts: toml_config.fonts,
            sensitivity: toml_config.gesture.sensitivity,
            tap_idle_ms: toml_config.gesture.tap_idle_ms,
            quit_code: toml_config.gesture.quit_code,
            set_code: toml_config.gesture.set_code,
            set_inactivity_secs: toml_config.set_mode.inactivity_secs,
            visit_file: toml_config.storage.visit_file,
            log_file: toml_config.logging.file,
            config_file,
        }
    }

    pub fn surface(&self) -> SurfaceSize {
        self.surface
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn background(&self) -> Rgb {
        self.background
    }

    pub fn foreground(&self) -> Rgb {
        self.foreground
    }

    pub fn fonts(&self) -> &FontsConfig {
        &self.fonts
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn tap_idle(&self) -> Duration {
        Duration::from_millis(self.tap_idle_ms)
    }

    pub fn quit_code(&self) -> &[CornerZone] {
        &self.quit_code
    }

    pub fn set_code(&self) -> &[CornerZone] {
        &self.set_code
    }

    pub fn set_inactivity(&self) -> Duration {
        Duration::from_secs(self.set_inactivity_secs)
    }

    pub fn visit_file(&self) -> &str {
        &self.visit_file
    }

    pub fn log_file(&self) -> &str {
        &self.log_file
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Override the gesture idle interval
    #[cfg(test)]
    pub fn with_tap_idle_ms(mut self, tap_idle_ms: u64) -> Self {
        self.tap_idle_ms = tap_idle_ms;
        self
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>().is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}
