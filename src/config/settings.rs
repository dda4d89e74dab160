//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a settings file only needs the
//! keys the user wants to change.

use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppPaths;
use crate::hotkey::parse_combo;

// ---------------------------------------------------------------------------
// SpeechBackend
// ---------------------------------------------------------------------------

/// Which offline text-to-speech command speaks the selection.
///
/// | Variant  | Command                                  | Platform |
/// |----------|------------------------------------------|----------|
/// | Say      | `say -r <wpm> [-v <voice>]`              | macOS    |
/// | EspeakNg | `espeak-ng -s <wpm> [-v <voice>] --stdin`| Linux / Windows |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechBackend {
    Say,
    EspeakNg,
}

impl Default for SpeechBackend {
    fn default() -> Self {
        if cfg!(target_os = "macos") {
            Self::Say
        } else {
            Self::EspeakNg
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the speech engine process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speaking rate in words per minute.  Must be positive.
    pub rate_wpm: u32,
    /// Voice identifier passed to the engine; `None` means the system
    /// default voice.
    pub voice: Option<String>,
    /// Engine command family.
    pub backend: SpeechBackend,
    /// Override for the engine executable (e.g. an absolute path).
    pub program: Option<String>,
    /// Milliseconds a terminated engine gets to exit before it is killed.
    pub grace_ms: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            rate_wpm: 190,
            voice: None,
            backend: SpeechBackend::default(),
            program: None,
            grace_ms: 500,
        }
    }
}

impl SpeechConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Timing of the clipboard side-channel capture.
///
/// There is no completion signal for the foreground app's clipboard write,
/// so these are fixed waits.  Longer delays make slow apps reliable at the
/// cost of latency on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Seconds to wait after the copy keystroke before reading.
    pub copy_delay_secs: f64,
    /// Milliseconds to let the hotkey's modifiers settle before the copy
    /// keystroke is sent.
    pub settle_delay_ms: u64,
    /// Milliseconds before the single retry read when the first read finds
    /// nothing.  `0` disables the retry.
    pub retry_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            copy_delay_secs: 0.30,
            settle_delay_ms: 50,
            retry_delay_ms: 200,
        }
    }
}

/// Longest accepted copy delay, in seconds.
pub const MAX_COPY_DELAY_SECS: f64 = 10.0;

/// Longest accepted termination grace window, in milliseconds.
pub const MAX_GRACE_MS: u64 = 60_000;

impl CaptureConfig {
    /// Clamped to `0..=MAX_COPY_DELAY_SECS`; `NaN` gives zero.
    pub fn copy_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.copy_delay_secs.clamp(0.0, MAX_COPY_DELAY_SECS))
            .unwrap_or_default()
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// HotkeyConfig
// ---------------------------------------------------------------------------

/// Global hotkey bindings.  `Cmd` is the Command key on macOS and the
/// Super/Windows key elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyConfig {
    /// Combination that speaks the current selection (e.g. `"Cmd+Shift+S"`).
    pub speak: String,
    /// Combination that stops speech (e.g. `"Cmd+Shift+X"`).
    pub stop: String,
    /// Minimum milliseconds between two accepted speak triggers.
    pub debounce_ms: u64,
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            speak: "Cmd+Shift+S".into(),
            stop: "Cmd+Shift+X".into(),
            debounce_ms: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationConfig
// ---------------------------------------------------------------------------

/// Desktop notifications for user-facing failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Reasons [`AppConfig::validate`] rejects a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("speaking rate must be a positive number of words per minute")]
    InvalidRate,

    #[error("copy delay must be between 0 and {max} seconds, got {0}", max = MAX_COPY_DELAY_SECS)]
    InvalidCopyDelay(f64),

    #[error("termination grace must be at most {max} ms, got {0}", max = MAX_GRACE_MS)]
    InvalidGrace(u64),

    #[error("cannot parse {name} hotkey {spec:?}")]
    InvalidHotkey { name: &'static str, spec: String },

    #[error("speak and stop hotkeys must differ")]
    DuplicateHotkeys,
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// Fixed for the lifetime of the process once loaded.
///
/// ```rust,no_run
/// use read4me::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Speech engine settings.
    pub speech: SpeechConfig,
    /// Selection capture timing.
    pub capture: CaptureConfig,
    /// Global hotkey bindings.
    pub hotkey: HotkeyConfig,
    /// Desktop notification settings.
    pub notifications: NotificationConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the values that TOML types alone cannot constrain.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.speech.rate_wpm == 0 {
            return Err(ConfigError::InvalidRate);
        }

        let delay = self.capture.copy_delay_secs;
        if !delay.is_finite() || delay <= 0.0 || delay > MAX_COPY_DELAY_SECS {
            return Err(ConfigError::InvalidCopyDelay(delay));
        }
        if self.speech.grace_ms > MAX_GRACE_MS {
            return Err(ConfigError::InvalidGrace(self.speech.grace_ms));
        }

        let speak = parse_combo(&self.hotkey.speak).ok_or_else(|| ConfigError::InvalidHotkey {
            name: "speak",
            spec: self.hotkey.speak.clone(),
        })?;
        let stop = parse_combo(&self.hotkey.stop).ok_or_else(|| ConfigError::InvalidHotkey {
            name: "stop",
            spec: self.hotkey.stop.clone(),
        })?;
        if speak == stop {
            return Err(ConfigError::DuplicateHotkeys);
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.speech.rate_wpm, 190);
        assert!(cfg.speech.voice.is_none());
        assert_eq!(cfg.speech.grace_ms, 500);
        assert!((cfg.capture.copy_delay_secs - 0.30).abs() < f64::EPSILON);
        assert_eq!(cfg.capture.settle_delay_ms, 50);
        assert_eq!(cfg.capture.retry_delay_ms, 200);
        assert_eq!(cfg.hotkey.speak, "Cmd+Shift+S");
        assert_eq!(cfg.hotkey.stop, "Cmd+Shift+X");
        assert_eq!(cfg.hotkey.debounce_ms, 500);
        assert!(cfg.notifications.enabled);
        assert!(cfg.validate().is_ok());
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        assert_eq!(config.speech.rate_wpm, 190);
        assert_eq!(config.hotkey.speak, "Cmd+Shift+S");
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.toml");

        let mut cfg = AppConfig::default();
        cfg.speech.rate_wpm = 240;
        cfg.speech.voice = Some("Samantha".into());
        cfg.speech.backend = SpeechBackend::Say;
        cfg.capture.copy_delay_secs = 0.5;
        cfg.hotkey.stop = "Ctrl+Alt+X".into();
        cfg.notifications.enabled = false;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.speech.rate_wpm, 240);
        assert_eq!(loaded.speech.voice.as_deref(), Some("Samantha"));
        assert_eq!(loaded.speech.backend, SpeechBackend::Say);
        assert!((loaded.capture.copy_delay_secs - 0.5).abs() < f64::EPSILON);
        assert_eq!(loaded.hotkey.stop, "Ctrl+Alt+X");
        assert!(!loaded.notifications.enabled);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[speech]\nvoice = \"Alex\"\n").unwrap();

        let cfg = AppConfig::load_from(&path).expect("load");
        assert_eq!(cfg.speech.voice.as_deref(), Some("Alex"));
        assert_eq!(cfg.speech.rate_wpm, 190);
        assert_eq!(cfg.hotkey.speak, "Cmd+Shift+S");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[speech\nrate_wpm = ").unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn validate_rejects_zero_rate() {
        let mut cfg = AppConfig::default();
        cfg.speech.rate_wpm = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidRate));
    }

    #[test]
    fn validate_rejects_non_positive_delay() {
        let mut cfg = AppConfig::default();
        cfg.capture.copy_delay_secs = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidCopyDelay(_))));

        cfg.capture.copy_delay_secs = f64::NAN;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidCopyDelay(_))));
    }

    #[test]
    fn validate_rejects_huge_delay() {
        let mut cfg = AppConfig::default();
        cfg.capture.copy_delay_secs = 1e20;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidCopyDelay(_))));

        cfg.capture.copy_delay_secs = f64::INFINITY;
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidCopyDelay(_))));

        cfg.capture.copy_delay_secs = MAX_COPY_DELAY_SECS;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_huge_grace() {
        let mut cfg = AppConfig::default();
        cfg.speech.grace_ms = u64::MAX;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidGrace(u64::MAX)));
    }

    #[test]
    fn out_of_range_copy_delay_does_not_panic() {
        let mut cfg = CaptureConfig::default();
        cfg.copy_delay_secs = 1e20;
        assert_eq!(cfg.copy_delay(), Duration::from_secs(10));

        cfg.copy_delay_secs = -1.0;
        assert!(cfg.copy_delay().is_zero());

        cfg.copy_delay_secs = f64::NAN;
        assert!(cfg.copy_delay().is_zero());
    }

    #[test]
    fn validate_rejects_bad_or_duplicate_hotkeys() {
        let mut cfg = AppConfig::default();
        cfg.hotkey.speak = "Cmd+Banana".into();
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidHotkey { name: "speak", .. })
        ));

        let mut cfg = AppConfig::default();
        cfg.hotkey.stop = "shift+cmd+s".into();
        assert_eq!(cfg.validate(), Err(ConfigError::DuplicateHotkeys));
    }

    #[test]
    fn durations_follow_fields() {
        let cfg = CaptureConfig {
            copy_delay_secs: 0.25,
            settle_delay_ms: 10,
            retry_delay_ms: 0,
        };
        assert_eq!(cfg.copy_delay(), Duration::from_millis(250));
        assert_eq!(cfg.settle_delay(), Duration::from_millis(10));
        assert!(cfg.retry_delay().is_zero());
    }
}
