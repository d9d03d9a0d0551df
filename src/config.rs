//! App and event queue configuration.
//!
//! Both configs come with sensible defaults via [`Default`] and a fluent
//! builder that validates on `build()`. [`AppConfig`] can also be read from
//! JSON; missing fields take their default values.
//!
//! ```rust
//! use compygui::config::{AppConfig, QueueConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = AppConfig::builder()
//!     .title("Hello")
//!     .target_fps(60)
//!     .window_queue(QueueConfig::builder().max_listeners(256).build()?)
//!     .build()?;
//! assert_eq!(cfg.window_queue.max_listeners, 256);
//! # Ok(()) }
//! ```

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// Hard limit of retained events and registered listeners per queue.
pub const DEFAULT_QUEUE_LIMIT: usize = 1024;

const DEFAULT_TITLE: &str = "ComPyGUI App";

/// Limits and defaults of one event queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of retained (not yet expired) events
    pub max_events: usize,
    /// Maximum number of connected listeners
    pub max_listeners: usize,
    /// Expiry in ticks for events fired without an explicit expiry
    pub default_expires_in: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_events: DEFAULT_QUEUE_LIMIT,
            max_listeners: DEFAULT_QUEUE_LIMIT,
            default_expires_in: 1,
        }
    }
}

impl QueueConfig {
    pub fn builder() -> QueueConfigBuilder {
        QueueConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_events == 0 {
            return Err(ConfigError::ZeroLimit("event"));
        }
        if self.max_listeners == 0 {
            return Err(ConfigError::ZeroLimit("listener"));
        }
        if self.default_expires_in == 0 {
            return Err(ConfigError::ZeroExpiry);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueueConfigBuilder {
    inner: QueueConfig,
}

impl QueueConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut QueueConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn max_events(self, n: usize) -> Self { self.map(|c| c.max_events = n) }
    pub fn max_listeners(self, n: usize) -> Self { self.map(|c| c.max_listeners = n) }
    pub fn default_expires_in(self, ticks: u32) -> Self { self.map(|c| c.default_expires_in = ticks) }

    pub fn build(self) -> Result<QueueConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default title for windows created without one
    pub title: String,
    /// Upper bound of main loop iterations per second. `None` runs unthrottled.
    pub target_fps: Option<u32>,
    /// Limits of the app-level queue
    pub app_queue: QueueConfig,
    /// Limits of every window-local queue
    pub window_queue: QueueConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            target_fps: None,
            app_queue: QueueConfig::default(),
            window_queue: QueueConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Reads a config from JSON and validates it.
    pub fn from_json(json: &str) -> Result<AppConfig, ConfigError> {
        let cfg: AppConfig = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == Some(0) {
            return Err(ConfigError::ZeroFrameCap);
        }
        self.app_queue.validate()?;
        self.window_queue.validate()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigBuilder {
    inner: AppConfig,
}

impl AppConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut AppConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn title<S: Into<String>>(self, title: S) -> Self { self.map(|c| c.title = title.into()) }
    pub fn target_fps(self, fps: u32) -> Self { self.map(|c| c.target_fps = Some(fps)) }
    pub fn unthrottled(self) -> Self { self.map(|c| c.target_fps = None) }
    pub fn app_queue(self, q: QueueConfig) -> Self { self.map(|c| c.app_queue = q) }
    pub fn window_queue(self, q: QueueConfig) -> Self { self.map(|c| c.window_queue = q) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut AppConfig)) -> Self { self.map(f) }

    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_the_hard_queue_limit() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app_queue.max_events, 1024);
        assert_eq!(cfg.window_queue.max_listeners, 1024);
        assert_eq!(cfg.window_queue.default_expires_in, 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn builder_rejects_invalid_values() {
        assert_eq!(
            QueueConfig::builder().max_events(0).build(),
            Err(ConfigError::ZeroLimit("event"))
        );
        assert_eq!(
            QueueConfig::builder().default_expires_in(0).build(),
            Err(ConfigError::ZeroExpiry)
        );
        assert_eq!(AppConfig::builder().target_fps(0).build(), Err(ConfigError::ZeroFrameCap));
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let cfg = AppConfig::from_json(r#"{ "title": "Demo", "window_queue": { "max_listeners": 64 } }"#).unwrap();
        assert_eq!(cfg.title, "Demo");
        assert_eq!(cfg.target_fps, None);
        assert_eq!(cfg.window_queue.max_listeners, 64);
        assert_eq!(cfg.window_queue.max_events, 1024);
        assert_eq!(cfg.app_queue, QueueConfig::default());
    }

    #[test]
    fn json_is_validated() {
        let err = AppConfig::from_json(r#"{ "app_queue": { "max_events": 0 } }"#).unwrap_err();
        assert_eq!(err, ConfigError::ZeroLimit("event"));

        assert!(matches!(AppConfig::from_json("{ nope"), Err(ConfigError::Parse(_))));
    }
}
