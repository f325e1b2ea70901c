//! Runtime configuration for the mover.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// ApplicationMenu (bit 1) | A (bit 7). Menu on Vive wands, X/A on Touch controllers.
pub const DEFAULT_GRAB_BUTTON_MASK: u64 = (1 << 1) | (1 << 7);

pub const DEFAULT_POST_FRAME_SLEEP_MS: u64 = 3;
pub const DEFAULT_IDLE_POLL_US: u64 = 500;
pub const DEFAULT_CONNECT_RETRY_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoverConfig {
    /// Buttons on the left controller that trigger a grab.
    pub left_button_mask: u64,
    /// Buttons on the right controller that trigger a grab.
    pub right_button_mask: u64,
    /// Sleep after a processed frame.
    pub post_frame_sleep_ms: u64,
    /// Backoff between polls while no new compositor frame is ready.
    pub idle_poll_us: u64,
    /// Interval between startup connection and calibration attempts.
    pub connect_retry_ms: u64,
}

impl Default for MoverConfig {
    fn default() -> Self {
        Self {
            left_button_mask: DEFAULT_GRAB_BUTTON_MASK,
            right_button_mask: DEFAULT_GRAB_BUTTON_MASK,
            post_frame_sleep_ms: DEFAULT_POST_FRAME_SLEEP_MS,
            idle_poll_us: DEFAULT_IDLE_POLL_US,
            connect_retry_ms: DEFAULT_CONNECT_RETRY_MS,
        }
    }
}

impl MoverConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&raw)?;
        tracing::debug!("loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.left_button_mask == 0 && self.right_button_mask == 0 {
            return Err(Error::config(
                "both button masks are 0; no controller could ever grab",
            ));
        }
        if self.connect_retry_ms == 0 {
            return Err(Error::config("connect_retry_ms must be greater than 0"));
        }
        Ok(())
    }

    pub fn post_frame_sleep(&self) -> Duration {
        Duration::from_millis(self.post_frame_sleep_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_micros(self.idle_poll_us)
    }

    pub fn connect_retry(&self) -> Duration {
        Duration::from_millis(self.connect_retry_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_masks_match_menu_and_a() {
        let config = MoverConfig::default();
        assert_eq!(config.left_button_mask, 130);
        assert_eq!(config.right_button_mask, 130);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = MoverConfig::from_json_str(r#"{ "left_button_mask": 4 }"#).unwrap();
        assert_eq!(config.left_button_mask, 4);
        assert_eq!(config.right_button_mask, DEFAULT_GRAB_BUTTON_MASK);
        assert_eq!(config.post_frame_sleep(), Duration::from_millis(3));
        assert_eq!(config.connect_retry(), Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_unusable_masks() {
        let err = MoverConfig::from_json_str(
            r#"{ "left_button_mask": 0, "right_button_mask": 0 }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_rejects_zero_retry_interval() {
        let err = MoverConfig::from_json_str(r#"{ "connect_retry_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = MoverConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
