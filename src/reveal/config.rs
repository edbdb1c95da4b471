use crate::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default distance scrolled per tick, in CSS pixels
pub const DEFAULT_STEP_SIZE: u64 = 100;

/// Default pause between ticks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Policy for the incremental reveal loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Pixels scrolled per tick (default: 100)
    pub step_size: u64,

    /// Time between ticks (default: 100ms)
    #[serde(with = "duration_ms")]
    pub poll_interval: Duration,

    /// Give up after this many ticks (default: unbounded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_ticks: Option<u64>,

    /// Give up once this much time has passed (default: unbounded)
    #[serde(with = "opt_duration_ms", skip_serializing_if = "Option::is_none")]
    pub max_duration: Option<Duration>,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            step_size: DEFAULT_STEP_SIZE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_ticks: None,
            max_duration: None,
        }
    }
}

impl RevealConfig {
    /// Create config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set step size
    pub fn step_size(mut self, pixels: u64) -> Self {
        self.step_size = pixels;
        self
    }

    /// Builder method: set poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builder method: cap the number of ticks
    pub fn max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    /// Builder method: cap the total time spent scrolling
    pub fn max_duration(mut self, duration: Duration) -> Self {
        self.max_duration = Some(duration);
        self
    }

    /// Whether either hardening guard is set
    pub fn is_bounded(&self) -> bool {
        self.max_ticks.is_some() || self.max_duration.is_some()
    }

    /// Reject values the loop cannot make progress with
    pub fn validate(&self) -> Result<()> {
        if self.step_size == 0 {
            return Err(ScrapeError::InvalidConfig("reveal step_size must be positive".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(ScrapeError::InvalidConfig("reveal poll_interval must be positive".to_string()));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod opt_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RevealConfig::default();
        assert_eq!(config.step_size, 100);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert!(!config.is_bounded());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = RevealConfig::new()
            .step_size(250)
            .poll_interval(Duration::from_millis(40))
            .max_ticks(10)
            .max_duration(Duration::from_secs(3));

        assert_eq!(config.step_size, 250);
        assert_eq!(config.poll_interval, Duration::from_millis(40));
        assert_eq!(config.max_ticks, Some(10));
        assert_eq!(config.max_duration, Some(Duration::from_secs(3)));
        assert!(config.is_bounded());
    }

    #[test]
    fn test_validate_rejects_zero_step() {
        assert!(RevealConfig::new().step_size(0).validate().is_err());
        assert!(RevealConfig::new().poll_interval(Duration::ZERO).validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RevealConfig = toml::from_str("max_ticks = 500").unwrap();
        assert_eq!(config.step_size, DEFAULT_STEP_SIZE);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.max_ticks, Some(500));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let config: RevealConfig = toml::from_str(
            r#"
            step_size = 300
            poll_interval = 250
            max_duration = 60000
            "#,
        )
        .unwrap();

        assert_eq!(config.step_size, 300);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.max_ticks, None);
        assert_eq!(config.max_duration, Some(Duration::from_secs(60)));
    }
}
