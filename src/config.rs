//! Optional run configuration file.
//!
//! Search order: the path given with `--config`, then `./company-scrape.toml`.
//! Every key is optional; present keys override built-in defaults and are in
//! turn overridden by command-line flags.

use crate::browser::LaunchOptions;
use crate::error::{Result, ScrapeError};
use crate::reveal::RevealConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "company-scrape.toml";

/// Config file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case", default, deny_unknown_fields)]
pub struct Config {
    /// Run the browser without a window
    pub headless: Option<bool>,
    /// Chrome/Chromium binary
    pub chrome_path: Option<PathBuf>,
    /// Browser profile directory
    pub user_data_dir: Option<PathBuf>,
    /// Disable the Chrome sandbox when false (needed in some containers)
    pub sandbox: Option<bool>,
    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
    /// Page load timeout in seconds
    pub navigation_timeout_secs: Option<u64>,
    /// Wait for network activity to settle after each load, in seconds; 0 skips it
    pub network_idle_timeout_secs: Option<u64>,
    /// Reveal step in pixels
    pub step_size: Option<u64>,
    /// Reveal pause in milliseconds
    pub poll_interval_ms: Option<u64>,
    /// Reveal tick cap
    pub max_ticks: Option<u64>,
    /// Reveal time cap in seconds
    pub max_duration_secs: Option<u64>,
    /// Pause between batch targets in milliseconds
    pub batch_delay_ms: Option<u64>,
    /// Default output file
    pub output: Option<PathBuf>,
}

impl Config {
    /// Load `explicit` if given (it must exist), else `./company-scrape.toml` if present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !candidate.exists() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|e| ScrapeError::io(&path, e))?;
        let config = Self::parse(&text)
            .map_err(|e| ScrapeError::InvalidConfig(format!("{}: {}", path.display(), e)))?;

        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply present keys on top of `base`
    pub fn launch_options(&self, base: LaunchOptions) -> LaunchOptions {
        let mut options = base;
        if let Some(headless) = self.headless {
            options.headless = headless;
        }
        if let Some(path) = &self.chrome_path {
            options.chrome_path = Some(path.clone());
        }
        if let Some(dir) = &self.user_data_dir {
            options.user_data_dir = Some(dir.clone());
        }
        if let Some(sandbox) = self.sandbox {
            options.sandbox = sandbox;
        }
        if let Some(width) = self.window_width {
            options.window_width = width;
        }
        if let Some(height) = self.window_height {
            options.window_height = height;
        }
        if let Some(secs) = self.navigation_timeout_secs {
            options.navigation_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.network_idle_timeout_secs {
            options.network_idle_timeout = Duration::from_secs(secs);
        }
        options
    }

    /// Apply present reveal keys on top of `base`
    pub fn reveal_config(&self, base: RevealConfig) -> RevealConfig {
        let mut config = base;
        if let Some(step) = self.step_size {
            config.step_size = step;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ticks) = self.max_ticks {
            config.max_ticks = Some(ticks);
        }
        if let Some(secs) = self.max_duration_secs {
            config.max_duration = Some(Duration::from_secs(secs));
        }
        config
    }

    /// Pause between batch targets, if configured
    pub fn batch_delay(&self) -> Option<Duration> {
        self.batch_delay_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let c = Config::parse("").unwrap();
        assert_eq!(c, Config::default());
        assert_eq!(c.launch_options(LaunchOptions::default()), LaunchOptions::default());
        assert_eq!(c.reveal_config(RevealConfig::default()), RevealConfig::default());
        assert!(c.batch_delay().is_none());
    }

    #[test]
    fn parse_full_config() {
        let c = Config::parse(
            r#"
            headless = false
            chrome_path = "/usr/bin/chromium"
            sandbox = false
            window_width = 1024
            window_height = 4000
            navigation_timeout_secs = 90
            network_idle_timeout_secs = 0
            step_size = 500
            poll_interval_ms = 300
            max_ticks = 1000
            max_duration_secs = 120
            batch_delay_ms = 2500
            output = "out/data.json"
            "#,
        )
        .unwrap();

        let launch = c.launch_options(LaunchOptions::default());
        assert!(!launch.headless);
        assert!(!launch.sandbox);
        assert_eq!(launch.chrome_path.as_deref(), Some(Path::new("/usr/bin/chromium")));
        assert_eq!(launch.window_width, 1024);
        assert_eq!(launch.window_height, 4000);
        assert_eq!(launch.navigation_timeout, Duration::from_secs(90));
        assert!(launch.network_idle_timeout.is_zero());

        let reveal = c.reveal_config(RevealConfig::default());
        assert_eq!(reveal.step_size, 500);
        assert_eq!(reveal.poll_interval, Duration::from_millis(300));
        assert_eq!(reveal.max_ticks, Some(1000));
        assert_eq!(reveal.max_duration, Some(Duration::from_secs(120)));

        assert_eq!(c.batch_delay(), Some(Duration::from_millis(2500)));
        assert_eq!(c.output.as_deref(), Some(Path::new("out/data.json")));
    }

    #[test]
    fn partial_config_keeps_base_values() {
        let c = Config::parse("step_size = 50").unwrap();
        let base = RevealConfig::new().poll_interval(Duration::from_millis(700)).max_ticks(3);

        let reveal = c.reveal_config(base);
        assert_eq!(reveal.step_size, 50);
        assert_eq!(reveal.poll_interval, Duration::from_millis(700));
        assert_eq!(reveal.max_ticks, Some(3));
    }

    #[test]
    fn unknown_key_errors() {
        assert!(Config::parse("user_agent = \"x\"").is_err());
        assert!(Config::parse("step_size = [").is_err());
    }

    #[test]
    fn explicit_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(dir.path().join("nope.toml").as_path()));
        assert!(matches!(result, Err(ScrapeError::Io { .. })));
    }

    #[test]
    fn explicit_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.toml");
        std::fs::write(&path, "headless = false\nbatch_delay_ms = 0").unwrap();

        let c = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(c.headless, Some(false));
        assert_eq!(c.batch_delay(), Some(Duration::ZERO));
    }
}
