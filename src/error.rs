use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while launching, revealing, extracting or persisting
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Failed to launch the browser
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    /// Failed to connect to an existing browser
    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    /// Tab creation, lookup or closing failed
    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    /// Navigation failed or timed out
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// JavaScript evaluation failed or returned an unexpected value
    #[error("JavaScript evaluation failed: {0}")]
    EvaluationFailed(String),

    /// A required landmark element never appeared within the wait budget
    #[error("Landmark '{selector}' did not appear within {}s", .timeout.as_secs_f64())]
    LandmarkNotFound { selector: String, timeout: Duration },

    /// The reveal loop hit its tick or duration guard before reaching the bottom
    #[error("Reveal did not reach the bottom of the page after {ticks} ticks ({distance}px scrolled, {:.1}s elapsed)", .elapsed.as_secs_f64())]
    RevealTimeout { ticks: u64, distance: u64, elapsed: Duration },

    /// The field a schema marks as required was absent from the page
    #[error("Required field '{field}' was not found on {url}")]
    MissingRequiredField { field: String, url: String },

    /// Schema could not be loaded or failed validation
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Configuration or CLI values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Filesystem error with the path involved
    #[error("I/O error on {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ScrapeError {
    /// Helper for wrapping an `std::io::Error` with the path that caused it
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io { path: path.as_ref().display().to_string(), source }
    }
}

/// Result type alias for scraper operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_message() {
        let err = ScrapeError::LandmarkNotFound {
            selector: "h1.profile-name".to_string(),
            timeout: Duration::from_secs(15),
        };
        assert_eq!(err.to_string(), "Landmark 'h1.profile-name' did not appear within 15s");
    }

    #[test]
    fn test_reveal_timeout_message() {
        let err = ScrapeError::RevealTimeout { ticks: 50, distance: 5000, elapsed: Duration::from_millis(5000) };
        let msg = err.to_string();
        assert!(msg.contains("50 ticks"));
        assert!(msg.contains("5000px"));
        assert!(msg.contains("5.0s"));
    }

    #[test]
    fn test_io_helper_keeps_path() {
        let err = ScrapeError::io("/tmp/out.json", std::io::Error::other("disk full"));
        assert!(err.to_string().contains("/tmp/out.json"));
        assert!(err.to_string().contains("disk full"));
    }
}
