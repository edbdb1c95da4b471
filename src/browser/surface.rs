use crate::error::{Result, ScrapeError};
use crate::reveal::ScrollSurface;
use headless_chrome::Tab;

const SCROLL_HEIGHT_JS: &str = "(document.body || document.documentElement).scrollHeight";
const VIEWPORT_HEIGHT_JS: &str = "window.innerHeight";

/// [`ScrollSurface`] backed by the window of a live browser tab
pub struct TabSurface<'a> {
    tab: &'a Tab,
}

impl<'a> TabSurface<'a> {
    pub fn new(tab: &'a Tab) -> Self {
        Self { tab }
    }

    fn evaluate_pixels(&self, expression: &str) -> Result<u64> {
        let result = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| ScrapeError::EvaluationFailed(format!("{}: {}", expression, e)))?;

        let value = result
            .value
            .as_ref()
            .and_then(serde_json::Value::as_f64)
            .ok_or_else(|| ScrapeError::EvaluationFailed(format!("{} did not return a number", expression)))?;

        Ok(pixels(value))
    }
}

impl ScrollSurface for TabSurface<'_> {
    fn scroll_height(&self) -> Result<u64> {
        self.evaluate_pixels(SCROLL_HEIGHT_JS)
    }

    fn viewport_height(&self) -> Result<u64> {
        self.evaluate_pixels(VIEWPORT_HEIGHT_JS)
    }

    fn scroll_by(&mut self, delta: u64) -> Result<()> {
        self.tab
            .evaluate(&format!("window.scrollBy(0, {})", delta), false)
            .map_err(|e| ScrapeError::EvaluationFailed(format!("Failed to scroll: {}", e)))?;

        Ok(())
    }
}

/// Round a CSS pixel measurement to whole pixels; negative or NaN values become 0
fn pixels(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 { value.round() as u64 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixels() {
        assert_eq!(pixels(800.0), 800);
        assert_eq!(pixels(1023.6), 1024);
        assert_eq!(pixels(-5.0), 0);
        assert_eq!(pixels(f64::NAN), 0);
    }
}
