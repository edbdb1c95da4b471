use crate::{browser::config::{ConnectionOptions, LaunchOptions},
            browser::surface::TabSurface,
            error::{Result, ScrapeError},
            reveal::{self, RevealConfig, ScrollProgress}};
use headless_chrome::{Browser, Tab};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};

/// Browser session that owns a Chrome/Chromium instance and the tab it scrapes with
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,

    /// Tab all navigation and extraction happens in
    tab: Arc<Tab>,

    /// Network settle wait applied after every navigation; zero skips it
    network_idle_timeout: Duration,
}

/// Quiet period the resource count must hold before the network counts as idle
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// Polling step of the network idle check
const NETWORK_IDLE_POLL: Duration = Duration::from_millis(100);

/// Outcome of the in-page network idle check
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct IdleReport {
    ok: bool,
    resource_count: u64,
    waited_ms: u64,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Keep the browser alive for long batch runs (default is 30 seconds of inactivity)
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.sandbox = options.sandbox;

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        let browser = Browser::new(launch_opts).map_err(|e| ScrapeError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| ScrapeError::LaunchFailed(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(options.navigation_timeout);

        log::info!(
            "Launched {} browser ({}x{})",
            if options.headless { "headless" } else { "headed" },
            options.window_width,
            options.window_height
        );

        Ok(Self { browser, tab, network_idle_timeout: options.network_idle_timeout })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser =
            Browser::connect(options.ws_url.clone()).map_err(|e| ScrapeError::ConnectionFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| ScrapeError::ConnectionFailed(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(Duration::from_millis(options.timeout));

        log::info!("Connected to browser at {}", options.ws_url);

        Ok(Self { browser, tab, network_idle_timeout: options.network_idle_timeout })
    }

    /// Launch a browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default())
    }

    /// Get the scraping tab
    pub fn tab(&self) -> Arc<Tab> {
        self.tab.clone()
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate to a URL, wait for the load event, then for network activity to settle
    pub fn navigate(&self, url: &str) -> Result<()> {
        log::info!("Navigating to {}", url);

        self.tab
            .navigate_to(url)
            .map_err(|e| ScrapeError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        self.wait_for_navigation()?;

        if !self.network_idle_timeout.is_zero() {
            self.wait_for_network_idle(self.network_idle_timeout)?;
        }
        Ok(())
    }

    /// Wait until no new resources have been requested for a short quiet window.
    ///
    /// Returns `false` if the page was still loading resources when `timeout` ran out;
    /// that is logged and otherwise not treated as an error.
    pub fn wait_for_network_idle(&self, timeout: Duration) -> Result<bool> {
        let result = self
            .tab
            .evaluate(&network_idle_script(timeout, NETWORK_IDLE_WINDOW, NETWORK_IDLE_POLL), true)
            .map_err(|e| ScrapeError::EvaluationFailed(format!("Network idle check failed: {}", e)))?;

        let report = result
            .value
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ScrapeError::EvaluationFailed("Network idle check returned no report".to_string()))
            .and_then(|raw| Ok(serde_json::from_str::<IdleReport>(raw)?))?;

        if report.ok {
            log::debug!("Network idle after {}ms ({} resources)", report.waited_ms, report.resource_count);
        } else {
            log::warn!(
                "Network still busy after {}ms ({} resources), capturing anyway",
                report.waited_ms,
                report.resource_count
            );
        }
        Ok(report.ok)
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab
            .wait_until_navigated()
            .map_err(|e| ScrapeError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Wait until an element matching `selector` is present, or fail with `LandmarkNotFound`
    pub fn wait_for_landmark(&self, selector: &str, timeout: Duration) -> Result<()> {
        log::debug!("Waiting up to {:?} for landmark '{}'", timeout, selector);

        self.tab.wait_for_element_with_custom_timeout(selector, timeout).map_err(|e| {
            log::debug!("Landmark lookup failed: {}", e);
            ScrapeError::LandmarkNotFound { selector: selector.to_string(), timeout }
        })?;

        Ok(())
    }

    /// Scroll the page step by step until lazily loaded content stops growing
    pub fn reveal(&self, config: &RevealConfig) -> Result<ScrollProgress> {
        let mut surface = TabSurface::new(&self.tab);
        let progress = reveal::reveal(&mut surface, config)?;

        log::info!("Revealed page in {} scroll steps ({}px)", progress.ticks, progress.distance_covered);
        Ok(progress)
    }

    /// Evaluate a JavaScript expression and return its JSON value
    pub fn evaluate(&self, expression: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(expression, false)
            .map_err(|e| ScrapeError::EvaluationFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    /// Serialized HTML of the current document, including content rendered by scripts
    pub fn content(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| ScrapeError::EvaluationFailed(format!("Failed to read page content: {}", e)))
    }

    /// URL of the current document (after redirects)
    pub fn current_url(&self) -> String {
        self.tab.get_url()
    }

    /// Close the scraping tab
    ///
    /// The browser process itself exits when the session is dropped.
    pub fn close(&self) -> Result<()> {
        self.tab
            .close(false)
            .map_err(|e| ScrapeError::TabOperationFailed(format!("Failed to close tab: {}", e)))?;

        log::debug!("Closed browser tab");
        Ok(())
    }
}

/// In-page check: resolves once `document.readyState` is complete and the resource
/// timing entry count has held still for `idle`, or when `timeout` runs out.
/// The report comes back as a JSON string so it survives evaluation by value.
fn network_idle_script(timeout: Duration, idle: Duration, poll: Duration) -> String {
    format!(
        r#"(async () => {{
    const timeoutMs = {timeout_ms}, idleMs = {idle_ms}, pollMs = {poll_ms};
    const count = () => {{ try {{ return performance.getEntriesByType('resource').length; }} catch (_) {{ return 0; }} }};
    const start = Date.now();
    let last = count(), stable = 0;
    while (Date.now() - start < timeoutMs) {{
        await new Promise(r => setTimeout(r, pollMs));
        const current = count();
        if (document.readyState === 'complete' && current === last) {{
            stable += pollMs;
            if (stable >= idleMs) {{
                return JSON.stringify({{ ok: true, resourceCount: current, waitedMs: Date.now() - start }});
            }}
        }} else {{
            stable = 0;
        }}
        last = current;
    }}
    return JSON.stringify({{ ok: false, resourceCount: last, waitedMs: Date.now() - start }});
}})()"#,
        timeout_ms = timeout.as_millis(),
        idle_ms = idle.as_millis(),
        poll_ms = poll.as_millis().max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_options_builder() {
        let opts = LaunchOptions::new()
            .headless(false)
            .window_size(800, 600)
            .sandbox(false)
            .navigation_timeout(Duration::from_secs(15));

        assert!(!opts.headless);
        assert!(!opts.sandbox);
        assert_eq!(opts.window_width, 800);
        assert_eq!(opts.window_height, 600);
        assert_eq!(opts.navigation_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_connection_options() {
        let opts = ConnectionOptions::new("ws://localhost:9222").timeout(5000);

        assert_eq!(opts.ws_url, "ws://localhost:9222");
        assert_eq!(opts.timeout, 5000);
    }

    #[test]
    fn test_network_idle_script_embeds_timings() {
        let script = network_idle_script(Duration::from_secs(10), Duration::from_millis(500), Duration::from_millis(100));

        assert!(script.contains("timeoutMs = 10000, idleMs = 500, pollMs = 100"));
        assert!(script.contains("getEntriesByType('resource')"));
        assert!(script.starts_with("(async () =>"));
    }

    #[test]
    fn test_network_idle_script_never_polls_at_zero() {
        let script = network_idle_script(Duration::from_secs(1), Duration::ZERO, Duration::ZERO);
        assert!(script.contains("pollMs = 1;"));
    }

    #[test]
    fn test_idle_report_parses() {
        let report: IdleReport = serde_json::from_str(r#"{"ok":false,"resourceCount":12,"waitedMs":10003}"#).unwrap();
        assert_eq!(report, IdleReport { ok: false, resource_count: 12, waited_ms: 10003 });
    }

    #[test]
    fn test_network_idle_defaults() {
        assert_eq!(LaunchOptions::default().network_idle_timeout, Duration::from_secs(10));
        assert!(
            LaunchOptions::new().network_idle_timeout(Duration::ZERO).network_idle_timeout.is_zero()
        );
        assert_eq!(
            ConnectionOptions::new("ws://x").network_idle_timeout(Duration::from_secs(3)).network_idle_timeout,
            Duration::from_secs(3)
        );
    }

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // Ignore by default, run with: cargo test -- --ignored
    fn test_launch_browser() {
        let result = BrowserSession::launch(LaunchOptions::new().headless(true));
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_navigate() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");

        let result = session.navigate("about:blank");
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_missing_landmark() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");
        session.navigate("data:text/html,<html><body><p>nothing here</p></body></html>").expect("Failed to navigate");

        let result = session.wait_for_landmark("h1.profile-name", Duration::from_millis(500));
        assert!(matches!(result, Err(ScrapeError::LandmarkNotFound { .. })));
    }
}
