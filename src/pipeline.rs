//! Scrape pipeline: navigation → extraction → (caller) persistence
//!
//! Each stage hands explicit data to the next: a [`PageSource`] turns a
//! [`PageRequest`] into a [`PageSnapshot`], the [`Extractor`] turns the snapshot
//! into a [`Record`]. The source owns the browser session; [`Pipeline::run`] and
//! [`Pipeline::run_batch`] close it on every exit path.

use crate::browser::{BrowserSession, LaunchOptions};
use crate::error::{Result, ScrapeError};
use crate::extract::{Extractor, PageSnapshot, Record};
use crate::reveal::RevealConfig;
use crate::schema::Schema;
use std::collections::HashMap;
use std::time::Duration;

/// What the navigation stage needs to produce a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,

    /// Element that must appear before capture
    pub landmark: Option<String>,

    pub landmark_timeout: Duration,

    /// Scroll to the bottom with this policy before capture
    pub reveal: Option<RevealConfig>,
}

/// Navigation stage: loads a page and captures its rendered HTML
pub trait PageSource {
    fn load(&mut self, request: &PageRequest) -> Result<PageSnapshot>;

    /// Release whatever the source holds; called once when the pipeline is done with it
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Live browser source
pub struct BrowserSource {
    session: BrowserSession,
}

impl BrowserSource {
    pub fn new(session: BrowserSession) -> Self {
        Self { session }
    }

    /// Launch a browser and wrap it
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        Ok(Self::new(BrowserSession::launch(options)?))
    }

    pub fn session(&self) -> &BrowserSession {
        &self.session
    }
}

impl PageSource for BrowserSource {
    fn load(&mut self, request: &PageRequest) -> Result<PageSnapshot> {
        self.session.navigate(&request.url)?;

        if let Some(landmark) = &request.landmark {
            self.session.wait_for_landmark(landmark, request.landmark_timeout)?;
        }

        if let Some(config) = &request.reveal {
            self.session.reveal(config)?;
        }

        let html = self.session.content()?;
        Ok(PageSnapshot::new(self.session.current_url(), html))
    }

    fn close(&mut self) -> Result<()> {
        self.session.close()
    }
}

/// Source serving pre-captured documents by URL, for offline runs and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pages: HashMap<String, String>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: register a document for `url`
    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }
}

impl PageSource for StaticSource {
    fn load(&mut self, request: &PageRequest) -> Result<PageSnapshot> {
        let html = self
            .pages
            .get(&request.url)
            .ok_or_else(|| ScrapeError::NavigationFailed(format!("No document captured for {}", request.url)))?;

        if let Some(landmark) = &request.landmark {
            let selector = scraper::Selector::parse(landmark)
                .map_err(|e| ScrapeError::InvalidSchema(format!("landmark: {}", e)))?;
            if scraper::Html::parse_document(html).select(&selector).next().is_none() {
                return Err(ScrapeError::LandmarkNotFound {
                    selector: landmark.clone(),
                    timeout: request.landmark_timeout,
                });
            }
        }

        Ok(PageSnapshot::new(request.url.clone(), html.clone()))
    }
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Records of targets that succeeded, in target order
    pub records: Vec<Record>,

    /// Targets that failed, with the error message
    pub failures: Vec<(String, String)>,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}

/// Schema-bound scraper that drives a [`PageSource`]
pub struct Pipeline {
    extractor: Extractor,
    reveal: RevealConfig,
    batch_delay: Duration,
}

impl Pipeline {
    /// Build a pipeline for `schema`, taking its reveal policy if it has one
    pub fn new(schema: Schema) -> Result<Self> {
        let reveal = schema.reveal_config.clone().unwrap_or_default();
        reveal.validate()?;

        Ok(Self { extractor: Extractor::new(schema)?, reveal, batch_delay: Duration::from_secs(1) })
    }

    /// Builder method: override the reveal policy, rejecting an invalid one up front
    pub fn reveal_config(mut self, config: RevealConfig) -> Result<Self> {
        config.validate()?;
        self.reveal = config;
        Ok(self)
    }

    /// Builder method: pause between batch targets
    pub fn batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn schema(&self) -> &Schema {
        self.extractor.schema()
    }

    /// Navigation request for `url` according to the schema
    pub fn request(&self, url: &str) -> PageRequest {
        let schema = self.schema();
        PageRequest {
            url: url.to_string(),
            landmark: schema.landmark.clone(),
            landmark_timeout: schema.landmark_timeout(),
            reveal: schema.reveal.then(|| self.reveal.clone()),
        }
    }

    /// Load and extract one page, leaving the source open
    pub fn scrape<S: PageSource + ?Sized>(&self, source: &mut S, url: &str) -> Result<Record> {
        let snapshot = source.load(&self.request(url))?;
        self.extractor.extract(&snapshot)
    }

    /// Scrape a single page, then close the source whether or not the scrape succeeded
    pub fn run<S: PageSource>(&self, mut source: S, url: &str) -> Result<Record> {
        log::info!("Scraping {} with schema '{}'", url, self.schema().name);

        let result = self.scrape(&mut source, url);
        release(&mut source);
        result
    }

    /// Scrape every target in order with one source; failing targets are logged and skipped
    pub fn run_batch<S: PageSource>(&self, mut source: S, urls: &[String]) -> BatchReport {
        let mut report = BatchReport::default();

        for (i, url) in urls.iter().enumerate() {
            if i > 0 && !self.batch_delay.is_zero() {
                std::thread::sleep(self.batch_delay);
            }

            log::info!("[{}/{}] {}", i + 1, urls.len(), url);
            match self.scrape(&mut source, url) {
                Ok(record) => report.records.push(record),
                Err(e) => {
                    log::warn!("Skipping {}: {}", url, e);
                    report.failures.push((url.clone(), e.to_string()));
                }
            }
        }

        release(&mut source);
        log::info!("Batch finished: {} succeeded, {} failed", report.records.len(), report.failures.len());
        report
    }
}

fn release<S: PageSource + ?Sized>(source: &mut S) {
    if let Err(e) = source.close() {
        log::warn!("Failed to release page source: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::presets;

    const PROFILE: &str = r#"<h1 class="heading">OpenAI</h1><a class="website-link" href="https://openai.com/">site</a>"#;

    /// Wraps a source and records whether it was closed
    struct Tracked<S> {
        inner: S,
        closed: std::rc::Rc<std::cell::Cell<bool>>,
    }

    impl<S: PageSource> PageSource for Tracked<S> {
        fn load(&mut self, request: &PageRequest) -> Result<PageSnapshot> {
            self.inner.load(request)
        }

        fn close(&mut self) -> Result<()> {
            self.closed.set(true);
            Ok(())
        }
    }

    fn tracked<S>(inner: S) -> (Tracked<S>, std::rc::Rc<std::cell::Cell<bool>>) {
        let closed = std::rc::Rc::new(std::cell::Cell::new(false));
        (Tracked { inner, closed: closed.clone() }, closed)
    }

    fn crunchbase() -> Pipeline {
        Pipeline::new(presets::by_name("crunchbase").unwrap()).unwrap().batch_delay(Duration::ZERO)
    }

    #[test]
    fn test_request_follows_schema() {
        let pipeline = crunchbase();
        let request = pipeline.request("https://x.test/a");

        assert_eq!(request.landmark.as_deref(), Some(r#"h1[class*="heading"]"#));
        assert_eq!(request.landmark_timeout, Duration::from_secs(15));
        assert!(request.reveal.is_none());

        let directory = Pipeline::new(presets::by_name("yc-directory").unwrap())
            .unwrap()
            .reveal_config(RevealConfig::new().step_size(300))
            .unwrap();
        assert_eq!(directory.request("https://x.test").reveal.unwrap().step_size, 300);
    }

    #[test]
    fn test_run_extracts_and_closes() {
        let (source, closed) = tracked(StaticSource::new().with_page("https://x.test/openai", PROFILE));
        let record = crunchbase().run(source, "https://x.test/openai").unwrap();

        assert_eq!(record.get_str("name"), Some("OpenAI"));
        assert_eq!(record.get_str("website"), Some("https://openai.com/"));
        assert!(closed.get());
    }

    #[test]
    fn test_missing_landmark_still_closes() {
        let (source, closed) = tracked(StaticSource::new().with_page("https://x.test/empty", "<p>blocked</p>"));
        let err = crunchbase().run(source, "https://x.test/empty").unwrap_err();

        assert!(matches!(err, ScrapeError::LandmarkNotFound { .. }));
        assert!(closed.get());
    }

    #[test]
    fn test_navigation_failure_still_closes() {
        let (source, closed) = tracked(StaticSource::new());
        let err = crunchbase().run(source, "https://x.test/unknown").unwrap_err();

        assert!(matches!(err, ScrapeError::NavigationFailed(_)));
        assert!(closed.get());
    }

    #[test]
    fn test_batch_skips_failures() {
        let source = StaticSource::new()
            .with_page("https://x.test/a", PROFILE)
            .with_page("https://x.test/b", "<p>no heading</p>")
            .with_page("https://x.test/c", r#"<h1 class="heading">Other</h1>"#);
        let (source, closed) = tracked(source);
        let urls: Vec<String> = ["a", "b", "c", "d"].iter().map(|p| format!("https://x.test/{p}")).collect();

        let report = crunchbase().run_batch(source, &urls);

        assert_eq!(report.attempted(), 4);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].get_str("name"), Some("Other"));
        let failed: Vec<&str> = report.failures.iter().map(|(url, _)| url.as_str()).collect();
        assert_eq!(failed, vec!["https://x.test/b", "https://x.test/d"]);
        assert!(closed.get());
    }

    #[test]
    fn test_invalid_reveal_override_rejected_without_reveal() {
        // crunchbase never scrolls, the policy is still checked before any page loads
        let zero_step = crunchbase().reveal_config(RevealConfig::new().step_size(0));
        assert!(matches!(zero_step, Err(ScrapeError::InvalidConfig(_))));

        let zero_interval = crunchbase().reveal_config(RevealConfig::new().poll_interval(Duration::ZERO));
        assert!(matches!(zero_interval, Err(ScrapeError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_reveal_policy_rejected() {
        let mut schema = presets::by_name("yc-directory").unwrap();
        schema.reveal_config = Some(RevealConfig::new().step_size(0));
        assert!(Pipeline::new(schema).is_err());
    }
}
