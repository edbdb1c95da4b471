//! # company-scrape
//!
//! Scrapes company profile and directory pages with a headless Chrome browser and
//! writes the extracted fields to JSON.
//!
//! ## Features
//!
//! - **Incremental reveal**: scrolls lazily loaded pages step by step, re-measuring the
//!   document height on every tick, until no more content appears
//! - **Schemas as configuration**: field name → CSS selector rules in TOML, with
//!   built-in presets for the supported sites
//! - **Offline extraction**: extraction runs on captured HTML, so saved pages can be
//!   re-processed without a browser
//! - **Batch runs**: many targets through one browser session, skipping failures
//!
//! ## Command line
//!
//! ```bash
//! # Single company profile
//! company-scrape run --preset crunchbase --id openai
//!
//! # Directory with infinite scroll, bounded to two minutes of scrolling
//! company-scrape run --preset yc-directory --max-duration-secs 120
//!
//! # Re-run extraction on a saved page
//! company-scrape extract --preset crunchbase --html saved.html
//! ```
//!
//! ## Library usage
//!
//! ```rust,no_run
//! use company_scrape::{BrowserSource, LaunchOptions, Pipeline, presets};
//! use company_scrape::output::JsonSink;
//!
//! # fn main() -> company_scrape::Result<()> {
//! let pipeline = Pipeline::new(presets::by_name("yc-directory")?)?;
//! let source = BrowserSource::launch(LaunchOptions::default())?;
//!
//! // The browser is closed whether or not the scrape succeeds
//! let record = pipeline.run(source, "https://www.ycombinator.com/companies")?;
//! JsonSink::new("company_urls.json").write_record(&record)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Driving the revealer directly
//!
//! ```rust,no_run
//! use company_scrape::{BrowserSession, LaunchOptions, RevealConfig};
//! use std::time::Duration;
//!
//! # fn main() -> company_scrape::Result<()> {
//! let session = BrowserSession::launch(LaunchOptions::default())?;
//! session.navigate("https://example.com/feed")?;
//!
//! let config = RevealConfig::new().step_size(200).max_duration(Duration::from_secs(60));
//! let progress = session.reveal(&config)?;
//! println!("Scrolled {}px in {} steps", progress.distance_covered, progress.ticks);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`reveal`]: the incremental scroll loop and its policy
//! - [`browser`]: Chrome session management and the tab-backed scroll surface
//! - [`schema`]: extraction schemas and built-in presets
//! - [`extract`]: applying a schema to captured HTML
//! - [`pipeline`]: navigation → extraction stages and batch runs
//! - [`output`]: JSON file writer
//! - [`targets`]: URL normalization, id templates and URL lists
//! - [`config`]: optional run configuration file
//! - [`error`]: error types and result alias

pub mod browser;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod reveal;
pub mod schema;
pub mod targets;

pub use browser::{BrowserSession, ConnectionOptions, LaunchOptions, TabSurface};
pub use error::{Result, ScrapeError};
pub use extract::{Extractor, PageSnapshot, Record};
pub use pipeline::{BatchReport, BrowserSource, PageRequest, PageSource, Pipeline, StaticSource};
pub use reveal::{Clock, RevealConfig, ScrollProgress, ScrollSurface, SystemClock, reveal, reveal_with_clock};
pub use schema::{Arity, FieldRule, Schema, Source, presets};
