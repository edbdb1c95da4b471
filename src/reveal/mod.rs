//! Incremental page revealer
//!
//! Pages that load content on scroll (infinite lists, lazy-loaded sections) only
//! render entries once they get near the viewport. A single jump to the bottom
//! undershoots, because the height measured before the jump does not include the
//! content the jump itself triggers. The revealer instead scrolls in small steps
//! and re-measures the document height on every tick, stopping once the covered
//! distance reaches `scroll_height - viewport_height`.
//!
//! The loop is written against two small traits so it can be driven by a live
//! browser tab ([`crate::browser::TabSurface`]) or by a simulated page in tests:
//! - [`ScrollSurface`]: reads heights and scrolls
//! - [`Clock`]: sleeps between ticks and reports elapsed time

pub mod config;

pub use config::{DEFAULT_POLL_INTERVAL, DEFAULT_STEP_SIZE, RevealConfig};

use crate::error::{Result, ScrapeError};
use serde::Serialize;
use std::time::{Duration, Instant};

/// A scrollable viewport whose content may grow while it is scrolled
pub trait ScrollSurface {
    /// Current total scrollable height of the content
    fn scroll_height(&self) -> Result<u64>;

    /// Current visible height of the viewport
    fn viewport_height(&self) -> Result<u64>;

    /// Shift the scroll offset down by `delta` pixels
    fn scroll_by(&mut self, delta: u64) -> Result<()>;
}

/// Time source for the reveal loop
pub trait Clock {
    /// Time elapsed since the clock was created
    fn elapsed(&self) -> Duration;

    /// Block for `duration`
    fn sleep(&mut self, duration: Duration);
}

/// Wall clock backed by [`std::thread::sleep`]
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Progress of a single reveal call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrollProgress {
    /// Total pixels scrolled so far
    pub distance_covered: u64,

    /// Pixels added per tick
    pub step_size: u64,

    /// Pause between ticks
    pub poll_interval: Duration,

    /// Number of scroll steps issued
    pub ticks: u64,
}

impl ScrollProgress {
    fn new(config: &RevealConfig) -> Self {
        Self { distance_covered: 0, step_size: config.step_size, poll_interval: config.poll_interval, ticks: 0 }
    }

    /// Whether the covered distance has reached the bottom for the given measurements
    pub fn reached_bottom(&self, scroll_height: u64, viewport_height: u64) -> bool {
        self.distance_covered >= scroll_height.saturating_sub(viewport_height)
    }

    fn advance(&mut self) {
        self.distance_covered += self.step_size;
        self.ticks += 1;
    }
}

/// Scroll `surface` to the bottom of its content using the real clock
pub fn reveal<S: ScrollSurface + ?Sized>(surface: &mut S, config: &RevealConfig) -> Result<ScrollProgress> {
    reveal_with_clock(surface, &mut SystemClock::new(), config)
}

/// Scroll `surface` to the bottom of its content, one step per tick.
///
/// Each tick re-reads the scroll height, so content that loads in response to
/// scrolling extends the run. Without `max_ticks`/`max_duration` the loop only
/// stops once the page stops growing; a page that grows forever never returns.
///
/// # Errors
/// - [`ScrapeError::InvalidConfig`] for a zero step or poll interval
/// - [`ScrapeError::RevealTimeout`] when a configured guard is exceeded
/// - any error raised by the surface
pub fn reveal_with_clock<S, C>(surface: &mut S, clock: &mut C, config: &RevealConfig) -> Result<ScrollProgress>
where
    S: ScrollSurface + ?Sized,
    C: Clock + ?Sized,
{
    config.validate()?;

    let started = clock.elapsed();
    let mut progress = ScrollProgress::new(config);

    loop {
        let scroll_height = surface.scroll_height()?;
        let viewport_height = surface.viewport_height()?;

        if progress.reached_bottom(scroll_height, viewport_height) {
            log::debug!(
                "Reveal finished after {} ticks ({}px, page height {}px)",
                progress.ticks,
                progress.distance_covered,
                scroll_height
            );
            return Ok(progress);
        }

        let elapsed = clock.elapsed().saturating_sub(started);
        let ticks_exhausted = config.max_ticks.is_some_and(|max| progress.ticks >= max);
        let time_exhausted = config.max_duration.is_some_and(|max| elapsed >= max);
        if ticks_exhausted || time_exhausted {
            log::warn!(
                "Reveal gave up at {}px of {}px after {} ticks",
                progress.distance_covered,
                scroll_height.saturating_sub(viewport_height),
                progress.ticks
            );
            return Err(ScrapeError::RevealTimeout {
                ticks: progress.ticks,
                distance: progress.distance_covered,
                elapsed,
            });
        }

        surface.scroll_by(config.step_size)?;
        progress.advance();
        log::trace!("tick {}: {}px of {}px", progress.ticks, progress.distance_covered, scroll_height);

        clock.sleep(config.poll_interval);
    }
}
