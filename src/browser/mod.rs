//! Headless browser session management
//!
//! Wraps `headless_chrome` with the handful of operations a scrape needs:
//! launch or connect, navigate, wait for a landmark element, scroll the page
//! with the [`crate::reveal`] loop and capture the rendered HTML.

pub mod config;
pub mod session;
pub mod surface;

pub use config::{ConnectionOptions, LaunchOptions};
pub use session::BrowserSession;
pub use surface::TabSurface;
