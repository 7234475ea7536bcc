//! Driver layer for browser automation.
//!
//! This crate exposes the WebDriver-backed browser session the harvester
//! drives, together with the helpers that keep that session looking like a
//! regular desktop browser.
//!
//! - [`browser::session::BrowserSession`]: the page surface the harvester codes against
//! - [`browser::driver::HarvestDriver`]: WebDriver client wrapper
//! - [`browser::page::HarvestPage`]: fantoccini-backed [`BrowserSession`](browser::session::BrowserSession)
//! - [`browser::behavioral::BehavioralEngine`]: human-like timings
//! - [`browser::stealth`]: stealth profiles and JS evasions
pub mod browser;

pub use browser::driver::{DriverOptions, HarvestDriver};
pub use browser::session::{BrowserSession, DriverError};
