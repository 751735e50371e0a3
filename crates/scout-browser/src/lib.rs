//! Browser automation for JavaScript-driven listing sites.
//!
//! Exposes the [`AutomationSurface`] capability the scanner drives, and a
//! Chromium implementation with a randomized fingerprint and channel-backed
//! response interception.

pub mod actions;
pub mod engine;
pub mod error;
pub mod fingerprint;
mod intercept;

pub use actions::{
    same_location, AutomationSurface, ElementHandle, ElementState, ExchangeOutcome,
    InterceptedExchange, ResponseStream, SurfaceLauncher, WaitPolicy,
};
pub use engine::{ChromiumLauncher, ChromiumSurface, LaunchOptions};
pub use error::{BrowserError, Result};
