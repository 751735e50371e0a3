//! Scout Scanner - session recovery and listing discovery.
//!
//! This crate drives an authenticated [`scout_browser::AutomationSurface`]
//! over a paginated, JavaScript-rendered listing page. It restores saved
//! sessions (falling back to interactive login), clicks through job cards,
//! intercepts the list and detail JSON responses and joins them into
//! normalized [`scout_core::JobListing`]s.
//!
//! # Features
//!
//! - Cookie-based session restore with a visible-browser login fallback
//! - Lazy, bounded stream of listings with list/detail correlation
//! - Pluggable listing filter and pacing between clicks
//! - Early termination when the list runs out of results
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use scout_scanner::{DiscoveryEngine, DiscoveryOptions, SessionManager, SiteUrls};
//!
//! let urls = SiteUrls::new(&config.site.base_url)?;
//! let session = SessionManager::new(surface.clone(), launcher, urls.clone(), config.session);
//! let credentials = session.login(saved).await?;
//!
//! let engine = DiscoveryEngine::new(surface, urls, DiscoveryOptions::from(&config.discovery));
//! let mut listings = Box::pin(engine.discover(from_url, 20).into_stream());
//! while let Some(listing) = listings.next().await {
//!     println!("{}", listing?.job_name);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod correlation;
#[allow(missing_docs)]
pub mod engine;
#[allow(missing_docs)]
pub mod error;
#[allow(missing_docs)]
pub mod filter;
#[allow(missing_docs)]
pub mod parser;
pub mod session;
#[allow(missing_docs)]
pub mod url_builder;

// Re-export commonly used types
pub use correlation::Correlator;
pub use engine::{DiscoveryEngine, DiscoveryOptions, DiscoveryRun};
pub use error::{CorrelationError, Result, ScanError};
pub use filter::{AcceptAll, ListingFilter, NoPacing, Pacer, RandomPacer, RecruiterActivityFilter};
pub use parser::{ListPage, ListingDetail, ListingSummary};
pub use session::{SessionManager, SessionState};
pub use url_builder::SiteUrls;
