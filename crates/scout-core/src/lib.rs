//! Scout Core - Foundation crate for the Scout job discovery pipeline.
//!
//! This crate provides shared types, error handling and configuration
//! management that all other Scout crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared domain types (`ItemId`, `Credential`, `JobListing`, `JobEvaluation`, `Timestamp`)
//!
//! # Example
//!
//! ```rust
//! use scout_core::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! config.validate()?;
//! assert_eq!(config.evaluation.concurrency, 7);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    AppConfig, BrowserConfig, DatabaseConfig, DiscoveryConfig, EvaluationConfig, LlmConfig,
    SessionConfig, SiteConfig,
};
pub use error::{ConfigError, ConfigResult, Result, ScoutError};
pub use types::{
    Credential, DimensionScore, ItemId, JobEvaluation, JobListing, SameSite, Timestamp,
};
