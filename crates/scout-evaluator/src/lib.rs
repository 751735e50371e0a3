//! Scout Evaluator - bounded-concurrency scoring of discovered listings.
//!
//! A batch of [`scout_core::JobListing`]s is pushed through a fixed pool of
//! workers sharing one bounded queue. Each worker scores a listing against a
//! reference document with a [`Scorer`] and persists the result through an
//! [`EvaluationStore`]. [`scout_db::Database`] implements the store and
//! [`LlmScorer`] implements the scorer on top of any
//! [`scout_llm::LlmProvider`].
//!
//! # Example
//!
//! ```rust,ignore
//! use scout_evaluator::{EvaluationPipeline, LlmScorer};
//! use std::sync::Arc;
//!
//! let scorer = Arc::new(LlmScorer::new(provider).with_temperature(0.2));
//! let pipeline = EvaluationPipeline::new(scorer, Arc::new(db), 4)?;
//! let report = pipeline.evaluate(&resume, batch).await?;
//! println!("{}/{} scored", report.scored, report.total);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod error;
pub mod pipeline;
pub mod prompt;
mod queue;
pub mod scorer;
mod store;

pub use error::{EvalError, Result};
pub use pipeline::{EvaluationPipeline, EvaluationReport, EvaluationStore, Scorer, WorkerFailure};
pub use scorer::LlmScorer;
