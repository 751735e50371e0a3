//! Error types for the evaluation pipeline.

use crate::pipeline::WorkerFailure;
use thiserror::Error;

/// Errors that can occur while evaluating listings.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The model produced nothing that parses as an evaluation.
    #[error("no well-formed evaluation for {job_id}: {reason}")]
    ScoringOutput {
        /// Listing being scored
        job_id: String,
        /// What was wrong with the output
        reason: String,
    },

    /// LLM provider failure
    #[error("LLM error: {0}")]
    Llm(#[from] scout_llm::LlmError),

    /// Persistence failure
    #[error("database error: {0}")]
    Database(#[from] scout_db::DatabaseError),

    /// Concurrency below one
    #[error("concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    /// Every worker died before the batch drained.
    #[error("all {} workers failed before the batch drained", .failures.len())]
    WorkersExhausted {
        /// Why each worker stopped
        failures: Vec<WorkerFailure>,
    },

    /// A worker task panicked or was aborted.
    #[error("worker task ended abnormally: {0}")]
    WorkerAborted(String),

    /// The work queue stopped accepting items.
    #[error("work queue closed")]
    QueueClosed,
}

/// Result type alias for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;
