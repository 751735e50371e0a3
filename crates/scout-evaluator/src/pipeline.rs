//! Evaluation pipeline: a fixed pool of workers over one bounded queue.
//!
//! The caller's batch is fed into a queue of capacity `C` consumed by `C`
//! workers. Feeding suspends while the queue is full. Once the whole batch is
//! enqueued the pipeline waits until every item has been acknowledged, then
//! cancels the idle workers and joins them.
//!
//! A worker that fails to score or persist an item stops after acknowledging
//! it. The remaining workers carry on; the failure is reported in
//! [`EvaluationReport::failures`].

use crate::error::{EvalError, Result};
use crate::queue::{Ack, WorkQueue};
use async_trait::async_trait;
use futures::FutureExt;
use scout_core::{ItemId, JobEvaluation, JobListing};
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Scores one listing against a reference document.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Produce an evaluation, or [`EvalError::ScoringOutput`] when the
    /// underlying model returns nothing usable.
    async fn score(&self, reference: &str, listing: &JobListing) -> Result<JobEvaluation>;
}

/// Persists evaluations.
#[async_trait]
pub trait EvaluationStore: Send + Sync {
    /// Insert or replace the evaluation for its listing.
    async fn save_evaluation(&self, evaluation: &JobEvaluation) -> Result<()>;
}

/// Why a worker stopped early.
#[derive(Debug)]
pub struct WorkerFailure {
    /// Worker index, `None` if the task panicked
    pub worker: Option<usize>,
    /// Listing the worker was processing
    pub job_id: Option<ItemId>,
    /// Underlying error
    pub error: EvalError,
}

/// Outcome of one [`EvaluationPipeline::evaluate`] call.
#[derive(Debug, Default)]
pub struct EvaluationReport {
    /// Listings in the batch
    pub total: usize,
    /// Listings scored and persisted
    pub scored: usize,
    /// Workers that died, one entry each
    pub failures: Vec<WorkerFailure>,
}

impl EvaluationReport {
    /// Every listing was scored and no worker died.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.scored == self.total
    }

    fn record(&mut self, joined: std::result::Result<WorkerExit, JoinError>) {
        match joined {
            Ok(exit) => {
                self.scored += exit.scored;
                if let Some(failure) = exit.failure {
                    self.failures.push(failure);
                }
            }
            Err(e) => {
                tracing::error!("Evaluation worker ended abnormally: {}", e);
                self.failures.push(WorkerFailure {
                    worker: None,
                    job_id: None,
                    error: EvalError::WorkerAborted(e.to_string()),
                });
            }
        }
    }
}

/// Bounded-concurrency evaluation of a finite batch.
pub struct EvaluationPipeline {
    scorer: Arc<dyn Scorer>,
    store: Arc<dyn EvaluationStore>,
    concurrency: usize,
}

impl EvaluationPipeline {
    /// Create a pipeline running `concurrency` workers.
    pub fn new(
        scorer: Arc<dyn Scorer>,
        store: Arc<dyn EvaluationStore>,
        concurrency: usize,
    ) -> Result<Self> {
        if concurrency == 0 {
            return Err(EvalError::InvalidConcurrency(concurrency));
        }
        Ok(Self {
            scorer,
            store,
            concurrency,
        })
    }

    /// Number of workers.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Score and persist every listing in `batch`.
    ///
    /// Returns once the batch has drained. Fails with
    /// [`EvalError::WorkersExhausted`] if every worker dies first.
    pub async fn evaluate(&self, reference: &str, batch: Vec<JobListing>) -> Result<EvaluationReport> {
        let mut report = EvaluationReport {
            total: batch.len(),
            ..EvaluationReport::default()
        };
        tracing::info!(
            total = report.total,
            concurrency = self.concurrency,
            "Evaluating batch"
        );

        let queue = Arc::new(WorkQueue::new(self.concurrency));
        let reference: Arc<str> = Arc::from(reference);
        let cancel = CancellationToken::new();

        let mut workers = JoinSet::new();
        for id in 0..self.concurrency {
            let worker = Worker {
                id,
                queue: queue.clone(),
                scorer: self.scorer.clone(),
                store: self.store.clone(),
                reference: reference.clone(),
                cancel: cancel.clone(),
            };
            workers.spawn(
                worker
                    .run()
                    .instrument(tracing::info_span!("evaluation_worker", worker = id)),
            );
        }

        let feed = {
            let queue = queue.clone();
            async move {
                for listing in batch {
                    queue.put(listing).await?;
                }
                queue.join().await;
                Ok::<(), EvalError>(())
            }
        };
        tokio::pin!(feed);

        let mut alive = self.concurrency;
        loop {
            tokio::select! {
                fed = &mut feed => {
                    fed?;
                    break;
                }
                Some(joined) = workers.join_next(), if alive > 0 => {
                    alive -= 1;
                    report.record(joined);
                    if alive == 0 {
                        // The last item may have been acknowledged just before the worker died
                        if let Some(fed) = (&mut feed).now_or_never() {
                            fed?;
                            break;
                        }
                        cancel.cancel();
                        tracing::error!(
                            unfinished = queue.unfinished(),
                            "Every evaluation worker failed"
                        );
                        return Err(EvalError::WorkersExhausted {
                            failures: report.failures,
                        });
                    }
                }
            }
        }

        cancel.cancel();
        while let Some(joined) = workers.join_next().await {
            report.record(joined);
        }

        tracing::info!(
            total = report.total,
            scored = report.scored,
            failed_workers = report.failures.len(),
            "Batch drained"
        );
        Ok(report)
    }
}

struct WorkerExit {
    scored: usize,
    failure: Option<WorkerFailure>,
}

struct Worker {
    id: usize,
    queue: Arc<WorkQueue<JobListing>>,
    scorer: Arc<dyn Scorer>,
    store: Arc<dyn EvaluationStore>,
    reference: Arc<str>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) -> WorkerExit {
        let mut scored = 0;
        loop {
            let listing = tokio::select! {
                () = self.cancel.cancelled() => break,
                next = self.queue.take() => match next {
                    Some(listing) => listing,
                    None => break,
                },
            };

            let _ack = Ack(self.queue.as_ref());
            match self.process(&listing).await {
                Ok(evaluation) => {
                    scored += 1;
                    tracing::info!(
                        job_id = %listing.job_id,
                        total = evaluation.total(),
                        "Listing evaluated"
                    );
                }
                Err(error) => {
                    tracing::warn!(job_id = %listing.job_id, "Worker stopping: {}", error);
                    return WorkerExit {
                        scored,
                        failure: Some(WorkerFailure {
                            worker: Some(self.id),
                            job_id: Some(listing.job_id),
                            error,
                        }),
                    };
                }
            }
        }

        tracing::debug!(scored, "Worker finished");
        WorkerExit {
            scored,
            failure: None,
        }
    }

    async fn process(&self, listing: &JobListing) -> Result<JobEvaluation> {
        tracing::debug!(job_id = %listing.job_id, "Scoring listing");
        let evaluation = self.scorer.score(&self.reference, listing).await?;
        self.store.save_evaluation(&evaluation).await?;
        Ok(evaluation)
    }
}
