//! `scout evaluate`: score the unevaluated backlog with an LLM.

use anyhow::{bail, Context, Result};
use clap::Args;
use scout_core::AppConfig;
use scout_db::evaluations;
use scout_evaluator::{EvalError, EvaluationPipeline, LlmScorer};
use scout_llm::{LlmModel, OpenAiCompatibleProvider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Resume to score listings against (defaults to `evaluation.reference_document_path`)
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Maximum number of listings to score (defaults to `evaluation.batch_size`)
    #[arg(long)]
    pub count: Option<usize>,

    /// Concurrent scoring workers (defaults to `evaluation.concurrency`)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Model preset (defaults to `llm.model`)
    #[arg(long)]
    pub model: Option<String>,

    /// Provider base URL override
    #[arg(long)]
    pub base_url: Option<String>,

    /// Provider API key (defaults to `SCOUT_LLM_API_KEY`)
    #[arg(long)]
    pub api_key: Option<String>,
}

pub async fn run(config: &AppConfig, args: EvaluateArgs) -> Result<()> {
    let resume_path = args
        .resume
        .or_else(|| config.evaluation.reference_document_path.clone())
        .context("no resume given: pass --resume or set evaluation.reference_document_path")?;
    let resume = std::fs::read_to_string(&resume_path)
        .with_context(|| format!("failed to read resume {}", resume_path.display()))?;
    if resume.trim().is_empty() {
        bail!("resume {} is empty", resume_path.display());
    }

    let model: LlmModel = args
        .model
        .as_deref()
        .unwrap_or(&config.llm.model)
        .parse()?;
    let api_key = args
        .api_key
        .or_else(|| config.llm.api_key.clone())
        .context("no API key: pass --api-key or set SCOUT_LLM_API_KEY")?;
    let provider = OpenAiCompatibleProvider::with_options(
        model,
        api_key,
        args.base_url.or_else(|| config.llm.base_url.clone()),
        Some(config.llm.timeout_secs),
    )?;
    let scorer = LlmScorer::new(Arc::new(provider)).with_temperature(config.llm.temperature);

    let db = super::open_database(config).await?;
    let limit = args.count.unwrap_or(config.evaluation.batch_size);
    let batch = {
        let mut conn = db.pool().acquire().await?;
        evaluations::select_unevaluated(&mut conn, limit).await?
    };
    if batch.is_empty() {
        println!("Nothing to evaluate");
        db.close().await;
        return Ok(());
    }

    let concurrency = args.concurrency.unwrap_or(config.evaluation.concurrency);
    info!(model = %model, batch = batch.len(), concurrency, "Starting evaluation");

    let pipeline = EvaluationPipeline::new(Arc::new(scorer), Arc::new(db.clone()), concurrency)?;
    let outcome = pipeline.evaluate(&resume, batch).await;
    db.close().await;

    let report = match outcome {
        Ok(report) => report,
        Err(EvalError::WorkersExhausted { failures }) => {
            for failure in &failures {
                error!(job_id = ?failure.job_id, "Worker failed: {}", failure.error);
            }
            bail!("every evaluation worker failed; see the log for details");
        }
        Err(e) => return Err(e.into()),
    };

    for failure in &report.failures {
        error!(
            worker = ?failure.worker,
            job_id = ?failure.job_id,
            "Worker stopped early: {}",
            failure.error
        );
    }
    println!(
        "Scored {}/{} listing(s), {} worker(s) failed",
        report.scored,
        report.total,
        report.failures.len()
    );
    Ok(())
}
