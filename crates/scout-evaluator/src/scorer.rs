//! LLM-backed [`Scorer`].

use crate::error::{EvalError, Result};
use crate::pipeline::Scorer;
use crate::prompt;
use async_trait::async_trait;
use futures::StreamExt;
use scout_core::{DimensionScore, ItemId, JobEvaluation, JobListing};
use scout_llm::{CompletionRequest, LlmProvider};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

/// Scores listings with a streamed JSON completion.
///
/// The accumulated output is re-parsed after every chunk and the last
/// well-formed evaluation wins, so trailing garbage after a complete object
/// does not discard it.
pub struct LlmScorer {
    provider: Arc<dyn LlmProvider>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl LlmScorer {
    /// Create a scorer over `provider`.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Sampling temperature sent with every request.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap on generated tokens.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn request(&self, reference: &str, listing: &JobListing) -> CompletionRequest {
        let today = chrono::Local::now().date_naive();
        let mut request = CompletionRequest::new(prompt::user_prompt(reference, listing, today))
            .with_system_prompt(prompt::system_prompt())
            .with_json_output();
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }
}

#[async_trait]
impl Scorer for LlmScorer {
    async fn score(&self, reference: &str, listing: &JobListing) -> Result<JobEvaluation> {
        let mut stream = self.provider.stream(self.request(reference, listing)).await?;

        let mut output = String::new();
        let mut latest = None;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if chunk.delta.is_empty() {
                continue;
            }
            output.push_str(&chunk.delta);
            if let Some(parsed) = parse_evaluation(&output) {
                latest = Some(parsed);
            }
        }

        let Some(raw) = latest else {
            let reason = if output.trim().is_empty() {
                "empty response".to_string()
            } else {
                tracing::debug!(job_id = %listing.job_id, output = %output, "Unparseable model output");
                "no JSON object with evaluation fields".to_string()
            };
            return Err(EvalError::ScoringOutput {
                job_id: listing.job_id.to_string(),
                reason,
            });
        };

        Ok(raw.into_evaluation(listing.job_id.clone()))
    }
}

/// Model output before defaults and clamping.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEvaluation {
    #[serde(deserialize_with = "lenient_score")]
    technology_match_score: Option<f64>,
    technology_match_reason: Option<String>,
    #[serde(deserialize_with = "lenient_score")]
    project_experience_match_score: Option<f64>,
    project_experience_match_reason: Option<String>,
    #[serde(deserialize_with = "lenient_score")]
    industry_experience_match_score: Option<f64>,
    industry_experience_match_reason: Option<String>,
    #[serde(deserialize_with = "lenient_score")]
    level_match_score: Option<f64>,
    level_match_reason: Option<String>,
    #[serde(deserialize_with = "lenient_score")]
    growth_potential_score: Option<f64>,
    growth_potential_reason: Option<String>,
    #[serde(deserialize_with = "lenient_score")]
    technical_depth_potential_score: Option<f64>,
    technical_depth_potential_reason: Option<String>,
}

impl RawEvaluation {
    fn has_any_dimension(&self) -> bool {
        [
            self.technology_match_score,
            self.project_experience_match_score,
            self.industry_experience_match_score,
            self.level_match_score,
            self.growth_potential_score,
            self.technical_depth_potential_score,
        ]
        .iter()
        .any(Option::is_some)
    }

    fn into_evaluation(self, job_id: ItemId) -> JobEvaluation {
        JobEvaluation {
            job_id,
            technology_match: dimension(self.technology_match_score, self.technology_match_reason),
            project_experience_match: dimension(
                self.project_experience_match_score,
                self.project_experience_match_reason,
            ),
            industry_experience_match: dimension(
                self.industry_experience_match_score,
                self.industry_experience_match_reason,
            ),
            level_match: dimension(self.level_match_score, self.level_match_reason),
            growth_potential: dimension(self.growth_potential_score, self.growth_potential_reason),
            technical_depth_potential: dimension(
                self.technical_depth_potential_score,
                self.technical_depth_potential_reason,
            ),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn dimension(score: Option<f64>, reason: Option<String>) -> DimensionScore {
    let score = score
        .filter(|s| s.is_finite())
        .map_or(0, |s| s.round().clamp(0.0, f64::from(DimensionScore::MAX)) as u8);
    DimensionScore::new(score, reason.unwrap_or_default())
}

/// Accept `4`, `4.5` and `"4"`; anything else counts as missing.
fn lenient_score<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Parse the outermost `{...}` span of `output`, tolerating code fences and prose.
fn parse_evaluation(output: &str) -> Option<RawEvaluation> {
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str::<RawEvaluation>(&output[start..=end])
        .ok()
        .filter(RawEvaluation::has_any_dimension)
}
