//! Shared types used across Scout.
//!
//! This module defines the identifiers and records that flow between the
//! discovery engine, the database and the evaluation pipeline.

use crate::error::ScoutError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Newtype for the site-assigned identifier of a listing.
///
/// The same identifier keys the list-page summary, the detail response,
/// the stored listing and its evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new `ItemId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is empty or contains whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, ScoutError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ScoutError::Validation("item ID must not be empty".to_string()));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(ScoutError::Validation(format!(
                "item ID must not contain whitespace, got '{id}'"
            )));
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cookie `SameSite` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SameSite {
    /// `SameSite=Lax`
    Lax,
    /// `SameSite=None`
    None,
    /// `SameSite=Strict`
    Strict,
}

impl SameSite {
    /// Attribute value as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lax => "Lax",
            Self::None => "None",
            Self::Strict => "Strict",
        }
    }
}

impl FromStr for SameSite {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Lax" => Ok(Self::Lax),
            "None" => Ok(Self::None),
            "Strict" => Ok(Self::Strict),
            other => Err(ScoutError::Validation(format!(
                "unknown SameSite value '{other}'"
            ))),
        }
    }
}

/// A single session credential (browser cookie).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Cookie domain
    pub domain: Option<String>,
    /// Cookie path
    pub path: Option<String>,
    /// Expiry as seconds since the Unix epoch; `None` for session cookies
    pub expires_at: Option<f64>,
    /// `HttpOnly` flag
    pub http_only: Option<bool>,
    /// `Secure` flag
    pub secure: Option<bool>,
    /// `SameSite` attribute
    pub same_site: Option<SameSite>,
    /// CHIPS partition key
    pub partition_key: Option<String>,
}

impl Credential {
    /// Create a credential with only a name and value set.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            expires_at: None,
            http_only: None,
            secure: None,
            same_site: None,
            partition_key: None,
        }
    }

    /// Set the domain and path scope.
    #[must_use]
    pub fn scoped(mut self, domain: impl Into<String>, path: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self.path = Some(path.into());
        self
    }

    /// Uniqueness key: `(name, domain, path)`.
    #[must_use]
    pub fn key(&self) -> (&str, Option<&str>, Option<&str>) {
        (
            self.name.as_str(),
            self.domain.as_deref(),
            self.path.as_deref(),
        )
    }
}

/// A listing normalized from its summary and detail parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    /// Listing identifier
    pub job_id: ItemId,
    /// Job title
    pub job_name: String,
    /// City
    pub city: String,
    /// Area district within the city
    pub area_district: String,
    /// Business district within the area
    pub business_district: String,
    /// Street address of the workplace
    pub address: String,
    /// Required experience
    pub experience: String,
    /// Required degree
    pub degree: String,
    /// Salary description as shown on the site
    pub salary: String,
    /// Full job description
    pub description: String,
    /// Skill tags
    pub skills: Vec<String>,
    /// Listing labels
    pub labels: Vec<String>,
    /// Company brand identifier
    pub company_id: String,
    /// Company brand name
    pub company_name: String,
    /// Funding stage
    pub company_stage: String,
    /// Headcount bracket
    pub company_scale: String,
    /// Industry
    pub company_industry: String,
    /// Company introduction
    pub company_introduction: String,
    /// Recruiter name
    pub recruiter_name: String,
    /// Recruiter title
    pub recruiter_title: String,
    /// Recruiter activity description (e.g. "刚刚活跃", "本月活跃")
    pub recruiter_activity: String,
}

/// Score and rationale for one evaluation dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScore {
    /// Score in `0..=5`
    pub score: u8,
    /// Free-form rationale
    pub reason: String,
}

impl DimensionScore {
    /// Highest score a dimension can take.
    pub const MAX: u8 = 5;

    /// Create a score, clamping it into `0..=5`.
    #[must_use]
    pub fn new(score: u8, reason: impl Into<String>) -> Self {
        Self {
            score: score.min(Self::MAX),
            reason: reason.into(),
        }
    }
}

/// Result of scoring one listing against the reference document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEvaluation {
    /// Listing identifier
    pub job_id: ItemId,
    /// Overlap between the required and the candidate's technologies
    pub technology_match: DimensionScore,
    /// Relevance of past projects
    pub project_experience_match: DimensionScore,
    /// Relevance of past industries
    pub industry_experience_match: DimensionScore,
    /// Seniority fit
    pub level_match: DimensionScore,
    /// Career growth the role offers
    pub growth_potential: DimensionScore,
    /// Technical depth the role offers
    pub technical_depth_potential: DimensionScore,
}

impl JobEvaluation {
    /// Dimension names paired with their scores, in display order.
    #[must_use]
    pub fn dimensions(&self) -> [(&'static str, &DimensionScore); 6] {
        [
            ("technology_match", &self.technology_match),
            ("project_experience_match", &self.project_experience_match),
            ("industry_experience_match", &self.industry_experience_match),
            ("level_match", &self.level_match),
            ("growth_potential", &self.growth_potential),
            ("technical_depth_potential", &self.technical_depth_potential),
        ]
    }

    /// Sum of all dimension scores.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.dimensions()
            .iter()
            .map(|(_, d)| u32::from(d.score))
            .sum()
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
///
/// Stored as fixed-width RFC3339 text so lexical order matches time order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parse a timestamp from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, ScoutError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| ScoutError::Validation(format!("invalid timestamp: {e}")))
    }

    /// Format as RFC3339 with microsecond precision and a `Z` suffix.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::SubsecRound;

    #[test]
    fn test_item_id_valid() {
        let id = ItemId::new("a1b2c3d4e5~~").expect("valid item ID");
        assert_eq!(id.as_str(), "a1b2c3d4e5~~");
        assert_eq!(id.to_string(), "a1b2c3d4e5~~");
    }

    #[test]
    fn test_item_id_invalid() {
        for id in ["", "has space", "tab\there"] {
            assert!(ItemId::new(id).is_err(), "Should fail for: {id:?}");
        }
    }

    #[test]
    fn test_item_id_serializes_transparently() {
        let id = ItemId::new("abc").expect("valid item ID");
        let json = serde_json::to_string(&id).expect("serialize item ID");
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn test_same_site_round_trip() {
        for value in [SameSite::Lax, SameSite::None, SameSite::Strict] {
            assert_eq!(value.as_str().parse::<SameSite>().expect("parse"), value);
        }
        assert!("lax".parse::<SameSite>().is_err());
    }

    #[test]
    fn test_credential_key() {
        let cookie = Credential::new("wt2", "token").scoped(".zhipin.com", "/");
        assert_eq!(cookie.key(), ("wt2", Some(".zhipin.com"), Some("/")));

        let bare = Credential::new("wt2", "token");
        assert_eq!(bare.key(), ("wt2", None, None));
    }

    #[test]
    fn test_dimension_score_clamps() {
        assert_eq!(DimensionScore::new(9, "too high").score, 5);
        assert_eq!(DimensionScore::new(3, "ok").score, 3);
    }

    #[test]
    fn test_evaluation_total() {
        let evaluation = JobEvaluation {
            job_id: ItemId::new("job-1").expect("valid item ID"),
            technology_match: DimensionScore::new(5, ""),
            project_experience_match: DimensionScore::new(4, ""),
            industry_experience_match: DimensionScore::new(3, ""),
            level_match: DimensionScore::new(2, ""),
            growth_potential: DimensionScore::new(1, ""),
            technical_depth_potential: DimensionScore::default(),
        };
        assert_eq!(evaluation.total(), 15);
        assert_eq!(evaluation.dimensions()[0].0, "technology_match");
    }

    #[test]
    fn test_timestamp_rfc3339_is_fixed_width() {
        let ts = Timestamp::now();
        let s = ts.to_rfc3339();
        assert!(s.ends_with('Z'));
        assert_eq!(s.len(), "2025-01-01T00:00:00.000000Z".len());
        let parsed = Timestamp::from_rfc3339(&s).expect("parse RFC3339 timestamp");
        assert_eq!(parsed, ts.0.trunc_subsecs(6).into());
    }

    #[test]
    fn test_timestamp_ordering() {
        let ts1 = Timestamp::now();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let ts2 = Timestamp::now();
        assert!(ts2 > ts1);
        assert!(ts2.to_rfc3339() > ts1.to_rfc3339());
    }
}
