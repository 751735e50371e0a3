//! Wire models for the list and detail JSON endpoints.

use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Response wrapper shared by both endpoints.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "zpData")]
    pub zp_data: Option<T>,
}

impl<T> Envelope<T> {
    /// Payload of a successful response.
    pub fn into_data(self) -> Result<T, String> {
        if self.code != 0 {
            return Err(format!("site returned code {}: {}", self.code, self.message));
        }
        self.zp_data.ok_or_else(|| "response has no zpData".to_string())
    }
}

/// One page of the recommendation list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListPage {
    pub has_more: bool,
    pub job_list: Vec<ListingSummary>,
}

/// A card in the list view.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListingSummary {
    pub encrypt_job_id: String,
    pub security_id: String,
    pub job_name: String,
    pub salary_desc: String,
    pub job_labels: Vec<String>,
    pub skills: Vec<String>,
    pub job_experience: String,
    pub job_degree: String,
    pub city_name: String,
    pub area_district: String,
    pub business_district: String,
    pub encrypt_brand_id: String,
    pub brand_name: String,
    pub brand_stage_name: String,
    pub brand_industry: String,
    pub brand_scale_name: String,
    pub boss_name: String,
    pub boss_title: String,
}

/// The detail pane shown after clicking a card.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListingDetail {
    pub security_id: String,
    pub job_info: JobInfo,
    pub boss_info: BossInfo,
    pub brand_com_info: BrandComInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JobInfo {
    pub encrypt_id: String,
    pub job_name: String,
    pub position_name: String,
    pub location_name: String,
    pub experience_name: String,
    pub degree_name: String,
    pub salary_desc: String,
    pub post_description: String,
    pub address: String,
    pub show_skills: Vec<String>,
    pub job_status_desc: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BossInfo {
    pub name: String,
    pub title: String,
    pub active_time_desc: String,
    pub brand_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrandComInfo {
    pub encrypt_brand_id: String,
    pub brand_name: String,
    pub stage_name: String,
    pub scale_name: String,
    pub industry_name: String,
    pub introduce: String,
    pub labels: Vec<String>,
}

pub fn parse_list_page(body: &str) -> Result<ListPage, String> {
    parse_envelope(body)
}

pub fn parse_detail(body: &str) -> Result<ListingDetail, String> {
    parse_envelope(body)
}

fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<T, String> {
    serde_json::from_str::<Envelope<T>>(body)
        .map_err(|e| format!("invalid JSON: {e}"))?
        .into_data()
}
