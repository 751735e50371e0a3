//! Joins list-page summaries with detail responses by item id.

use crate::error::CorrelationError;
use crate::parser::{ListPage, ListingDetail, ListingSummary};
use scout_core::{ItemId, JobListing};
use std::collections::HashMap;

/// Summaries seen during one discovery run.
///
/// Append-only: a later page carrying the same id replaces the summary but
/// never removes one.
#[derive(Debug, Default)]
pub struct Correlator {
    summaries: HashMap<String, ListingSummary>,
    has_more: Option<bool>,
    pages: usize,
}

impl Correlator {
    /// Empty correlator for a new run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a list page. Returns how many summaries it carried.
    pub fn record_page(&mut self, page: ListPage) -> usize {
        self.pages += 1;
        self.has_more = Some(page.has_more);

        let count = page.job_list.len();
        for summary in page.job_list {
            self.summaries
                .insert(summary.encrypt_job_id.clone(), summary);
        }
        count
    }

    /// Pagination hint of the most recent page, `None` before the first.
    #[must_use]
    pub fn has_more(&self) -> Option<bool> {
        self.has_more
    }

    /// Number of list pages recorded.
    #[must_use]
    pub fn pages_seen(&self) -> usize {
        self.pages
    }

    /// Number of distinct summaries known.
    #[must_use]
    pub fn summary_count(&self) -> usize {
        self.summaries.len()
    }

    /// Build the normalized listing for a detail response.
    pub fn merge(&self, detail: ListingDetail) -> Result<JobListing, CorrelationError> {
        let info = detail.job_info;
        let raw_id = info.encrypt_id.clone();
        let Some(summary) = self.summaries.get(&raw_id) else {
            return Err(CorrelationError::MissingSummary { job_id: raw_id });
        };
        let job_id = ItemId::new(raw_id.clone()).map_err(|e| CorrelationError::MalformedBody {
            url: "detail response".to_string(),
            reason: format!("invalid job id '{raw_id}': {e}"),
        })?;

        let brand = detail.brand_com_info;
        let boss = detail.boss_info;

        Ok(JobListing {
            job_id,
            job_name: or_fallback(info.job_name, &summary.job_name),
            city: summary.city_name.clone(),
            area_district: summary.area_district.clone(),
            business_district: summary.business_district.clone(),
            address: info.address,
            experience: or_fallback(info.experience_name, &summary.job_experience),
            degree: or_fallback(info.degree_name, &summary.job_degree),
            salary: or_fallback(info.salary_desc, &summary.salary_desc),
            description: info.post_description,
            skills: if info.show_skills.is_empty() {
                summary.skills.clone()
            } else {
                info.show_skills
            },
            labels: summary.job_labels.clone(),
            company_id: or_fallback(brand.encrypt_brand_id, &summary.encrypt_brand_id),
            company_name: or_fallback(brand.brand_name, &summary.brand_name),
            company_stage: or_fallback(brand.stage_name, &summary.brand_stage_name),
            company_scale: or_fallback(brand.scale_name, &summary.brand_scale_name),
            company_industry: or_fallback(brand.industry_name, &summary.brand_industry),
            company_introduction: brand.introduce,
            recruiter_name: or_fallback(boss.name, &summary.boss_name),
            recruiter_title: or_fallback(boss.title, &summary.boss_title),
            recruiter_activity: boss.active_time_desc,
        })
    }
}

fn or_fallback(primary: String, fallback: &str) -> String {
    if primary.is_empty() {
        fallback.to_string()
    } else {
        primary
    }
}
