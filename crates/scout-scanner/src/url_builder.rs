use crate::error::{Result, ScanError};

/// Endpoints derived from the site base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    base: String,
}

impl SiteUrls {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| ScanError::Configuration(format!("Invalid base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScanError::Configuration(format!(
                "Base URL must be http(s), got '{base_url}'"
            )));
        }

        Ok(Self {
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Login page. Redirects to the base URL when the session is valid.
    pub fn login(&self) -> String {
        format!("{}/web/user/?ka=header-login", self.base)
    }

    pub fn job_list_prefix(&self) -> String {
        format!("{}/wapi/zpgeek/pc/recommend/job/list.json", self.base)
    }

    pub fn job_detail_prefix(&self) -> String {
        format!("{}/wapi/zpgeek/job/detail.json", self.base)
    }
}
