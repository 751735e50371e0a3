#![allow(clippy::must_use_candidate)]

use async_trait::async_trait;
use rand::Rng;
use scout_core::{DiscoveryConfig, JobListing};
use std::time::Duration;

/// Decides whether a discovered listing is yielded.
pub trait ListingFilter: Send + Sync {
    fn accept(&self, listing: &JobListing) -> bool;
}

impl<F> ListingFilter for F
where
    F: Fn(&JobListing) -> bool + Send + Sync,
{
    fn accept(&self, listing: &JobListing) -> bool {
        self(listing)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ListingFilter for AcceptAll {
    fn accept(&self, _listing: &JobListing) -> bool {
        true
    }
}

/// Rejects listings whose recruiter was last active weeks or more ago.
///
/// Activity strings look like `刚刚活跃`, `3日内活跃`, `本周活跃`, `2周内活跃`,
/// `本月活跃`, `半年前活跃`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecruiterActivityFilter;

impl RecruiterActivityFilter {
    const STALE_MARKERS: [char; 3] = ['周', '月', '年'];
}

impl ListingFilter for RecruiterActivityFilter {
    fn accept(&self, listing: &JobListing) -> bool {
        !listing
            .recruiter_activity
            .contains(Self::STALE_MARKERS.as_slice())
    }
}

/// Delay between consecutive clicks.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Sleeps a uniformly random duration between two bounds.
#[derive(Debug, Clone)]
pub struct RandomPacer {
    min: Duration,
    max: Duration,
}

impl RandomPacer {
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(
            Duration::from_millis(config.pacing_min_ms),
            Duration::from_millis(config.pacing_max_ms),
        )
    }

    fn next_delay(&self) -> Duration {
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

impl Default for RandomPacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(3000), Duration::from_millis(5000))
    }
}

#[async_trait]
impl Pacer for RandomPacer {
    async fn pause(&self) {
        let delay = self.next_delay();
        tracing::trace!(delay_ms = delay.as_millis(), "Pacing");
        tokio::time::sleep(delay).await;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

#[async_trait]
impl Pacer for NoPacing {
    async fn pause(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::ItemId;

    fn listing_with_activity(activity: &str) -> JobListing {
        JobListing {
            job_id: ItemId::new("job-1").expect("valid id"),
            job_name: String::new(),
            city: String::new(),
            area_district: String::new(),
            business_district: String::new(),
            address: String::new(),
            experience: String::new(),
            degree: String::new(),
            salary: String::new(),
            description: String::new(),
            skills: vec![],
            labels: vec![],
            company_id: String::new(),
            company_name: String::new(),
            company_stage: String::new(),
            company_scale: String::new(),
            company_industry: String::new(),
            company_introduction: String::new(),
            recruiter_name: String::new(),
            recruiter_title: String::new(),
            recruiter_activity: activity.to_string(),
        }
    }

    #[test]
    fn test_recruiter_activity_filter() {
        let filter = RecruiterActivityFilter;
        assert!(filter.accept(&listing_with_activity("刚刚活跃")));
        assert!(filter.accept(&listing_with_activity("今日活跃")));
        assert!(filter.accept(&listing_with_activity("3日内活跃")));
        assert!(filter.accept(&listing_with_activity("")));
        assert!(!filter.accept(&listing_with_activity("本周活跃")));
        assert!(!filter.accept(&listing_with_activity("本月活跃")));
        assert!(!filter.accept(&listing_with_activity("半年前活跃")));
    }

    #[test]
    fn test_closure_filter() {
        let only_shanghai = |listing: &JobListing| listing.city == "上海";
        let mut listing = listing_with_activity("刚刚活跃");
        assert!(!only_shanghai.accept(&listing));
        listing.city = "上海".to_string();
        assert!(only_shanghai.accept(&listing));
        assert!(AcceptAll.accept(&listing));
    }

    #[test]
    fn test_random_pacer_bounds() {
        let pacer = RandomPacer::new(Duration::from_millis(50), Duration::from_millis(10));
        for _ in 0..100 {
            let delay = pacer.next_delay();
            assert!(delay >= Duration::from_millis(10));
            assert!(delay <= Duration::from_millis(50));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_pacer_sleeps() {
        let pacer = RandomPacer::default();
        let start = tokio::time::Instant::now();
        pacer.pause().await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(3000));
        assert!(elapsed <= Duration::from_millis(5000));
    }
}
