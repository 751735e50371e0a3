//! Discovery engine: walks the listing page card by card.
//!
//! Clicking a card makes the page fetch that card's detail; scrolling near the
//! end of the list makes it fetch the next list page. Both responses are
//! intercepted and joined by item id into [`JobListing`]s.

use crate::correlation::Correlator;
use crate::error::{CorrelationError, Result};
use crate::filter::{ListingFilter, NoPacing, Pacer, RandomPacer, RecruiterActivityFilter};
use crate::parser::{self, ListPage, ListingDetail};
use crate::url_builder::SiteUrls;
use futures::{FutureExt, Stream, StreamExt};
use scout_browser::{
    AutomationSurface, ElementHandle, ElementState, ExchangeOutcome, InterceptedExchange,
    ResponseStream, WaitPolicy,
};
use scout_core::{DiscoveryConfig, JobListing};
use std::sync::Arc;
use std::time::Duration;

/// Scrollable list of job cards.
pub const LIST_CONTAINER: &str = ".job-list-container";
/// Spinner shown while the next list page loads.
pub const LOADING_INDICATOR: &str = ".job-list-container .loading-wait";
/// Individual job cards. Later pages are appended, so indices stay stable.
pub const JOB_CARDS: &str = ".job-list-container .job-card-box";

/// Timeouts for the waits inside a discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    pub element_timeout: Duration,
    pub detail_timeout: Duration,
    pub page_timeout: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self::from(&DiscoveryConfig::default())
    }
}

impl From<&DiscoveryConfig> for DiscoveryOptions {
    fn from(config: &DiscoveryConfig) -> Self {
        Self {
            element_timeout: Duration::from_secs(config.element_timeout_secs),
            detail_timeout: Duration::from_secs(config.detail_timeout_secs),
            page_timeout: Duration::from_secs(config.page_timeout_secs),
        }
    }
}

/// Produces discovery runs over an authenticated surface.
#[derive(Clone)]
pub struct DiscoveryEngine {
    surface: Arc<dyn AutomationSurface>,
    urls: SiteUrls,
    options: DiscoveryOptions,
    filter: Arc<dyn ListingFilter>,
    pacer: Arc<dyn Pacer>,
}

impl DiscoveryEngine {
    /// Engine with the default recruiter-activity filter and random pacing.
    #[must_use]
    pub fn new(surface: Arc<dyn AutomationSurface>, urls: SiteUrls, options: DiscoveryOptions) -> Self {
        Self {
            surface,
            urls,
            options,
            filter: Arc::new(RecruiterActivityFilter),
            pacer: Arc::new(RandomPacer::default()),
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl ListingFilter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    #[must_use]
    pub fn with_pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.pacer = Arc::new(pacer);
        self
    }

    /// Disable pacing entirely.
    #[must_use]
    pub fn without_pacing(self) -> Self {
        self.with_pacer(NoPacing)
    }

    /// Prepare a run yielding up to `count` accepted listings from `from_url`.
    ///
    /// Nothing touches the surface until the run is first polled.
    #[must_use]
    pub fn discover(&self, from_url: impl Into<String>, count: usize) -> DiscoveryRun {
        DiscoveryRun {
            engine: self.clone(),
            from_url: from_url.into(),
            count,
            yielded: 0,
            finished: false,
            state: None,
        }
    }
}

/// A single pass over the listing page.
///
/// Finite and not restartable: once it returns `None` or an error, every
/// later call returns `None`.
pub struct DiscoveryRun {
    engine: DiscoveryEngine,
    from_url: String,
    count: usize,
    yielded: usize,
    finished: bool,
    state: Option<RunState>,
}

impl DiscoveryRun {
    /// Number of listings yielded so far.
    #[must_use]
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Cards clicked whose detail arrived, accepted or not.
    #[must_use]
    pub fn visited(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.cursor)
    }

    /// Next accepted listing, or `None` once the run is over.
    pub async fn next_listing(&mut self) -> Result<Option<JobListing>> {
        if self.finished || self.yielded >= self.count {
            self.finished = true;
            return Ok(None);
        }

        let result = self.advance().await;
        match &result {
            Ok(Some(listing)) => {
                self.yielded += 1;
                tracing::debug!(
                    job_id = %listing.job_id,
                    yielded = self.yielded,
                    requested = self.count,
                    "Listing discovered"
                );
            }
            Ok(None) => self.finished = true,
            Err(e) => {
                tracing::error!("Discovery run failed: {}", e);
                self.finished = true;
            }
        }
        result
    }

    /// Consume the run as a stream. The stream ends after the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<JobListing>> + Send {
        futures::stream::try_unfold(self, |mut run| async move {
            Ok(run.next_listing().await?.map(|listing| (listing, run)))
        })
    }

    async fn advance(&mut self) -> Result<Option<JobListing>> {
        let state = match self.state.take() {
            Some(state) => state,
            None => RunState::start(&self.engine, &self.from_url).await?,
        };
        let state = self.state.insert(state);
        state.next_accepted(&self.engine).await
    }
}

struct RunState {
    list_pages: ResponseStream,
    details: ResponseStream,
    correlator: Correlator,
    cursor: usize,
    pause_pending: bool,
}

impl RunState {
    async fn start(engine: &DiscoveryEngine, from_url: &str) -> Result<Self> {
        let surface = &engine.surface;

        // Subscribe first so the initial list page is not missed
        let list_pages = surface
            .subscribe_responses(&engine.urls.job_list_prefix())
            .await?;
        let details = surface
            .subscribe_responses(&engine.urls.job_detail_prefix())
            .await?;

        tracing::info!(url = from_url, "Starting discovery run");
        surface.navigate(from_url, WaitPolicy::PageLoaded).await?;
        surface
            .wait_for_element(
                LIST_CONTAINER,
                ElementState::Visible,
                engine.options.element_timeout,
            )
            .await?;

        Ok(Self {
            list_pages,
            details,
            correlator: Correlator::new(),
            cursor: 0,
            pause_pending: false,
        })
    }

    async fn next_accepted(&mut self, engine: &DiscoveryEngine) -> Result<Option<JobListing>> {
        loop {
            if std::mem::take(&mut self.pause_pending) {
                engine.pacer.pause().await;
            }

            let Some(card) = self.next_card(engine).await? else {
                return Ok(None);
            };

            self.discard_stale_details();
            engine.surface.click(&card).await?;

            let detail = self.await_detail(engine.options.detail_timeout).await?;
            self.cursor += 1;
            self.drain_list_pages()?;
            let listing = self.correlator.merge(detail)?;
            self.pause_pending = true;

            if engine.filter.accept(&listing) {
                return Ok(Some(listing));
            }
            tracing::debug!(
                job_id = %listing.job_id,
                activity = %listing.recruiter_activity,
                "Listing filtered out"
            );
        }
    }

    /// Card at the cursor, waiting for the next list page when it is not
    /// rendered yet. `None` when the list is exhausted.
    async fn next_card(&mut self, engine: &DiscoveryEngine) -> Result<Option<ElementHandle>> {
        loop {
            engine
                .surface
                .wait_for_element(
                    LOADING_INDICATOR,
                    ElementState::Hidden,
                    engine.options.element_timeout,
                )
                .await?;
            self.drain_list_pages()?;

            let cards = engine.surface.query_all(JOB_CARDS).await?;
            if let Some(card) = cards.into_iter().nth(self.cursor) {
                return Ok(Some(card));
            }

            if self.correlator.has_more() == Some(false) {
                tracing::info!(
                    visited = self.cursor,
                    "Listing page has no more results"
                );
                return Ok(None);
            }

            if !self.await_list_page(engine.options.page_timeout).await? {
                tracing::warn!(
                    visited = self.cursor,
                    timeout_secs = engine.options.page_timeout.as_secs(),
                    "No further list page arrived, ending discovery early"
                );
                return Ok(None);
            }
        }
    }

    fn drain_list_pages(&mut self) -> Result<()> {
        while let Some(next) = self.list_pages.next().now_or_never() {
            let exchange = next.ok_or(CorrelationError::StreamClosed("list page"))?;
            self.record_list_page(&exchange)?;
        }
        Ok(())
    }

    /// Returns `false` when no page arrived within `timeout`.
    async fn await_list_page(&mut self, timeout: Duration) -> Result<bool> {
        match tokio::time::timeout(timeout, self.list_pages.next()).await {
            Err(_) => Ok(false),
            Ok(None) => Err(CorrelationError::StreamClosed("list page").into()),
            Ok(Some(exchange)) => {
                self.record_list_page(&exchange)?;
                Ok(true)
            }
        }
    }

    fn record_list_page(&mut self, exchange: &InterceptedExchange) -> Result<()> {
        let page: ListPage = decode(exchange, parser::parse_list_page)?;
        let added = self.correlator.record_page(page);
        tracing::debug!(
            added,
            total = self.correlator.summary_count(),
            has_more = ?self.correlator.has_more(),
            "List page received"
        );
        Ok(())
    }

    /// Drop detail responses that completed before the next click.
    fn discard_stale_details(&mut self) {
        while let Some(Some(exchange)) = self.details.next().now_or_never() {
            tracing::debug!(url = %exchange.url, "Discarding detail not triggered by a click");
        }
    }

    /// Detail for the last click. If several completed, the latest wins.
    async fn await_detail(&mut self, timeout: Duration) -> Result<ListingDetail> {
        let mut latest = match tokio::time::timeout(timeout, self.details.next()).await {
            Err(_) => return Err(CorrelationError::DetailTimeout(timeout).into()),
            Ok(None) => return Err(CorrelationError::StreamClosed("detail").into()),
            Ok(Some(exchange)) => exchange,
        };
        while let Some(Some(exchange)) = self.details.next().now_or_never() {
            latest = exchange;
        }

        Ok(decode(&latest, parser::parse_detail)?)
    }
}

fn decode<T>(
    exchange: &InterceptedExchange,
    parse: fn(&str) -> std::result::Result<T, String>,
) -> std::result::Result<T, CorrelationError> {
    let body = match &exchange.outcome {
        ExchangeOutcome::Body(body) if exchange.is_ok() => body,
        ExchangeOutcome::Body(_) => {
            return Err(CorrelationError::FailedExchange {
                url: exchange.url.clone(),
                reason: format!("HTTP {}", exchange.status),
            })
        }
        ExchangeOutcome::Failed(reason) => {
            return Err(CorrelationError::FailedExchange {
                url: exchange.url.clone(),
                reason: reason.clone(),
            })
        }
    };

    parse(body).map_err(|reason| CorrelationError::MalformedBody {
        url: exchange.url.clone(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exchange(status: u16, outcome: ExchangeOutcome) -> InterceptedExchange {
        InterceptedExchange {
            url: "https://www.zhipin.com/wapi/zpgeek/job/detail.json?securityId=x".to_string(),
            status,
            outcome,
        }
    }

    #[test]
    fn test_decode_rejects_unsuccessful_exchange() {
        let err = decode(
            &exchange(503, ExchangeOutcome::Body("busy".to_string())),
            parser::parse_detail,
        )
        .expect_err("503 should fail");
        assert!(matches!(err, CorrelationError::FailedExchange { reason, .. } if reason == "HTTP 503"));

        let err = decode(
            &exchange(0, ExchangeOutcome::Failed("net::ERR_ABORTED".to_string())),
            parser::parse_detail,
        )
        .expect_err("failed loading should fail");
        assert!(matches!(err, CorrelationError::FailedExchange { .. }));
    }

    #[test]
    fn test_decode_rejects_malformed_body() {
        let err = decode(
            &exchange(200, ExchangeOutcome::Body("<html></html>".to_string())),
            parser::parse_detail,
        )
        .expect_err("html should fail");
        assert!(matches!(err, CorrelationError::MalformedBody { .. }));
    }

    #[test]
    fn test_options_from_config() {
        let config = DiscoveryConfig {
            detail_timeout_secs: 5,
            ..DiscoveryConfig::default()
        };
        let options = DiscoveryOptions::from(&config);
        assert_eq!(options.detail_timeout, Duration::from_secs(5));
        assert_eq!(
            options.page_timeout,
            Duration::from_secs(config.page_timeout_secs)
        );
    }
}
