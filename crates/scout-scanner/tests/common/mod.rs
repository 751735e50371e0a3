//! Scripted in-memory site used by the scanner integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::StreamExt;
use scout_browser::{
    AutomationSurface, BrowserError, ElementHandle, ElementState, ExchangeOutcome,
    InterceptedExchange, ResponseStream, SurfaceLauncher, WaitPolicy,
};
use scout_core::{Credential, JobListing, SessionConfig};
use scout_scanner::{DiscoveryEngine, DiscoveryOptions, SiteUrls};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const BASE_URL: &str = "https://www.zhipin.com";
pub const FROM_URL: &str = "https://www.zhipin.com/web/geek/job-recommend?city=101020100";

const CARDS: &str = ".job-list-container .job-card-box";
const LOGGED_IN: &str = ".nav-figure";

/// What the site sends back when a card is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailBehavior {
    Ok,
    ServerError,
    /// A detail whose id never appeared on a list page.
    Orphan,
    Never,
}

/// When a page's list response is delivered relative to its rendered cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SummaryTiming {
    /// Together with the cards.
    #[default]
    WithCards,
    /// Right after the detail of the next click, in the same tick.
    AfterDetail,
    /// Never, so every detail arrives ahead of its summary.
    Withheld,
}

#[derive(Debug, Clone)]
pub struct FakeCard {
    pub id: String,
    pub activity: String,
    pub detail: DetailBehavior,
}

impl FakeCard {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            activity: "刚刚活跃".to_string(),
            detail: DetailBehavior::Ok,
        }
    }

    pub fn with_activity(mut self, activity: &str) -> Self {
        self.activity = activity.to_string();
        self
    }

    pub fn with_detail(mut self, detail: DetailBehavior) -> Self {
        self.detail = detail;
        self
    }
}

pub fn cards(ids: &[&str]) -> Vec<FakeCard> {
    ids.iter().map(|id| FakeCard::new(id)).collect()
}

#[derive(Default)]
struct SiteState {
    headless: bool,
    current_url: String,
    cookies: Vec<Credential>,
    accepts_saved_session: bool,
    login_cookies: Option<Vec<Credential>>,
    pages: Vec<Vec<FakeCard>>,
    final_has_more: bool,
    pages_served: usize,
    rendered: Vec<FakeCard>,
    preload_detail: bool,
    summary_timing: SummaryTiming,
    held_pages: Vec<(String, String)>,
    subscribers: Vec<(String, mpsc::UnboundedSender<InterceptedExchange>)>,
    navigations: Vec<(String, WaitPolicy)>,
    clicks: Vec<usize>,
    closed: bool,
}

impl SiteState {
    fn emit(&mut self, url: String, status: u16, outcome: ExchangeOutcome) {
        let exchange = InterceptedExchange {
            url,
            status,
            outcome,
        };
        self.subscribers
            .retain(|(prefix, tx)| !exchange.url.starts_with(prefix) || tx.send(exchange.clone()).is_ok());
    }

    fn serve_next_page(&mut self) {
        let Some(page) = self.pages.get(self.pages_served).cloned() else {
            return;
        };
        self.pages_served += 1;
        let has_more = self.pages_served < self.pages.len() || self.final_has_more;

        let body = list_body(&page, has_more);
        let url = format!(
            "{BASE_URL}/wapi/zpgeek/pc/recommend/job/list.json?page={}",
            self.pages_served
        );
        self.rendered.extend(page);
        if self.summary_timing == SummaryTiming::WithCards {
            self.emit(url, 200, ExchangeOutcome::Body(body));
        } else {
            self.held_pages.push((url, body));
        }
    }

    fn release_held_pages(&mut self) {
        if self.summary_timing != SummaryTiming::AfterDetail {
            return;
        }
        for (url, body) in std::mem::take(&mut self.held_pages) {
            self.emit(url, 200, ExchangeOutcome::Body(body));
        }
    }

    fn serve_detail(&mut self, card: &FakeCard) {
        let url = format!(
            "{BASE_URL}/wapi/zpgeek/job/detail.json?securityId=sec-{}",
            card.id
        );
        match card.detail {
            DetailBehavior::Ok => {
                let body = detail_body(&card.id, &card.activity);
                self.emit(url, 200, ExchangeOutcome::Body(body));
            }
            DetailBehavior::ServerError => {
                self.emit(url, 500, ExchangeOutcome::Body("busy".to_string()));
            }
            DetailBehavior::Orphan => {
                let body = detail_body(&format!("orphan-{}", card.id), &card.activity);
                self.emit(url, 200, ExchangeOutcome::Body(body));
            }
            DetailBehavior::Never => {}
        }
    }
}

pub fn list_body(cards: &[FakeCard], has_more: bool) -> String {
    let job_list: Vec<_> = cards
        .iter()
        .map(|card| {
            json!({
                "securityId": format!("sec-{}", card.id),
                "encryptJobId": card.id,
                "jobName": format!("Job {}", card.id),
                "salaryDesc": "20-40K",
                "jobLabels": ["3-5年", "本科"],
                "skills": ["Rust"],
                "jobExperience": "3-5年",
                "jobDegree": "本科",
                "cityName": "上海",
                "areaDistrict": "浦东新区",
                "businessDistrict": "张江",
                "encryptBrandId": format!("brand-{}", card.id),
                "brandName": "某科技",
                "brandStageName": "C轮",
                "brandIndustry": "互联网",
                "brandScaleName": "500-999人",
                "bossName": "张先生",
                "bossTitle": "技术总监"
            })
        })
        .collect();

    json!({
        "code": 0,
        "message": "Success",
        "zpData": {"hasMore": has_more, "jobList": job_list}
    })
    .to_string()
}

pub fn detail_body(id: &str, activity: &str) -> String {
    json!({
        "code": 0,
        "message": "Success",
        "zpData": {
            "securityId": format!("sec-{id}"),
            "jobInfo": {
                "encryptId": id,
                "jobName": format!("Job {id}"),
                "experienceName": "3-5年",
                "degreeName": "本科",
                "salaryDesc": "20-40K",
                "postDescription": "负责核心服务开发",
                "address": "上海浦东新区张江",
                "showSkills": ["Rust", "Tokio"],
                "jobStatusDesc": "最新"
            },
            "bossInfo": {
                "name": "张先生",
                "title": "技术总监",
                "activeTimeDesc": activity,
                "brandName": "某科技"
            },
            "brandComInfo": {
                "encryptBrandId": format!("brand-{id}"),
                "brandName": "某科技",
                "stageName": "C轮",
                "scaleName": "500-999人",
                "industryName": "互联网",
                "introduce": "一家做数据库的公司",
                "labels": ["五险一金"]
            }
        }
    })
    .to_string()
}

/// Automation surface backed by [`SiteState`]. Clones share the same site.
#[derive(Clone, Default)]
pub struct FakeSurface {
    state: Arc<Mutex<SiteState>>,
}

impl FakeSurface {
    pub fn headless() -> Self {
        let surface = Self::default();
        surface.with_state(|s| s.headless = true);
        surface
    }

    pub fn visible() -> Self {
        Self::default()
    }

    pub fn accepting_saved_session(self) -> Self {
        self.with_state(|s| s.accepts_saved_session = true);
        self
    }

    /// A human logs in successfully, leaving `cookies` behind.
    pub fn with_login(self, cookies: Vec<Credential>) -> Self {
        self.with_state(|s| s.login_cookies = Some(cookies));
        self
    }

    pub fn with_pages(self, pages: Vec<Vec<FakeCard>>, final_has_more: bool) -> Self {
        self.with_state(|s| {
            s.pages = pages;
            s.final_has_more = final_has_more;
        });
        self
    }

    /// The page shows the last card's detail on load, before any click.
    pub fn with_preloaded_detail(self) -> Self {
        self.with_state(|s| s.preload_detail = true);
        self
    }

    pub fn with_summary_timing(self, timing: SummaryTiming) -> Self {
        self.with_state(|s| s.summary_timing = timing);
        self
    }

    pub fn navigations(&self) -> Vec<(String, WaitPolicy)> {
        self.with_state(|s| s.navigations.clone())
    }

    pub fn clicks(&self) -> Vec<usize> {
        self.with_state(|s| s.clicks.clone())
    }

    pub fn cookies(&self) -> Vec<Credential> {
        self.with_state(|s| s.cookies.clone())
    }

    pub fn is_closed(&self) -> bool {
        self.with_state(|s| s.closed)
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SiteState) -> T) -> T {
        let mut state = self.state.lock().expect("site state lock");
        f(&mut state)
    }

    fn ensure_open(state: &SiteState) -> scout_browser::Result<()> {
        if state.closed {
            Err(BrowserError::ChromiumError("surface closed".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AutomationSurface for FakeSurface {
    fn is_headless(&self) -> bool {
        self.with_state(|s| s.headless)
    }

    async fn navigate(&self, url: &str, wait: WaitPolicy) -> scout_browser::Result<()> {
        self.with_state(|s| {
            Self::ensure_open(s)?;
            s.navigations.push((url.to_string(), wait));

            if url.starts_with(&format!("{BASE_URL}/web/user/")) {
                s.current_url = if s.accepts_saved_session && !s.cookies.is_empty() {
                    format!("{BASE_URL}/")
                } else {
                    url.to_string()
                };
                return Ok(());
            }

            s.current_url = url.to_string();
            s.serve_next_page();
            if s.preload_detail {
                if let Some(card) = s.rendered.last().cloned() {
                    s.serve_detail(&card);
                }
            }
            Ok(())
        })
    }

    async fn current_url(&self) -> scout_browser::Result<String> {
        self.with_state(|s| {
            Self::ensure_open(s)?;
            Ok(s.current_url.clone())
        })
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        state: ElementState,
        _timeout: Duration,
    ) -> scout_browser::Result<()> {
        self.with_state(|s| {
            Self::ensure_open(s)?;
            if selector == LOGGED_IN && state == ElementState::Visible {
                let Some(cookies) = s.login_cookies.clone() else {
                    return Err(BrowserError::Timeout(format!("{selector} visible")));
                };
                s.cookies = cookies;
                s.current_url = format!("{BASE_URL}/");
            }
            Ok(())
        })
    }

    async fn query_all(&self, selector: &str) -> scout_browser::Result<Vec<ElementHandle>> {
        self.with_state(|s| {
            Self::ensure_open(s)?;
            if selector != CARDS {
                return Ok(vec![]);
            }
            Ok((0..s.rendered.len())
                .map(|index| ElementHandle {
                    selector: selector.to_string(),
                    index,
                })
                .collect())
        })
    }

    async fn click(&self, element: &ElementHandle) -> scout_browser::Result<()> {
        self.with_state(|s| {
            Self::ensure_open(s)?;
            let card = s
                .rendered
                .get(element.index)
                .cloned()
                .ok_or_else(|| BrowserError::SelectorNotFound(element.selector.clone()))?;
            s.clicks.push(element.index);
            s.serve_detail(&card);
            s.release_held_pages();

            // Reaching the last card scrolls the list and loads the next page
            if element.index + 1 == s.rendered.len() {
                s.serve_next_page();
            }
            Ok(())
        })
    }

    async fn subscribe_responses(&self, url_prefix: &str) -> scout_browser::Result<ResponseStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.with_state(|s| {
            Self::ensure_open(s)?;
            s.subscribers.push((url_prefix.to_string(), tx));
            Ok::<_, BrowserError>(())
        })?;

        Ok(futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|exchange| (exchange, rx))
        })
        .boxed())
    }

    async fn get_cookies(&self) -> scout_browser::Result<Vec<Credential>> {
        self.with_state(|s| {
            Self::ensure_open(s)?;
            Ok(s.cookies.clone())
        })
    }

    async fn set_cookies(&self, cookies: &[Credential]) -> scout_browser::Result<()> {
        self.with_state(|s| {
            Self::ensure_open(s)?;
            for cookie in cookies {
                s.cookies.retain(|existing| existing.key() != cookie.key());
                s.cookies.push(cookie.clone());
            }
            Ok(())
        })
    }

    async fn close(&self) -> scout_browser::Result<()> {
        self.with_state(|s| {
            s.closed = true;
            s.subscribers.clear();
        });
        Ok(())
    }
}

/// Hands out clones of one pre-built surface and records launch requests.
#[derive(Clone, Default)]
pub struct FakeLauncher {
    surface: FakeSurface,
    launches: Arc<Mutex<Vec<bool>>>,
}

impl FakeLauncher {
    pub fn new(surface: FakeSurface) -> Self {
        Self {
            surface,
            launches: Arc::default(),
        }
    }

    /// The `headless` flag of every launch.
    pub fn launches(&self) -> Vec<bool> {
        self.launches.lock().expect("launches lock").clone()
    }
}

#[async_trait]
impl SurfaceLauncher for FakeLauncher {
    async fn launch(&self, headless: bool) -> scout_browser::Result<Box<dyn AutomationSurface>> {
        self.launches.lock().expect("launches lock").push(headless);
        let surface = self.surface.clone();
        surface.with_state(|s| s.headless = headless);
        Ok(Box::new(surface))
    }
}

pub fn session_config(allow_interactive_login: bool) -> SessionConfig {
    SessionConfig {
        allow_interactive_login,
        login_timeout_secs: 1,
    }
}

pub fn test_options() -> DiscoveryOptions {
    DiscoveryOptions {
        element_timeout: Duration::from_secs(1),
        detail_timeout: Duration::from_secs(2),
        page_timeout: Duration::from_secs(3),
    }
}

pub fn engine(surface: &FakeSurface) -> DiscoveryEngine {
    DiscoveryEngine::new(
        Arc::new(surface.clone()),
        SiteUrls::new(BASE_URL).expect("valid base URL"),
        test_options(),
    )
    .without_pacing()
}

pub fn ids(listings: &[JobListing]) -> Vec<String> {
    listings
        .iter()
        .map(|listing| listing.job_id.as_str().to_string())
        .collect()
}
