use crate::actions::{
    AutomationSurface, ElementHandle, ElementState, ResponseStream, SurfaceLauncher, WaitPolicy,
};
use crate::error::{BrowserError, Result};
use crate::fingerprint::FingerprintConfig;
use crate::intercept;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetTimezoneOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    Cookie, CookieParam, CookieSameSite, EventLoadingFailed, EventLoadingFinished,
    EventRequestWillBeSent, TimeSinceEpoch,
};
use chromiumoxide::Page;
use futures_util::stream::StreamExt;
use scout_core::{Credential, SameSite};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Network silence that counts as settled.
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);
const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Options for launching a Chromium surface.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub locale: String,
    pub chrome_executable: Option<PathBuf>,
    pub navigation_timeout: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            locale: "zh-CN".to_string(),
            chrome_executable: None,
            navigation_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&scout_core::BrowserConfig> for LaunchOptions {
    fn from(config: &scout_core::BrowserConfig) -> Self {
        Self {
            headless: config.headless,
            window_width: config.window_width,
            window_height: config.window_height,
            locale: config.locale.clone(),
            chrome_executable: config.chrome_executable.clone(),
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
        }
    }
}

/// A single Chromium tab behind the [`AutomationSurface`] capability.
pub struct ChromiumSurface {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    options: LaunchOptions,
}

impl ChromiumSurface {
    /// Launch a browser and open one blank tab with a randomized fingerprint.
    pub async fn launch(options: LaunchOptions) -> Result<Self> {
        let fingerprint = FingerprintConfig::randomized(
            &options.locale,
            options.window_width,
            options.window_height,
        );

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(options.window_width, options.window_height)
            .arg(format!("--lang={}", options.locale))
            .arg("--disable-blink-features=AutomationControlled");
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(BrowserError::ChromiumError)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // Spawn browser handler
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await?;

        let mut user_agent = SetUserAgentOverrideParams::new(fingerprint.user_agent.clone());
        user_agent.accept_language = Some(fingerprint.accept_language());
        user_agent.platform = Some("Win32".to_string());
        page.execute(user_agent).await?;
        page.execute(SetTimezoneOverrideParams::new(fingerprint.timezone.clone()))
            .await?;

        tracing::info!(
            headless = options.headless,
            viewport = %format!("{}x{}", fingerprint.viewport_width, fingerprint.viewport_height),
            "Launched Chromium surface"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            options,
        })
    }

    async fn wait_network_settled(&self) -> Result<()> {
        let sent = self.page.event_listener::<EventRequestWillBeSent>().await?;
        let finished = self.page.event_listener::<EventLoadingFinished>().await?;
        let failed = self.page.event_listener::<EventLoadingFailed>().await?;
        let mut activity = futures_util::stream::select(
            sent.map(|_| ()),
            futures_util::stream::select(finished.map(|_| ()), failed.map(|_| ())),
        );

        let deadline = tokio::time::Instant::now() + self.options.navigation_timeout;
        loop {
            if tokio::time::Instant::now() >= deadline {
                tracing::debug!("Network never settled, continuing after navigation timeout");
                return Ok(());
            }
            match tokio::time::timeout(NETWORK_IDLE_WINDOW, activity.next()).await {
                Err(_) | Ok(None) => return Ok(()),
                Ok(Some(())) => {}
            }
        }
    }

    async fn element_visible(&self, selector: &str) -> Result<bool> {
        let selector = serde_json::to_string(selector)
            .map_err(|e| BrowserError::ScriptError(e.to_string()))?;
        let script = format!(
            r"(() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                return style.visibility !== 'hidden' && style.display !== 'none'
                    && rect.width > 0 && rect.height > 0;
            }})()"
        );
        self.page
            .evaluate(script.as_str())
            .await?
            .into_value::<bool>()
            .map_err(|e| BrowserError::ScriptError(e.to_string()))
    }
}

#[async_trait::async_trait]
impl AutomationSurface for ChromiumSurface {
    fn is_headless(&self) -> bool {
        self.options.headless
    }

    async fn navigate(&self, url: &str, wait: WaitPolicy) -> Result<()> {
        tracing::debug!(url, ?wait, "Navigating");
        tokio::time::timeout(self.options.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| BrowserError::Timeout(format!("navigation to {url}")))?
            .map_err(|e| BrowserError::NavigationError(format!("{url}: {e}")))?;

        if wait == WaitPolicy::NetworkSettled {
            self.wait_network_settled().await?;
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.page
            .url()
            .await?
            .ok_or_else(|| BrowserError::NavigationError("page has no URL".to_string()))
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        state: ElementState,
        timeout: Duration,
    ) -> Result<()> {
        let wanted = state == ElementState::Visible;
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.element_visible(selector).await? == wanted {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BrowserError::Timeout(format!(
                    "{selector} did not become {state:?} within {timeout:?}"
                )));
            }
            tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let count = self.page.find_elements(selector).await?.len();
        Ok((0..count)
            .map(|index| ElementHandle {
                selector: selector.to_string(),
                index,
            })
            .collect())
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        let elements = self.page.find_elements(element.selector.as_str()).await?;
        let target = elements.get(element.index).ok_or_else(|| {
            BrowserError::SelectorNotFound(format!("{}[{}]", element.selector, element.index))
        })?;
        target.click().await?;
        Ok(())
    }

    async fn subscribe_responses(&self, url_prefix: &str) -> Result<ResponseStream> {
        intercept::subscribe(&self.page, url_prefix).await
    }

    async fn get_cookies(&self) -> Result<Vec<Credential>> {
        let cookies = self.page.get_cookies().await?;
        Ok(cookies.into_iter().map(credential_from_cookie).collect())
    }

    async fn set_cookies(&self, cookies: &[Credential]) -> Result<()> {
        if cookies.is_empty() {
            return Ok(());
        }
        let params = cookies.iter().map(cookie_param).collect();
        self.page.set_cookies(params).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser.close().await?;
        if let Err(e) = browser.wait().await {
            tracing::debug!("Browser process wait failed: {}", e);
        }
        self.handler.abort();
        tracing::info!("Closed Chromium surface");
        Ok(())
    }
}

/// Launches independent Chromium surfaces sharing one set of options.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    options: LaunchOptions,
}

impl ChromiumLauncher {
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }
}

#[async_trait::async_trait]
impl SurfaceLauncher for ChromiumLauncher {
    async fn launch(&self, headless: bool) -> Result<Box<dyn AutomationSurface>> {
        let options = LaunchOptions {
            headless,
            ..self.options.clone()
        };
        Ok(Box::new(ChromiumSurface::launch(options).await?))
    }
}

fn credential_from_cookie(cookie: Cookie) -> Credential {
    Credential {
        expires_at: (!cookie.session).then_some(cookie.expires),
        http_only: Some(cookie.http_only),
        secure: Some(cookie.secure),
        same_site: cookie.same_site.map(|s| match s {
            CookieSameSite::Strict => SameSite::Strict,
            CookieSameSite::Lax => SameSite::Lax,
            CookieSameSite::None => SameSite::None,
        }),
        // Partition keys are structured in CDP; they are not round-tripped.
        partition_key: None,
        name: cookie.name,
        value: cookie.value,
        domain: Some(cookie.domain),
        path: Some(cookie.path),
    }
}

fn cookie_param(credential: &Credential) -> CookieParam {
    let mut param = CookieParam::new(credential.name.clone(), credential.value.clone());
    param.domain.clone_from(&credential.domain);
    param.path.clone_from(&credential.path);
    param.secure = credential.secure;
    param.http_only = credential.http_only;
    param.same_site = credential.same_site.map(|s| match s {
        SameSite::Strict => CookieSameSite::Strict,
        SameSite::Lax => CookieSameSite::Lax,
        SameSite::None => CookieSameSite::None,
    });
    param.expires = credential.expires_at.map(TimeSinceEpoch::new);
    param
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_param_mapping() {
        let credential = Credential {
            name: "wt2".to_string(),
            value: "token".to_string(),
            domain: Some(".zhipin.com".to_string()),
            path: Some("/".to_string()),
            expires_at: Some(1_893_456_000.0),
            http_only: Some(true),
            secure: Some(false),
            same_site: Some(SameSite::Lax),
            partition_key: None,
        };

        let param = cookie_param(&credential);
        assert_eq!(param.name, "wt2");
        assert_eq!(param.domain.as_deref(), Some(".zhipin.com"));
        assert_eq!(param.http_only, Some(true));
        assert_eq!(param.same_site, Some(CookieSameSite::Lax));
        assert!(param.expires.is_some());
    }

    #[test]
    fn test_default_launch_options() {
        let options = LaunchOptions::default();
        assert!(options.headless);
        assert_eq!(options.locale, "zh-CN");
    }

    #[test]
    fn test_launch_options_from_config() {
        let mut config = scout_core::BrowserConfig::default();
        config.headless = false;
        config.navigation_timeout_secs = 5;
        let options = LaunchOptions::from(&config);
        assert!(!options.headless);
        assert_eq!(options.navigation_timeout, Duration::from_secs(5));
    }
}
