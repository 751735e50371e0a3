use crate::error::{BrowserError, Result};
use futures_util::stream::BoxStream;
use scout_core::Credential;
use std::time::Duration;

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitPolicy {
    /// The page fired its load event.
    PageLoaded,
    /// Network traffic went quiet after the load event.
    NetworkSettled,
}

/// Element state to wait for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    /// Attached and rendered with a non-empty box.
    Visible,
    /// Detached, or attached but not rendered.
    Hidden,
}

/// Reference to the `index`-th match of `selector` at query time.
///
/// Handles are positional: re-query after the page re-renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub selector: String,
    pub index: usize,
}

/// How an intercepted request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// Response body as text.
    Body(String),
    /// Loading failed, or the body could not be read.
    Failed(String),
}

/// A network response observed by the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedExchange {
    pub url: String,
    /// HTTP status, 0 when no response was received.
    pub status: u16,
    pub outcome: ExchangeOutcome,
}

impl InterceptedExchange {
    /// Successful status with a readable body.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status) && matches!(self.outcome, ExchangeOutcome::Body(_))
    }

    pub fn body(&self) -> Option<&str> {
        match &self.outcome {
            ExchangeOutcome::Body(body) => Some(body),
            ExchangeOutcome::Failed(_) => None,
        }
    }
}

/// Stream of exchanges whose URL starts with a subscribed prefix.
///
/// Ends when the surface closes.
pub type ResponseStream = BoxStream<'static, InterceptedExchange>;

/// A page-level automation handle.
#[async_trait::async_trait]
pub trait AutomationSurface: Send + Sync {
    /// Whether the surface is rendered without a visible window.
    fn is_headless(&self) -> bool;

    /// Navigate to a URL and wait according to `wait`.
    async fn navigate(&self, url: &str, wait: WaitPolicy) -> Result<()>;

    /// URL of the current document.
    async fn current_url(&self) -> Result<String>;

    /// Wait until the first match of `selector` reaches `state`.
    ///
    /// Fails with [`BrowserError::Timeout`] once `timeout` elapses.
    async fn wait_for_element(
        &self,
        selector: &str,
        state: ElementState,
        timeout: Duration,
    ) -> Result<()>;

    /// Every element currently matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>>;

    /// Click an element previously returned by [`AutomationSurface::query_all`].
    async fn click(&self, element: &ElementHandle) -> Result<()>;

    /// Subscribe to responses whose URL starts with `url_prefix`.
    ///
    /// Only responses completing after the call are delivered.
    async fn subscribe_responses(&self, url_prefix: &str) -> Result<ResponseStream>;

    /// Export every cookie visible to the surface.
    async fn get_cookies(&self) -> Result<Vec<Credential>>;

    /// Import cookies into the surface.
    async fn set_cookies(&self, cookies: &[Credential]) -> Result<()>;

    /// Release the surface. Further calls fail.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Opens additional surfaces, e.g. a visible window for a human to log in.
#[async_trait::async_trait]
pub trait SurfaceLauncher: Send + Sync {
    async fn launch(&self, headless: bool) -> Result<Box<dyn AutomationSurface>>;
}

/// Compare two URLs after normalization (`https://a.com` equals `https://a.com/`).
pub fn same_location(left: &str, right: &str) -> Result<bool> {
    Ok(parse_url(left)? == parse_url(right)?)
}

fn parse_url(url: &str) -> Result<url::Url> {
    url::Url::parse(url).map_err(|e| BrowserError::NavigationError(format!("Invalid URL: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_location_invalid() {
        assert!(same_location("not-a-url", "https://www.zhipin.com").is_err());
    }

    #[test]
    fn test_same_location_normalizes_root_path() {
        assert!(same_location("https://www.zhipin.com", "https://www.zhipin.com/").unwrap());
        assert!(!same_location(
            "https://www.zhipin.com",
            "https://www.zhipin.com/web/user/?ka=header-login"
        )
        .unwrap());
    }

    #[test]
    fn test_exchange_status() {
        let ok = InterceptedExchange {
            url: "https://www.zhipin.com/wapi/zpgeek/job/detail.json".to_string(),
            status: 200,
            outcome: ExchangeOutcome::Body("{}".to_string()),
        };
        assert!(ok.is_ok());
        assert_eq!(ok.body(), Some("{}"));

        let server_error = InterceptedExchange {
            status: 502,
            ..ok.clone()
        };
        assert!(!server_error.is_ok());

        let failed = InterceptedExchange {
            status: 200,
            outcome: ExchangeOutcome::Failed("net::ERR_ABORTED".to_string()),
            ..ok
        };
        assert!(!failed.is_ok());
        assert_eq!(failed.body(), None);
    }
}
