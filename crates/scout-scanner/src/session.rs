//! Session recovery from saved cookies, with interactive login as fallback.

use crate::error::{Result, ScanError};
use crate::url_builder::SiteUrls;
use scout_browser::{
    same_location, AutomationSurface, ElementState, SurfaceLauncher, WaitPolicy,
};
use scout_core::{Credential, SessionConfig};
use std::sync::Arc;
use std::time::Duration;

/// Selector of the avatar shown in the header once a user is logged in.
pub const LOGGED_IN_MARKER: &str = ".nav-figure";

/// Outcome of [`SessionManager::restore`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// The saved credentials were accepted.
    Authenticated(Vec<Credential>),
    /// The site showed its login form; a human must log in.
    NeedsInteractive,
}

/// Authenticates the primary automation surface.
pub struct SessionManager {
    surface: Arc<dyn AutomationSurface>,
    launcher: Arc<dyn SurfaceLauncher>,
    urls: SiteUrls,
    settings: SessionConfig,
}

impl SessionManager {
    /// Create a session manager for `surface`.
    ///
    /// `launcher` is only used when `surface` is headless and a visible
    /// window is needed for interactive login.
    #[must_use]
    pub fn new(
        surface: Arc<dyn AutomationSurface>,
        launcher: Arc<dyn SurfaceLauncher>,
        urls: SiteUrls,
        settings: SessionConfig,
    ) -> Self {
        Self {
            surface,
            launcher,
            urls,
            settings,
        }
    }

    /// Restore a session, falling back to interactive login.
    ///
    /// Returns the credentials the caller should persist, whether or not
    /// interaction was needed.
    pub async fn login(&self, credentials: Vec<Credential>) -> Result<Vec<Credential>> {
        match self.restore(credentials).await? {
            SessionState::Authenticated(credentials) => Ok(credentials),
            SessionState::NeedsInteractive => {
                tracing::info!("Saved credentials rejected, interactive login required");
                self.establish_interactively().await
            }
        }
    }

    /// Import saved credentials and check whether the site accepts them.
    ///
    /// A valid session redirects the login page to the site root.
    pub async fn restore(&self, credentials: Vec<Credential>) -> Result<SessionState> {
        if !credentials.is_empty() {
            self.surface.set_cookies(&credentials).await?;
        }

        self.surface
            .navigate(&self.urls.login(), WaitPolicy::NetworkSettled)
            .await?;
        let landed = self.surface.current_url().await?;
        tracing::debug!(url = %landed, "Login page settled");

        if same_location(&landed, self.urls.base())? {
            tracing::info!(
                cookies = credentials.len(),
                "Logged in with saved credentials"
            );
            Ok(SessionState::Authenticated(credentials))
        } else {
            Ok(SessionState::NeedsInteractive)
        }
    }

    /// Wait for a human to log in and return the resulting cookies.
    ///
    /// A headless primary surface cannot show a login form, so a second,
    /// visible surface is launched for the duration of the login.
    pub async fn establish_interactively(&self) -> Result<Vec<Credential>> {
        if !self.settings.allow_interactive_login {
            return Err(ScanError::Configuration(
                "interactive login is disabled but the saved session is not valid".to_string(),
            ));
        }

        let cookies = if self.surface.is_headless() {
            tracing::info!("Opening a visible browser for login");
            let visible = self.launcher.launch(false).await?;
            let result = self.await_login(visible.as_ref()).await;
            if let Err(e) = visible.close().await {
                tracing::warn!("Failed to close login browser: {}", e);
            }
            result?
        } else {
            tracing::info!("Reusing the visible browser for login");
            self.await_login(self.surface.as_ref()).await?
        };

        self.surface.set_cookies(&cookies).await?;
        tracing::info!(cookies = cookies.len(), "Session cookies exported");

        Ok(cookies)
    }

    async fn await_login(&self, surface: &dyn AutomationSurface) -> Result<Vec<Credential>> {
        surface
            .navigate(&self.urls.login(), WaitPolicy::PageLoaded)
            .await?;

        let timeout = Duration::from_secs(self.settings.login_timeout_secs);
        tracing::info!(
            timeout_secs = timeout.as_secs(),
            "Login page loaded, waiting for the user"
        );

        match surface
            .wait_for_element(LOGGED_IN_MARKER, ElementState::Visible, timeout)
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_timeout() => return Err(ScanError::AuthenticationTimeout(timeout)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!("User logged in");
        Ok(surface.get_cookies().await?)
    }
}
