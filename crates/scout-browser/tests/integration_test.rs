use scout_browser::{
    AutomationSurface, ChromiumLauncher, ChromiumSurface, ElementState, LaunchOptions,
    SurfaceLauncher, WaitPolicy,
};
use scout_core::Credential;
use std::time::Duration;

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_surface_launch() {
    let surface = ChromiumSurface::launch(LaunchOptions::default()).await;
    assert!(surface.is_ok(), "Failed to launch Chromium surface");
    surface.unwrap().close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_navigation_and_element_wait() {
    let surface = ChromiumSurface::launch(LaunchOptions::default()).await.unwrap();

    surface
        .navigate("https://example.com", WaitPolicy::NetworkSettled)
        .await
        .unwrap();
    assert!(surface.current_url().await.unwrap().starts_with("https://example.com"));

    surface
        .wait_for_element("h1", ElementState::Visible, Duration::from_secs(5))
        .await
        .unwrap();
    let missing = surface
        .wait_for_element(".does-not-exist", ElementState::Visible, Duration::from_millis(300))
        .await;
    assert!(missing.unwrap_err().is_timeout());

    assert_eq!(surface.query_all("h1").await.unwrap().len(), 1);
    surface.close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_cookie_round_trip() {
    let surface = ChromiumSurface::launch(LaunchOptions::default()).await.unwrap();
    surface
        .navigate("https://example.com", WaitPolicy::PageLoaded)
        .await
        .unwrap();

    let cookie = Credential::new("scout", "1").scoped("example.com", "/");
    surface.set_cookies(&[cookie]).await.unwrap();

    let cookies = surface.get_cookies().await.unwrap();
    assert!(cookies.iter().any(|c| c.name == "scout" && c.value == "1"));
    surface.close().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_launcher_opens_independent_surface() {
    let launcher = ChromiumLauncher::new(LaunchOptions::default());
    let surface = launcher.launch(true).await.unwrap();
    assert!(surface.is_headless());
    surface.close().await.unwrap();
}
