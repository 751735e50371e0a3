//! `scout discover`: restore the session, then collect listings.

use anyhow::{Context, Result};
use clap::Args;
use futures::StreamExt;
use scout_browser::{AutomationSurface, ChromiumLauncher, ChromiumSurface, LaunchOptions};
use scout_core::AppConfig;
use scout_db::{credentials, listings, Database};
use scout_scanner::{
    AcceptAll, DiscoveryEngine, DiscoveryOptions, RandomPacer, SessionManager, SiteUrls,
};
use std::sync::Arc;
use tracing::{info, warn, Instrument};

#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Recommendation page to start from
    #[arg(long)]
    pub from_url: String,

    /// Number of listings to collect (defaults to `discovery.requested_count`)
    #[arg(long)]
    pub count: Option<usize>,

    /// Show the primary browser window
    #[arg(long)]
    pub headed: bool,
}

pub async fn run(config: &AppConfig, args: DiscoverArgs) -> Result<()> {
    let run_id = uuid::Uuid::new_v4();
    async move {
        let db = super::open_database(config).await?;

        let mut options = LaunchOptions::from(&config.browser);
        if args.headed {
            options.headless = false;
        }
        let surface: Arc<dyn AutomationSurface> = Arc::new(
            ChromiumSurface::launch(options.clone())
                .await
                .context("failed to launch browser")?,
        );

        let result = discover(config, &args, &db, surface.clone(), options).await;
        if let Err(e) = surface.close().await {
            warn!("Failed to close browser: {}", e);
        }
        db.close().await;
        result
    }
    .instrument(tracing::info_span!("discover", run = %run_id))
    .await
}

async fn discover(
    config: &AppConfig,
    args: &DiscoverArgs,
    db: &Database,
    surface: Arc<dyn AutomationSurface>,
    options: LaunchOptions,
) -> Result<()> {
    let urls = SiteUrls::new(&config.site.base_url)?;

    let saved = {
        let mut conn = db.pool().acquire().await?;
        credentials::fetch_all(&mut conn).await?
    };
    info!(saved = saved.len(), "Restoring session");

    let session = SessionManager::new(
        surface.clone(),
        Arc::new(ChromiumLauncher::new(options)),
        urls.clone(),
        config.session.clone(),
    );
    let credentials = session.login(saved).await.context("login failed")?;

    let mut tx = db.begin().await?;
    credentials::replace_all(&mut tx, &credentials).await?;
    tx.commit().await?;
    info!(count = credentials.len(), "Session credentials saved");

    let mut engine = DiscoveryEngine::new(
        surface,
        urls,
        DiscoveryOptions::from(&config.discovery),
    )
    .with_pacer(RandomPacer::from_config(&config.discovery));
    if !config.discovery.skip_inactive_recruiters {
        engine = engine.with_filter(AcceptAll);
    }

    let count = args.count.unwrap_or(config.discovery.requested_count);
    let mut listings_stream = Box::pin(engine.discover(args.from_url.clone(), count).into_stream());

    let mut saved_count = 0usize;
    while let Some(listing) = listings_stream.next().await {
        let listing = listing.context("discovery failed")?;

        let mut tx = db.begin().await?;
        listings::upsert_listing(&mut tx, &listing).await?;
        tx.commit().await?;

        saved_count += 1;
        info!(
            job_id = %listing.job_id,
            company = %listing.company_name,
            "[{}/{}] {}",
            saved_count,
            count,
            listing.job_name
        );
    }

    if saved_count < count {
        warn!(saved = saved_count, requested = count, "Listing ran out early");
    }
    println!("Saved {saved_count} listing(s)");
    Ok(())
}
