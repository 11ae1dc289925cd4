//! Cli tool to harvest listings from a paginated directory website.
//!
use clap::Parser;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{error, info, warn};
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;

use popharvest::browser::BrowserSession;
use popharvest::cli::{self, Cli};
use popharvest::collections::ListingDb;
use popharvest::harvest::{HarvestOptions, HarvestSummary, Harvester, SiteProfile};
use popharvest::output;
use popharvest::{Error, Shutdown};

/// Main function.
#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Cli::parse();

    let multi = MultiProgress::new();
    let logger = env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .build();
    let level = logger.filter();
    if let Err(e) = LogWrapper::new(multi.clone(), logger).try_init() {
        eprintln!("failed to initialize logging: {}", e);
    }
    log::set_max_level(level);

    let profile = cli::build_profile(&args)?;
    let connect = cli::parse_connect(&args)?;
    let opts = cli::build_harvest_options(&args);

    let mut listings = ListingDb::new();
    if args.append {
        output::fill_listingdb_from_file(&mut listings, &args.output)?;
    }

    let (notify_shutdown, _) = broadcast::channel(1);
    let shutdown = Shutdown::new(notify_shutdown.subscribe());
    let sig_handle = tokio::spawn(async move {
        tokio::select! {
            _ = signal::ctrl_c() => {
                warn!("shutting down, keeping what was collected so far...");
                // When `notify_shutdown` is dropped, all tasks which have `subscribe`d will
                // receive the shutdown signal and can exit
                drop(notify_shutdown);
            }
        }
    });

    let session = match connect {
        Some(endpoint) => BrowserSession::connect(&endpoint).await?,
        None => BrowserSession::launch(&cli::build_browser_options(&args)).await?,
    };

    let spinner = multi.add(ProgressBar::new_spinner());
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed}] {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = harvest(
        &session,
        profile,
        opts,
        listings.clone(),
        shutdown,
        spinner.clone(),
    )
    .await;
    spinner.finish_and_clear();

    if let Err(e) = session.close().await {
        warn!("error closing browser: {}", e);
    }
    // cleanup if we weren't interrupted
    if !sig_handle.is_finished() {
        sig_handle.abort();
    }

    // whatever was collected is written, even if the harvest failed
    let rows = output::write_listings(&args.output, &listings)?;

    println!();
    match result {
        Ok(summary) => {
            println!("pages visited: {}", summary.pages);
            println!("listings opened: {}", summary.opened);
            println!("listings skipped: {}", summary.skipped);
        }
        Err(e) => error!("harvest stopped early: {}", e),
    }
    println!("unique listings: {}", rows);
    println!("listings written to: {}", args.output);
    println!();

    Ok(())
}

/// Open a tab and run the harvest in it.
async fn harvest(
    session: &BrowserSession,
    profile: SiteProfile,
    opts: HarvestOptions,
    listings: ListingDb,
    shutdown: Shutdown,
    progress: ProgressBar,
) -> Result<HarvestSummary, Error> {
    let page = session.new_page("about:blank").await?;
    let mut harvester = Harvester::new(page, profile, opts, listings, shutdown, progress);
    let summary = harvester.harvest().await?;
    info!(
        "harvest finished after {} pages with {} unique listings",
        summary.pages, summary.collected
    );
    Ok(summary)
}
