use indicatif::ProgressBar;
use log::{debug, info, warn};
use std::collections::HashSet;
use tokio::time::{sleep, Duration};

use crate::browser::{Page, Waiter};
use crate::collections::ListingDb;
use crate::error::Error;
use crate::extract::{Extractor, Listing};
use crate::shutdown::Shutdown;

use super::SiteProfile;

/// Pages through a directory, opening each listing's popup and collecting
/// the unique listings found.
pub struct Harvester<P: Page> {
    page: P,
    profile: SiteProfile,
    opts: HarvestOptions,
    extractor: Extractor,
    listings: ListingDb,
    waiter: Waiter,
    summary: HarvestSummary,
    progress: ProgressBar,
    /// Listen for shutdown notifications.
    ///
    /// A wrapper around the `broadcast::Receiver` to be paired with a sender.
    shutdown: Shutdown,
}

impl<P: Page> Harvester<P> {
    /// Returns a new Harvester driving the given page.
    pub fn new(
        page: P,
        profile: SiteProfile,
        opts: HarvestOptions,
        listings: ListingDb,
        shutdown: Shutdown,
        progress: ProgressBar,
    ) -> Self {
        let extractor = Extractor::new(profile.extract_options());
        let waiter = Waiter::new_with_poll(opts.poll(), shutdown.clone());
        Self {
            page,
            profile,
            opts,
            extractor,
            listings,
            waiter,
            summary: HarvestSummary::default(),
            progress,
            shutdown,
        }
    }

    /// Visit every result page, collecting listings until pagination runs
    /// out, the page limit is hit or shutdown is signalled; only a failed
    /// initial navigation is an error.
    pub async fn harvest(&mut self) -> Result<HarvestSummary, Error> {
        info!("navigating to {}", self.profile.start_url);
        self.page.goto(&self.profile.start_url).await?;

        loop {
            if self.shutdown.is_shutdown() {
                break;
            }

            let locator = self.profile.listing_locator();
            let listings = match self
                .waiter
                .wait_for_all_present(&self.page, &locator, self.opts.timeouts.listings)
                .await
            {
                Ok(found) => found,
                Err(Error::EarlyTerminationError) => break,
                Err(e) => {
                    warn!("no listings on page {}: {}", self.summary.pages + 1, e);
                    break;
                }
            };
            self.summary.pages += 1;
            info!(
                "found {} listings on page {}",
                listings.len(),
                self.summary.pages
            );
            self.report();

            self.visit_page(&listings).await;
            if self.shutdown.is_shutdown() {
                break;
            }

            if let Some(max) = self.opts.max_pages {
                if self.summary.pages >= max {
                    info!("reached page limit of {}", max);
                    break;
                }
            }
            match self.advance().await {
                Ok(_) => {}
                Err(Error::EarlyTerminationError) => break,
                Err(e) => {
                    info!("no further pages: {}", e);
                    break;
                }
            }
        }

        self.summary.collected = self.listings.len();
        Ok(self.summary.clone())
    }

    /// Open, read and close every wanted listing of the current page; each
    /// listing id is opened at most once per page.
    async fn visit_page(&mut self, listings: &[P::Element]) {
        let mut opened: HashSet<String> = HashSet::new();
        for tag in listings {
            if self.shutdown.is_shutdown() {
                return;
            }

            let id = match self.page.attribute(tag, "id").await {
                Ok(Some(id)) => id,
                Ok(None) => continue,
                Err(e) => {
                    debug!("could not read listing id: {}", e);
                    continue;
                }
            };
            if !self.profile.wants_listing(&id) {
                continue;
            }
            if !opened.insert(id.clone()) {
                debug!("already opened '{}' on this page, skipping", id);
                continue;
            }

            info!("opening listing '{}'", id);
            self.summary.opened += 1;
            match self.visit_listing(tag, &id).await {
                Ok(listing) => {
                    let name = listing.name.clone();
                    if self.listings.insert(listing) {
                        info!("collected '{}'", name);
                    } else {
                        debug!("duplicate listing '{}'", name);
                    }
                }
                Err(Error::EarlyTerminationError) => return,
                Err(e) => {
                    warn!("skipping listing '{}': {}", id, e);
                    self.summary.skipped += 1;
                }
            }

            self.close_popup().await;
            self.settle().await;
            self.report();
        }
    }

    /// Click the listing and read its popup.
    async fn visit_listing(&mut self, tag: &P::Element, id: &str) -> Result<Listing, Error> {
        let t = self.opts.timeouts.clone();

        let fresh;
        let target = if self.page.is_stale(tag).await? {
            debug!("listing '{}' went stale, looking it up again", id);
            fresh = self.relocate(id).await?;
            &fresh
        } else {
            tag
        };

        self.waiter
            .wait_for_clickable(&self.page, target, t.popup)
            .await?;
        self.page.click(target).await?;

        let locator = self.profile.popup_locator();
        let popup = self
            .waiter
            .wait_for_present(&self.page, &locator, t.popup)
            .await?;
        let html = self.page.outer_html(&popup).await?;
        Ok(self.extractor.listing_from_html(&html))
    }

    /// Find the current handle of the listing with the given id.
    async fn relocate(&self, id: &str) -> Result<P::Element, Error> {
        for el in self.page.find_all(&self.profile.listing_locator()).await? {
            if let Ok(Some(other)) = self.page.attribute(&el, "id").await {
                if other == id {
                    return Ok(el);
                }
            }
        }
        Err(Error::ElementNotFound(format!("listing '{}'", id)))
    }

    /// Dismiss the popup and wait for it to go away; failures are only logged.
    async fn close_popup(&mut self) {
        let t = self.opts.timeouts.clone();
        let locator = self.profile.close_locator();
        let button = match self
            .waiter
            .wait_for_clickable_locator(&self.page, &locator, t.close)
            .await
        {
            Ok(b) => b,
            Err(e) => {
                warn!("could not close popup: {}", e);
                return;
            }
        };
        if let Err(e) = self.page.click(&button).await {
            warn!("could not close popup: {}", e);
            return;
        }
        if let Err(e) = self
            .waiter
            .wait_for_stale(&self.page, &button, t.close_stale)
            .await
        {
            warn!("popup did not go away: {}", e);
        }
    }

    /// Move to the next result page; returns once the old pagination control
    /// has gone stale.
    async fn advance(&mut self) -> Result<(), Error> {
        let t = self.opts.timeouts.clone();
        let locator = self.profile.next_locator();
        let next = self
            .waiter
            .wait_for_clickable_locator(&self.page, &locator, t.next)
            .await?;
        info!("moving to page {}", self.summary.pages + 1);
        self.page.click(&next).await?;
        self.waiter
            .wait_for_stale(&self.page, &next, t.next_stale)
            .await
    }

    // Give the page a moment to settle after a popup closes.
    async fn settle(&mut self) {
        tokio::select! {
            _ = sleep(self.opts.settle) => {}
            _ = self.shutdown.recv() => {}
        }
    }

    fn report(&self) {
        self.progress.set_message(format!(
            "page {} | {} listings collected",
            self.summary.pages,
            self.listings.len()
        ));
    }
}

/// How a harvest went.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestSummary {
    /// Result pages visited.
    pub pages: usize,
    /// Listings opened.
    pub opened: usize,
    /// Listings skipped after a failure.
    pub skipped: usize,
    /// Unique listings held at the end.
    pub collected: usize,
}

/// How long to wait for each step of the loop.
#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Listings to show up on a result page.
    pub listings: Duration,
    /// A listing to become clickable, and its popup to appear.
    pub popup: Duration,
    /// The popup's close button to become clickable.
    pub close: Duration,
    /// The close button to disappear once clicked.
    pub close_stale: Duration,
    /// The next page link to become clickable.
    pub next: Duration,
    /// The next page link to disappear once clicked.
    pub next_stale: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            listings: Duration::from_secs(20),
            popup: Duration::from_secs(10),
            close: Duration::from_secs(10),
            close_stale: Duration::from_secs(5),
            next: Duration::from_secs(10),
            next_stale: Duration::from_secs(20),
        }
    }
}

/// Options used when harvesting.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    timeouts: Timeouts,
    /// Pause after each popup is dismissed.
    settle: Duration,
    /// Stop after this many result pages.
    max_pages: Option<usize>,
    /// Interval between checks while waiting.
    poll: Duration,
}

impl HarvestOptions {
    /// Returns a new HarvestOptions instance.
    pub fn new(timeouts: Timeouts, settle: Duration, max_pages: Option<usize>) -> Self {
        Self {
            timeouts,
            settle,
            max_pages,
            poll: crate::browser::DEFAULT_POLL,
        }
    }

    /// Returns the configured step timeouts.
    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Returns the pause taken after each popup.
    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Returns the page limit, if any.
    pub fn max_pages(&self) -> Option<usize> {
        self.max_pages
    }

    /// Returns the wait polling interval.
    pub fn poll(&self) -> Duration {
        self.poll
    }
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self::new(Timeouts::default(), Duration::from_secs(1), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{popup_html, FakeListing, FakePage, FakeSite};
    use tokio::sync::broadcast;

    fn harvester(
        site: FakeSite,
        max_pages: Option<usize>,
    ) -> (broadcast::Sender<()>, ListingDb, Harvester<FakePage>) {
        let (tx, _) = broadcast::channel(1);
        let db = ListingDb::new();
        let opts = HarvestOptions::new(Timeouts::default(), Duration::from_secs(1), max_pages);
        let h = Harvester::new(
            FakePage::new(site),
            SiteProfile::default(),
            opts,
            db.clone(),
            Shutdown::new(tx.subscribe()),
            ProgressBar::hidden(),
        );
        (tx, db, h)
    }

    fn names(db: &ListingDb) -> Vec<String> {
        db.iter().map(|l| l.name).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_walks_every_page() {
        let site = FakeSite::paged(&[
            &["p1a:j_id39", "p1b:j_id39"],
            &["p2a:j_id39"],
            &["p3a:j_id39"],
        ]);
        let (_tx, db, mut h) = harvester(site, None);

        let summary = h.harvest().await.unwrap();
        assert_eq!(
            summary,
            HarvestSummary {
                pages: 3,
                opened: 4,
                skipped: 0,
                collected: 4
            }
        );
        assert_eq!(
            names(&db),
            vec!["p1a:j_id39", "p1b:j_id39", "p2a:j_id39", "p3a:j_id39"]
        );
        assert_eq!(h.page.closes(), 4);
        assert_eq!(h.page.current_page(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_filters_ids_and_dedupes() {
        let mut site = FakeSite::default();
        site.pages = vec![
            vec![
                FakeListing::new("a:j_id39", &popup_html("Same", "1 Road, AB1")),
                FakeListing::new("a:j_id39", &popup_html("Again", "")),
                FakeListing::new("a:j_id40", &popup_html("Wrong suffix", "")),
                FakeListing::without_id(),
            ],
            // same record on a later page under the same id
            vec![FakeListing::new("a:j_id39", &popup_html("Same", "1 Road, AB1"))],
        ];
        let (_tx, db, mut h) = harvester(site, None);

        let summary = h.harvest().await.unwrap();
        assert_eq!(h.page.clicked(), vec!["a:j_id39", "a:j_id39"]);
        assert_eq!(summary.opened, 2);
        assert_eq!(summary.collected, 1);
        let only = db.iter().next().unwrap();
        assert_eq!(only.name, "Same");
        assert_eq!((only.address.as_str(), only.postcode.as_str()), ("1 Road", "AB1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_listing_is_skipped() {
        let mut site = FakeSite::default();
        site.pages = vec![vec![
            FakeListing::broken("bad:j_id39"),
            FakeListing::new("good:j_id39", &popup_html("Good", "")),
        ]];
        let (_tx, db, mut h) = harvester(site, None);

        let summary = h.harvest().await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(names(&db), vec!["Good"]);
        assert_eq!(h.page.clicked(), vec!["bad:j_id39", "good:j_id39"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_listings_are_relocated() {
        let mut site = FakeSite::paged(&[&["a:j_id39", "b:j_id39", "c:j_id39"]]);
        site.rerender_on_close = true;
        let (_tx, db, mut h) = harvester(site, None);

        let summary = h.harvest().await.unwrap();
        assert_eq!(summary.skipped, 0);
        assert_eq!(db.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_gone_after_rerender_is_skipped() {
        let mut site = FakeSite::paged(&[&["a:j_id39", "b:j_id39", "c:j_id39"]]);
        site.rerender_on_close = true;
        site.vanishing = vec!["b:j_id39".to_string()];
        let (_tx, db, mut h) = harvester(site, None);

        let summary = h.harvest().await.unwrap();
        assert_eq!(summary.opened, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(names(&db), vec!["a:j_id39", "c:j_id39"]);
        assert_eq!(h.page.clicked(), vec!["a:j_id39", "c:j_id39"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sticky_popup_does_not_stop_the_run() {
        let mut site = FakeSite::paged(&[&["a:j_id39", "b:j_id39"]]);
        site.sticky_popup = true;
        let (_tx, db, mut h) = harvester(site, None);

        h.harvest().await.unwrap();
        assert_eq!(db.len(), 2);
        assert_eq!(h.page.closes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_limit() {
        let site = FakeSite::paged(&[&["a:j_id39"], &["b:j_id39"], &["c:j_id39"]]);
        let (_tx, db, mut h) = harvester(site, Some(2));

        let summary = h.harvest().await.unwrap();
        assert_eq!(summary.pages, 2);
        assert_eq!(names(&db), vec!["a:j_id39", "b:j_id39"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_directory() {
        let (_tx, db, mut h) = harvester(FakeSite::paged(&[&[]]), None);

        let summary = h.harvest().await.unwrap();
        assert_eq!(summary, HarvestSummary::default());
        assert!(db.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_mid_run_keeps_collected() {
        let site = FakeSite::paged(&[
            &["a:j_id39", "b:j_id39", "c:j_id39"],
            &["d:j_id39", "e:j_id39", "f:j_id39"],
            &["g:j_id39", "h:j_id39", "i:j_id39"],
        ]);
        let (tx, db, mut h) = harvester(site, None);
        // one second of settling per listing, so this lands while the
        // second listing of the first page settles
        tokio::spawn(async move {
            sleep(Duration::from_millis(1500)).await;
            drop(tx);
        });

        let summary = h.harvest().await.unwrap();
        assert_eq!(summary.pages, 1);
        assert_eq!(names(&db), vec!["a:j_id39", "b:j_id39"]);
        assert_eq!(summary.collected, 2);
        assert_eq!(h.page.current_page(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_start_collects_nothing() {
        let (tx, db, mut h) = harvester(FakeSite::paged(&[&["a:j_id39"]]), None);
        drop(tx);

        let summary = h.harvest().await.unwrap();
        assert_eq!(summary.pages, 0);
        assert!(db.is_empty());
    }
}
