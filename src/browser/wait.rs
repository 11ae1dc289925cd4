use log::trace;
use std::future::Future;
use tokio::time::{sleep, Duration, Instant};

use crate::error::Error;
use crate::shutdown::Shutdown;

use super::{Locator, Page};

/// Interval between two checks of a wait condition.
pub const DEFAULT_POLL: Duration = Duration::from_millis(500);

/// Polls a page until a condition holds, a timeout expires or shutdown is
/// signalled.
#[derive(Debug, Clone)]
pub struct Waiter {
    poll: Duration,
    /// Listen for shutdown notifications.
    shutdown: Shutdown,
}

impl Waiter {
    /// Returns a new Waiter polling at the default interval.
    pub fn new(shutdown: Shutdown) -> Self {
        Self::new_with_poll(DEFAULT_POLL, shutdown)
    }

    /// Returns a new Waiter polling at the given interval.
    pub fn new_with_poll(poll: Duration, shutdown: Shutdown) -> Self {
        Self { poll, shutdown }
    }

    /// Wait for at least one element matching the locator; returns the first.
    pub async fn wait_for_present<P: Page>(
        &mut self,
        page: &P,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<P::Element, Error> {
        let what = format!("presence of {}", locator);
        self.until(&what, timeout, move || async move {
            let found = page.find_all(locator).await?;
            Ok::<_, Error>(found.into_iter().next())
        })
        .await
    }

    /// Wait for at least one element matching the locator; returns all of them.
    pub async fn wait_for_all_present<P: Page>(
        &mut self,
        page: &P,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<Vec<P::Element>, Error> {
        let what = format!("presence of all {}", locator);
        self.until(&what, timeout, move || async move {
            let found = page.find_all(locator).await?;
            Ok::<_, Error>(if found.is_empty() { None } else { Some(found) })
        })
        .await
    }

    /// Wait for an element matching the locator to become clickable; returns
    /// the first clickable match.
    pub async fn wait_for_clickable_locator<P: Page>(
        &mut self,
        page: &P,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<P::Element, Error> {
        let what = format!("clickable {}", locator);
        self.until(&what, timeout, move || async move {
            for el in page.find_all(locator).await? {
                if page.is_clickable(&el).await? {
                    return Ok(Some(el));
                }
            }
            Ok::<_, Error>(None)
        })
        .await
    }

    /// Wait for the given element to become clickable.
    pub async fn wait_for_clickable<P: Page>(
        &mut self,
        page: &P,
        el: &P::Element,
        timeout: Duration,
    ) -> Result<(), Error> {
        self.until("clickable element", timeout, move || async move {
            Ok::<_, Error>(page.is_clickable(el).await?.then_some(()))
        })
        .await
    }

    /// Wait for the given element to be detached from the document.
    pub async fn wait_for_stale<P: Page>(
        &mut self,
        page: &P,
        el: &P::Element,
        timeout: Duration,
    ) -> Result<(), Error> {
        self.until("staleness of element", timeout, move || async move {
            Ok::<_, Error>(page.is_stale(el).await?.then_some(()))
        })
        .await
    }

    // Runs the probe until it yields a value. Probe errors count as "not yet"
    // since elements come and go while the page renders.
    async fn until<T, F, Fut>(
        &mut self,
        what: &str,
        timeout: Duration,
        mut probe: F,
    ) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, Error>>,
    {
        let start = Instant::now();
        loop {
            if self.shutdown.is_shutdown() {
                return Err(Error::EarlyTerminationError);
            }
            match probe().await {
                Ok(Some(v)) => return Ok(v),
                Ok(None) => {}
                Err(e) => trace!("still waiting for {}: {}", what, e),
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(Error::Timeout {
                    what: what.to_string(),
                    waited: timeout,
                });
            }
            tokio::select! {
                _ = sleep(self.poll.min(timeout - elapsed)) => {}
                _ = self.shutdown.recv() => {}
            }
        }
    }
}
