use chromiumoxide::{Browser, BrowserConfig, Handler};
use futures::StreamExt;
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::task::JoinHandle;
use url::Url;

use crate::error::Error;

use super::ChromePage;

/// Options used when launching a local browser.
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    /// Show the browser window instead of running headless.
    show: bool,
    /// Explicit path to the chrome executable.
    executable: Option<String>,
}

impl BrowserOptions {
    /// Returns a new BrowserOptions instance.
    pub fn new(show: bool, executable: Option<String>) -> Self {
        Self { show, executable }
    }

    /// Returns whether the browser window should be shown.
    pub fn show(&self) -> bool {
        self.show
    }

    /// Returns the configured chrome executable, if any.
    pub fn executable(&self) -> Option<&str> {
        self.executable.as_deref()
    }
}

/// Subset of a devtools `/json/version` response.
#[derive(Deserialize, Debug)]
struct VersionInfo {
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: String,
}

/// A browser connection and the task pumping its devtools events.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    /// Attached to a browser we did not start; leave it running on close.
    attached: bool,
}

impl BrowserSession {
    /// Launch a local chrome.
    pub async fn launch(opts: &BrowserOptions) -> Result<Self, Error> {
        let mut builder = BrowserConfig::builder();
        if opts.show() {
            builder = builder.with_head();
        }
        if let Some(exe) = opts.executable() {
            builder = builder.chrome_executable(exe);
        }
        let config = builder.build().map_err(Error::GeneralError)?;

        info!(
            "launching {} browser",
            if opts.show() { "visible" } else { "headless" }
        );
        let (browser, handler) = Browser::launch(config).await?;
        Ok(Self {
            browser,
            handler: spawn_handler(handler),
            attached: false,
        })
    }

    /// Attach to a running chrome through its remote debugging endpoint,
    /// e.g. `http://127.0.0.1:9222`.
    pub async fn connect(endpoint: &Url) -> Result<Self, Error> {
        let version_url = endpoint.join("json/version")?;
        debug!("discovering devtools websocket via {}", version_url);
        let body = reqwest::get(version_url).await?.error_for_status()?.text().await?;
        let ws_url = ws_url_from_version(&body)?;

        info!("attaching to browser at {}", ws_url);
        let (browser, handler) = Browser::connect(ws_url).await?;
        Ok(Self {
            browser,
            handler: spawn_handler(handler),
            attached: true,
        })
    }

    /// Open a new tab at the given url.
    pub async fn new_page(&self, url: &str) -> Result<ChromePage, Error> {
        let page = self.browser.new_page(url).await?;
        Ok(ChromePage::new(page))
    }

    /// Shut the browser down, unless it was attached to.
    pub async fn close(mut self) -> Result<(), Error> {
        if !self.attached {
            info!("closing browser");
            self.browser.close().await?;
            if let Err(e) = self.browser.wait().await {
                warn!("error waiting for browser exit: {}", e);
            }
        }
        self.handler.abort();
        Ok(())
    }
}

/// Extract the websocket debugger url from a devtools `/json/version` body.
fn ws_url_from_version(body: &str) -> Result<String, Error> {
    let info: VersionInfo = serde_json::from_str(body)?;
    Ok(info.web_socket_debugger_url)
}

// The handler stream must be polled for the browser connection to make progress.
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!("browser handler event error: {}", e);
            }
        }
    })
}
