use clap::builder::ValueParser;
use log::{info, warn};
use std::time::Duration;
use url::Url;

use crate::browser::BrowserOptions;
use crate::error::Error;
use crate::harvest::{HarvestOptions, SiteProfile, Timeouts};

use super::Cli;

pub fn str_not_whitespace_parser() -> ValueParser {
    ValueParser::new(str_not_whitespace)
}

pub fn str_not_whitespace(value: &str) -> Result<String, Error> {
    if value.is_empty() || value.trim().len() != value.len() {
        Err(Error::GeneralError(
            "value cannot have leading/trailing whitespace, nor consist of only whitespace"
                .to_string(),
        ))
    } else {
        Ok(value.trim().to_string())
    }
}

/// Helper for url parsing, predominantly to wrap errors.
pub fn parse_url(url_str: &str) -> Result<Url, Error> {
    let res = Url::parse(url_str);
    match res {
        Err(e) => Err(Error::UrlParseError(e)),
        Ok(u) => Ok(u),
    }
}

/// Build the site profile from the profile file (if any) and cli overrides;
/// the start url must be a valid url.
pub fn build_profile(args: &Cli) -> Result<SiteProfile, Error> {
    let mut profile = match args.profile.as_deref() {
        Some(file) => {
            info!("using site profile '{}'", file);
            SiteProfile::new_from_file(file)?
        }
        None => SiteProfile::default(),
    };

    if let Some(url) = args.url.as_deref() {
        profile.start_url = url.to_string();
    }
    if let Err(e) = parse_url(&profile.start_url) {
        warn!("error parsing start url {}", profile.start_url);
        return Err(e);
    }

    Ok(profile)
}

/// Build harvest options from cli args.
pub fn build_harvest_options(args: &Cli) -> HarvestOptions {
    let popup = Duration::from_secs(args.popup_timeout);
    let timeouts = Timeouts {
        listings: Duration::from_secs(args.listing_timeout),
        popup,
        close: popup,
        next: popup,
        next_stale: Duration::from_secs(args.page_timeout),
        ..Timeouts::default()
    };
    HarvestOptions::new(
        timeouts,
        Duration::from_millis(args.settle_ms),
        args.max_pages,
    )
}

/// Build browser launch options from cli args.
pub fn build_browser_options(args: &Cli) -> BrowserOptions {
    BrowserOptions::new(args.browser.show_browser, args.browser.chrome.clone())
}

/// Parse the remote debugging endpoint to attach to, if one was given.
pub fn parse_connect(args: &Cli) -> Result<Option<Url>, Error> {
    match args.browser.connect.as_deref() {
        None => Ok(None),
        Some(endpoint) => match parse_url(endpoint) {
            Err(e) => {
                warn!("error parsing browser endpoint {}", endpoint);
                Err(e)
            }
            Ok(u) => Ok(Some(u)),
        },
    }
}
