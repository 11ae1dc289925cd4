use clap::{Args, Parser};
use clap_verbosity_flag::{InfoLevel, Verbosity};

use super::helpers;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory page to start from; overrides the profile's start URL.
    #[arg(short, long, value_parser = helpers::str_not_whitespace_parser())]
    pub url: Option<String>,
    /// Site profile (json) describing the directory's page structure; built-in defaults are used
    /// for anything it leaves out.
    #[arg(short, long, value_parser = helpers::str_not_whitespace_parser())]
    pub profile: Option<String>,
    /// File to write listings to, csv formatted (will be overwritten if it already exists).
    #[arg(short, long, default_value = "listings.csv", value_parser = helpers::str_not_whitespace_parser())]
    pub output: String,
    /// Keep the listings of an existing output file, adding only new ones.
    #[arg(long, default_value_t = false)]
    pub append: bool,
    /// Stop after this many result pages.
    #[arg(short, long)]
    pub max_pages: Option<usize>,
    /// Pause after dismissing each popup (milliseconds).
    #[arg(long, default_value_t = 1000)]
    pub settle_ms: u64,
    /// Seconds to wait for listings to show up on a result page.
    #[arg(long, default_value_t = 20)]
    pub listing_timeout: u64,
    /// Seconds to wait for a popup, its close button or the next page link.
    #[arg(long, default_value_t = 10)]
    pub popup_timeout: u64,
    /// Seconds to wait for the next result page to replace the current one.
    #[arg(long, default_value_t = 20)]
    pub page_timeout: u64,
    /// Browser to drive.
    #[command(flatten)]
    pub browser: BrowserArgs,
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,
}

#[derive(Args, Debug, Clone)]
pub struct BrowserArgs {
    /// Show the browser window instead of running headless.
    #[arg(long, default_value_t = false)]
    pub show_browser: bool,
    /// Path to the chrome/chromium executable; searched for if not given.
    #[arg(long, value_parser = helpers::str_not_whitespace_parser())]
    pub chrome: Option<String>,
    /// Attach to a running browser via its remote debugging endpoint instead of launching one
    /// (e.g. http://127.0.0.1:9222).
    #[arg(long, conflicts_with_all = ["show_browser", "chrome"], value_parser = helpers::str_not_whitespace_parser())]
    pub connect: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = Cli::try_parse_from(["popharvest"]).unwrap();
        assert_eq!(args.output, "listings.csv");
        assert_eq!(args.settle_ms, 1000);
        assert_eq!(args.max_pages, None);
        assert!(!args.append);
        assert!(!args.browser.show_browser);
        assert!(args.url.is_none());
    }

    #[test]
    fn test_connect_conflicts_with_launch_options() {
        let res = Cli::try_parse_from([
            "popharvest",
            "--connect",
            "http://127.0.0.1:9222",
            "--show-browser",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_whitespace_output_rejected() {
        assert!(Cli::try_parse_from(["popharvest", "-o", " out.csv"]).is_err());
    }
}
