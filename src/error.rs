use std::time::Duration;

#[derive(Debug)]
/// Errors that can occur
pub enum Error {
    IoError(std::io::Error),
    BrowserError(chromiumoxide::error::CdpError),
    RequestError(reqwest::Error),
    UrlParseError(url::ParseError),
    SerdeError(serde_json::Error),
    CsvError(csv::Error),
    /// A wait on the page expired before its condition held.
    Timeout {
        what: String,
        waited: Duration,
    },
    ElementNotFound(String),
    EarlyTerminationError,
    GeneralError(String),
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(why: std::io::Error) -> Error {
        Error::IoError(why)
    }
}

impl From<chromiumoxide::error::CdpError> for Error {
    fn from(why: chromiumoxide::error::CdpError) -> Error {
        Error::BrowserError(why)
    }
}

impl From<reqwest::Error> for Error {
    fn from(why: reqwest::Error) -> Error {
        Error::RequestError(why)
    }
}

impl From<url::ParseError> for Error {
    fn from(why: url::ParseError) -> Error {
        Error::UrlParseError(why)
    }
}

impl From<serde_json::Error> for Error {
    fn from(why: serde_json::Error) -> Error {
        Error::SerdeError(why)
    }
}

impl From<csv::Error> for Error {
    fn from(why: csv::Error) -> Error {
        Error::CsvError(why)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(why) => write!(f, "io error: {}", why),
            Error::BrowserError(why) => write!(f, "browser error: {}", why),
            Error::RequestError(why) => write!(f, "request error: {}", why),
            Error::UrlParseError(why) => write!(f, "url parsing error: {}", why),
            Error::SerdeError(why) => write!(f, "serde serialize/deserialize error: {}", why),
            Error::CsvError(why) => write!(f, "csv error: {}", why),
            Error::Timeout { what, waited } => {
                write!(f, "timed out after {:?} waiting for {}", waited, what)
            }
            Error::ElementNotFound(what) => write!(f, "element not found: {}", what),
            Error::EarlyTerminationError => write!(f, "terminating early"),
            Error::GeneralError(why) => write!(f, "{}", why),
        }
    }
}
