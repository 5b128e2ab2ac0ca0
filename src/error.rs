//! Error enum
use std::fmt;

use crate::lang::Lang;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Csv(csv::Error),
    Serde(serde_json::Error),
    Yaml(serde_yaml::Error),
    Http(reqwest::Error),
    Telegram(String),
    HttpStatus(u16, String),
    Xml(quick_xml::Error),
    Url(url::ParseError),
    Regex(regex::Error),
    FastText(String),
    /// Rate limited with no usable wait hint, retries exhausted.
    RateLimited(String),
    /// Flood control with an explicit wait, in seconds.
    FloodWait(u64),
    UnknownLang(String),
    UnsupportedLang(Lang),
    UnknownCategory(String),
    MissingColumn(String),
    Config(String),
    Custom(String),
}

/// How the retry controller must treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    FloodWait(u64),
    Transient,
    Fatal,
}

impl Error {
    /// Classify the error for [crate::sources::retry::Backoff].
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::RateLimited(_) => FailureKind::RateLimited,
            Error::FloodWait(secs) => FailureKind::FloodWait(*secs),
            Error::HttpStatus(429, _) => FailureKind::RateLimited,
            Error::HttpStatus(status, _) if *status >= 500 => FailureKind::Transient,
            Error::HttpStatus(_, _) => FailureKind::Fatal,
            Error::Http(e) => match e.status() {
                Some(status) if status.as_u16() == 429 => FailureKind::RateLimited,
                Some(status) if status.is_client_error() => FailureKind::Fatal,
                _ => FailureKind::Transient,
            },
            _ => FailureKind::Fatal,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io: {e}"),
            Error::Csv(e) => write!(f, "csv: {e}"),
            Error::Serde(e) => write!(f, "json: {e}"),
            Error::Yaml(e) => write!(f, "yaml: {e}"),
            Error::Http(e) => write!(f, "http: {e}"),
            Error::Telegram(e) => write!(f, "telegram: {e}"),
            Error::HttpStatus(status, url) => write!(f, "http status {status} for {url}"),
            Error::Xml(e) => write!(f, "xml: {e}"),
            Error::Url(e) => write!(f, "url: {e}"),
            Error::Regex(e) => write!(f, "regex: {e}"),
            Error::FastText(e) => write!(f, "fasttext: {e}"),
            Error::RateLimited(what) => write!(f, "rate limited: {what}"),
            Error::FloodWait(secs) => write!(f, "flood wait of {secs}s requested"),
            Error::UnknownLang(l) => write!(f, "unknown language: {l}"),
            Error::UnsupportedLang(l) => write!(f, "no pipeline registered for language {l}"),
            Error::UnknownCategory(c) => write!(f, "unknown category: {c}"),
            Error::MissingColumn(c) => write!(f, "missing column: {c}"),
            Error::Config(c) => write!(f, "configuration: {c}"),
            Error::Custom(c) => write!(f, "{c}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<csv::Error> for Error {
    fn from(e: csv::Error) -> Error {
        Error::Csv(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Error {
        Error::Yaml(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::Http(e)
    }
}

/// Wait requested by a `FLOOD_WAIT` answer, written either `FLOOD_WAIT_<n>` or `FLOOD_WAIT ... value: <n>`.
fn flood_wait_seconds(message: &str) -> Option<u64> {
    let digits = |s: &str| {
        s.chars()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse::<u64>()
            .ok()
    };
    let idx = message.find("FLOOD_WAIT")?;
    let rest = &message[idx + "FLOOD_WAIT".len()..];
    if let Some(secs) = rest.strip_prefix('_').and_then(digits) {
        return Some(secs);
    }
    let value = rest.find("value:")?;
    digits(rest[value + "value:".len()..].trim_start())
}

impl From<grammers_client::InvocationError> for Error {
    fn from(e: grammers_client::InvocationError) -> Error {
        let message = e.to_string();
        match flood_wait_seconds(&message) {
            Some(secs) => Error::FloodWait(secs),
            None => Error::Telegram(message),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Error {
        Error::Xml(e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Error {
        Error::Url(e)
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Error {
        Error::Regex(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
