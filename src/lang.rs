//! Corpus languages.
//!
//! The corpus targets Russian, Greek and English content. Anything the identifier
//! can't confidently place in one of those is labelled [Lang::Unknown].
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Lang {
    Ru,
    El,
    En,
    Unknown,
}

impl Lang {
    /// Languages a document can be routed to.
    pub const TARGETS: [Lang; 3] = [Lang::Ru, Lang::El, Lang::En];

    pub fn code(&self) -> &'static str {
        match self {
            Lang::Ru => "ru",
            Lang::El => "el",
            Lang::En => "en",
            Lang::Unknown => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Lang::Unknown)
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lang {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ru" | "rus" | "russian" => Ok(Lang::Ru),
            "el" | "ell" | "greek" => Ok(Lang::El),
            "en" | "eng" | "english" => Ok(Lang::En),
            "unknown" | "" => Ok(Lang::Unknown),
            other => Err(Error::UnknownLang(other.to_string())),
        }
    }
}

impl TryFrom<String> for Lang {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Lang::from_str(&value)
    }
}

impl From<Lang> for String {
    fn from(l: Lang) -> Self {
        l.code().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_codes() {
        assert_eq!(Lang::from_str("ru").unwrap(), Lang::Ru);
        assert_eq!(Lang::from_str("Greek").unwrap(), Lang::El);
        assert_eq!(Lang::from_str("").unwrap(), Lang::Unknown);
        assert!(Lang::from_str("fr").is_err());
    }

    #[test]
    fn display_roundtrips() {
        for l in Lang::TARGETS {
            assert_eq!(Lang::from_str(&l.to_string()).unwrap(), l);
        }
    }
}
