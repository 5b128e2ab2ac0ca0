//! Heuristic script detection.
//!
//! Counts letters of each counted script and keeps the most frequent one.
//! This is a diagnostic signal only: routing is done on the identified language.
use std::{fmt, str::FromStr};

use unicode_script::{Script, UnicodeScript};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptType {
    Cyrillic,
    Greek,
    Latin,
    Unknown,
}

impl ScriptType {
    /// Counted scripts, in tie-breaking order.
    const COUNTED: [ScriptType; 3] = [ScriptType::Cyrillic, ScriptType::Greek, ScriptType::Latin];

    fn as_str(&self) -> &'static str {
        match self {
            ScriptType::Cyrillic => "cyrillic",
            ScriptType::Greek => "greek",
            ScriptType::Latin => "latin",
            ScriptType::Unknown => "unknown",
        }
    }

    fn of(c: char) -> Option<ScriptType> {
        match c.script() {
            Script::Cyrillic => Some(ScriptType::Cyrillic),
            Script::Greek => Some(ScriptType::Greek),
            Script::Latin => Some(ScriptType::Latin),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScriptType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cyrillic" => Ok(ScriptType::Cyrillic),
            "greek" => Ok(ScriptType::Greek),
            "latin" => Ok(ScriptType::Latin),
            "unknown" | "" => Ok(ScriptType::Unknown),
            other => Err(Error::Custom(format!("unknown script type: {other}"))),
        }
    }
}

/// Returns the script with the highest character count.
///
/// Ties go to the first maximum in the Cyrillic, Greek, Latin order.
/// [ScriptType::Unknown] is only returned when no counted script is present.
pub fn classify_script(text: &str) -> ScriptType {
    let mut counts = [0usize; 3];
    for c in text.chars() {
        if let Some(script) = ScriptType::of(c) {
            // COUNTED and the match in `of` share the same order
            let idx = ScriptType::COUNTED
                .iter()
                .position(|s| *s == script)
                .unwrap_or_default();
            counts[idx] += 1;
        }
    }

    let mut best = ScriptType::Unknown;
    let mut best_count = 0;
    for (script, count) in ScriptType::COUNTED.iter().zip(counts) {
        if count > best_count {
            best = *script;
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_scripts() {
        assert_eq!(classify_script("Посольство России"), ScriptType::Cyrillic);
        assert_eq!(classify_script("Κυπριακή Δημοκρατία"), ScriptType::Greek);
        assert_eq!(classify_script("Republic of Cyprus"), ScriptType::Latin);
    }

    #[test]
    fn unknown_on_no_letters() {
        assert_eq!(classify_script(""), ScriptType::Unknown);
        assert_eq!(classify_script("123 !! 456 —"), ScriptType::Unknown);
    }

    #[test]
    fn majority_wins() {
        assert_eq!(classify_script("НАТО и EU"), ScriptType::Cyrillic);
        assert_eq!(classify_script("Putin сказал"), ScriptType::Cyrillic);
        assert_eq!(classify_script("Путин said yesterday"), ScriptType::Latin);
    }

    #[test]
    fn ties_go_to_first_counted() {
        assert_eq!(classify_script("ab аб"), ScriptType::Cyrillic);
        assert_eq!(classify_script("ab αβ"), ScriptType::Greek);
    }

    #[test]
    fn accented_latin_is_latin() {
        assert_eq!(classify_script("éàü"), ScriptType::Latin);
    }
}
