/*! Keyword patterns

A keyword is either a plain lowercase substring or, when it contains a `\b` word boundary marker,
a case-insensitive regular expression. Text is lowercased before matching.

[Keywords] holds named categories of patterns, [Keywords::default] being the built-in topic list.
!*/
use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};

use crate::error::Error;

const BOUNDARY: &str = r"\b";

/// Built-in topic categories.
const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "WAR",
        &[
            "war", "invasion", "conflict", "military", "army", "frontline", "attack",
            "войн", "воен", "арми", "фронт", "наступлен", "атак", r"\bсво\b", "спецоперац",
            "πόλεμ", "εισβολ", "σύγκρουσ", "στρατ", "μέτωπ", "επίθεσ",
        ],
    ),
    (
        "KEY_ACT",
        &[
            "putin", "zelensky", "biden", "nato", "eu", "europe", "kremlin", "moscow", "kiev",
            "kyiv", "trump",
            "путин", "зеленск", "байден", "нато", r"\bес\b", "европ", "кремл", "москв", "киев",
            "росси", "укоаин", r"\bрф\b", "трамп",
            "πούτιν", "ζελένσκ", "μπάιντεν", "νατο", r"\bεε\b", "ευρώπ", "κρεμλίν", "μόσχ",
            "κίεβ", "ρωσί", "ουκραιν", "τραμπ",
        ],
    ),
    (
        "IDEAL_TER",
        &[
            "nazi", "fascist", "propaganda", "fake", "truth", "west", "imperial", "russophobia",
            "наци", "фашист", "пропаганд", "фейк", "правд", "запад", "импер", "русофоб",
            "освобожд",
            "ναζ", "φασίστ", "προπαγάνδ", "ψεύδ", "αλήθει", "δύσ", "ιμπεριαλ", "ρωσοφοβ",
        ],
    ),
    (
        "CY_DIV",
        &[
            "cyprus problem", "reunification", "occupied", "buffer zone",
            "κυπριακό", "επανένωσ", "κατεχόμεν", "πράσινη γραμμή",
            "кипрск", "разделени", "оккупир", "турецк",
        ],
    ),
    (
        "EU_SKEP",
        &[
            "brussels", "eu sanctions", "sovereignty",
            "βρυξέλλ", "κυριαρχί", "κυρώσεις", "ευρωπαϊκ",
            "брюссел", "суверенит", "санкц", "евросоюз",
        ],
    ),
    (
        "BAIL_IN",
        &[
            "bail.in", "haircut", "imf", "bank levy", "deposit",
            "κούρεμα", "κυπριακή τράπεζα", "ΔΝΤ", "καταθέσ",
            "стрижк", "кипрск банк", "мвф", "вклад",
        ],
    ),
    (
        "ORTHO",
        &[
            "orthodox", "church", "civilisation", "christian values",
            "ορθόδοξ", "εκκλησί", "χριστιανικ", "πολιτισμ",
            "православ", "церков", "цивилизац", "христианск",
        ],
    ),
    (
        "ELIT",
        &[
            "corrupt elite", "deep state", "establishment", "oligarch",
            "ελίτ", "διαφθορ", "κατεστημέν", "παρακράτ",
            "элит", "коррупц", "истеблишмент", "олигарх",
        ],
    ),
    (
        "MIGR",
        &[
            "migrant", "refugee", "illegal immigration", "border",
            "μετανάστ", "πρόσφυγ", "παράνομ", "σύνορ",
            "мигрант", "беженц", "нелегальн", "границ",
        ],
    ),
];

lazy_static! {
    static ref DEFAULT_KEYWORDS: Keywords = Keywords::new(
        DEFAULT_CATEGORIES
            .iter()
            .map(|(name, patterns)| (name.to_string(), patterns.iter().map(|p| p.to_string()).collect()))
    )
    .unwrap();
}

/// A single keyword.
#[derive(Debug, Clone)]
pub enum Pattern {
    Substring(String),
    Regex(Regex),
}

impl Pattern {
    /// Compile a keyword.
    ///
    /// # Errors
    /// Fails if a boundary-anchored keyword isn't a valid regular expression.
    pub fn new(keyword: &str) -> Result<Self, Error> {
        if keyword.contains(BOUNDARY) {
            let re = RegexBuilder::new(keyword).case_insensitive(true).build()?;
            Ok(Pattern::Regex(re))
        } else {
            Ok(Pattern::Substring(keyword.to_lowercase()))
        }
    }

    /// `text` has to be lowercased already.
    fn is_match_lowered(&self, text: &str) -> bool {
        match self {
            Pattern::Substring(s) => text.contains(s.as_str()),
            Pattern::Regex(re) => re.is_match(text),
        }
    }
}

/// An unnamed list of patterns, matching when any of them does.
#[derive(Debug, Clone, Default)]
pub struct PatternSet(Vec<Pattern>);

impl PatternSet {
    pub fn new<S: AsRef<str>>(keywords: impl IntoIterator<Item = S>) -> Result<Self, Error> {
        keywords
            .into_iter()
            .map(|kw| Pattern::new(kw.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(PatternSet)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.is_match_lowered(&text.to_lowercase())
    }

    fn is_match_lowered(&self, text: &str) -> bool {
        self.0.iter().any(|p| p.is_match_lowered(text))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Named keyword categories, kept in insertion order.
#[derive(Debug, Clone)]
pub struct Keywords {
    categories: Vec<(String, PatternSet)>,
}

impl Keywords {
    pub fn new(categories: impl IntoIterator<Item = (String, Vec<String>)>) -> Result<Self, Error> {
        let categories = categories
            .into_iter()
            .map(|(name, keywords)| Ok((name, PatternSet::new(keywords)?)))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self { categories })
    }

    /// Build categories from a configuration map.
    pub fn from_map(map: &BTreeMap<String, Vec<String>>) -> Result<Self, Error> {
        Self::new(map.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    /// True if any pattern of any category matches.
    pub fn is_match(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.categories
            .iter()
            .any(|(_, set)| set.is_match_lowered(&lowered))
    }

    pub fn get(&self, category: &str) -> Option<&PatternSet> {
        self.categories
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, set)| set)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatternSet)> {
        self.categories.iter().map(|(name, set)| (name.as_str(), set))
    }
}

impl Default for Keywords {
    fn default() -> Self {
        DEFAULT_KEYWORDS.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_is_case_insensitive() {
        let p = PatternSet::new(["NATO"]).unwrap();
        assert!(p.is_match("Statement on Nato enlargement"));
        // substring mode matches inside words
        assert!(p.is_match("natoist"));
    }

    #[test]
    fn boundary_is_regex() {
        let p = PatternSet::new([r"\bсво\b"]).unwrap();
        assert!(p.is_match("Итоги СВО за неделю"));
        assert!(!p.is_match("свобода слова"));
    }

    #[test]
    fn invalid_regex() {
        assert!(Pattern::new(r"\b(unclosed").is_err());
    }

    #[test]
    fn defaults() {
        let kw = Keywords::default();
        assert_eq!(
            kw.names().collect::<Vec<_>>(),
            vec![
                "WAR", "KEY_ACT", "IDEAL_TER", "CY_DIV", "EU_SKEP", "BAIL_IN", "ORTHO", "ELIT",
                "MIGR"
            ]
        );
        assert!(kw.is_match("Посол заявил о санкциях"));
        assert!(kw.is_match("Το ΔΝΤ και οι τράπεζες"));
        assert!(!kw.is_match("Прекрасная погода на пляже сегодня"));
        assert!(kw.get("BAIL_IN").is_some());
        assert!(kw.get("NOPE").is_none());
    }
}
