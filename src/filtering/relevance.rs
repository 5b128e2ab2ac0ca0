/*! Relevance filtering

Four ordered stages over `text_cleaned`:

1. [Length]: drops texts at or below a minimum number of characters,
2. [Exclusion]: drops spam/ads,
3. [Inclusion]: keeps texts matching at least one topic category,
4. [Dedup]: keeps the first occurrence of each text.

Each stage logs the number of surviving documents.
!*/
use log::info;

use crate::{error::Error, types::Document};

use super::{
    keywords::{Keywords, PatternSet},
    Filter, FilterMut,
};

/// Length filter.
/// Returns `false` if provided text is at most [Length::min_size] unicode codepoints.
///
/// [Length::min_size] is 20 by default.
pub struct Length {
    min_size: usize,
}

impl Length {
    /// specify a minimum length
    pub fn with_min_size(min_size: usize) -> Self {
        Self { min_size }
    }

    /// Get a reference to the length's min size.
    pub fn min_size(&self) -> &usize {
        &self.min_size
    }
}

impl Filter<&str> for Length {
    fn detect(&self, text: &str) -> bool {
        text.chars().count() > self.min_size
    }
}

impl Default for Length {
    fn default() -> Self {
        Length { min_size: 20 }
    }
}

/// Detects texts that do *not* contain any exclusion keyword.
#[derive(Default)]
pub struct Exclusion {
    keywords: PatternSet,
}

impl Exclusion {
    pub fn new(keywords: PatternSet) -> Self {
        Self { keywords }
    }
}

impl Filter<&str> for Exclusion {
    fn detect(&self, text: &str) -> bool {
        !self.keywords.is_match(text)
    }
}

/// Detects texts matching at least one category.
#[derive(Default)]
pub struct Inclusion {
    keywords: Keywords,
}

impl Inclusion {
    pub fn new(keywords: Keywords) -> Self {
        Self { keywords }
    }
}

impl Filter<&str> for Inclusion {
    fn detect(&self, text: &str) -> bool {
        self.keywords.is_match(text)
    }
}

/// Exact duplicate detection.
///
/// Detects the first occurrence of a given text, rejecting subsequent ones.
pub struct Dedup {
    seen: runiq::filters::DigestFilter,
}

impl Default for Dedup {
    fn default() -> Self {
        Self {
            seen: runiq::filters::DigestFilter::default(),
        }
    }
}

impl FilterMut<&str> for Dedup {
    fn detect_mut(&mut self, text: &str) -> bool {
        use runiq::filters::Filter;
        self.seen.detect(text.as_bytes())
    }
}

/// Number of documents surviving each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub input: usize,
    pub length: usize,
    pub exclusion: usize,
    pub inclusion: usize,
    pub dedup: usize,
}

impl StageCounts {
    /// Counts in stage order, starting with the input size.
    pub fn as_array(&self) -> [usize; 5] {
        [
            self.input,
            self.length,
            self.exclusion,
            self.inclusion,
            self.dedup,
        ]
    }
}

/// The full relevance filter.
#[derive(Default)]
pub struct RelevanceFilter {
    length: Length,
    exclusion: Exclusion,
    inclusion: Inclusion,
}

impl RelevanceFilter {
    pub fn new(length: Length, exclusion: Exclusion, inclusion: Inclusion) -> Self {
        Self {
            length,
            exclusion,
            inclusion,
        }
    }

    /// Run the four stages on `docs`.
    ///
    /// # Errors
    /// Fails with [Error::MissingColumn] if a document has not been normalized.
    pub fn apply(&self, docs: Vec<Document>) -> Result<(Vec<Document>, StageCounts), Error> {
        if docs.iter().any(|d| d.metadata().text_cleaned().is_none()) {
            return Err(Error::MissingColumn("text_cleaned".to_string()));
        }
        let text = |d: &Document| d.metadata().text_cleaned().unwrap_or_default().to_string();

        let mut counts = StageCounts {
            input: docs.len(),
            ..Default::default()
        };

        let docs: Vec<Document> = docs
            .into_iter()
            .filter(|d| self.length.detect(&text(d)))
            .collect();
        counts.length = docs.len();
        info!("Step 1 (length): {} rows remain", counts.length);

        let docs: Vec<Document> = docs
            .into_iter()
            .filter(|d| self.exclusion.detect(&text(d)))
            .collect();
        counts.exclusion = docs.len();
        info!("Step 2 (exclusion): {} rows remain", counts.exclusion);

        let docs: Vec<Document> = docs
            .into_iter()
            .filter(|d| self.inclusion.detect(&text(d)))
            .collect();
        counts.inclusion = docs.len();
        info!("Step 3 (inclusion): {} rows remain", counts.inclusion);

        let mut dedup = Dedup::default();
        let docs: Vec<Document> = docs
            .into_iter()
            .filter(|d| dedup.detect_mut(&text(d)))
            .collect();
        counts.dedup = docs.len();
        info!("Step 4 (dedup): {} unique rows remain", counts.dedup);

        Ok((docs, counts))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::types::Record;

    use super::*;

    fn doc(id: &str, text: &str) -> Document {
        let mut d = Document::from(Record::new(
            id.to_string(),
            Utc::now(),
            "rusembcy".to_string(),
            "Cyprus".to_string(),
            text,
        ));
        d.metadata_mut().set_text_cleaned(text.to_string());
        d
    }

    #[test]
    fn length_is_strict() {
        let f = Length::default();
        assert!(!f.detect("a".repeat(20).as_str()));
        assert!(f.detect("a".repeat(21).as_str()));
        // codepoints, not bytes
        assert!(!f.detect("я".repeat(20).as_str()));
    }

    #[test]
    fn exclusion() {
        let f = Exclusion::new(PatternSet::new(["usdt", r"\bлс\b"]).unwrap());
        assert!(!f.detect("Buy USDT now at a great rate"));
        assert!(!f.detect("пишите в лс"));
        assert!(f.detect("слава"));
        assert!(Exclusion::default().detect("anything goes"));
    }

    #[test]
    fn dedup_keeps_first() {
        let f = RelevanceFilter::default();
        let text = "NATO expansion threatens the region, says embassy";
        let docs = vec![doc("1", text), doc("2", text), doc("3", text)];
        let (kept, counts) = f.apply(docs).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].record().message_id, "1");
        assert_eq!(counts.inclusion, 3);
        assert_eq!(counts.dedup, 1);
    }

    #[test]
    fn counts_are_monotonic() {
        let f = RelevanceFilter::new(
            Length::default(),
            Exclusion::new(PatternSet::new(["apartment"]).unwrap()),
            Inclusion::default(),
        );
        let docs = vec![
            doc("1", "short"),
            doc("2", "Lovely apartment for rent near the border"),
            doc("3", "The weather in Limassol is lovely this week"),
            doc("4", "Заявление посольства о ситуации на Украине и санкциях"),
            doc("5", "Заявление посольства о ситуации на Украине и санкциях"),
            doc("6", "Ο πόλεμος στην Ουκρανία συνεχίζεται"),
        ];
        let (kept, counts) = f.apply(docs).unwrap();
        let counts = counts.as_array();
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(counts, [6, 5, 4, 3, 2]);
        let ids: Vec<_> = kept.iter().map(|d| d.record().message_id.as_str()).collect();
        assert_eq!(ids, vec!["4", "6"]);
    }

    #[test]
    fn requires_cleaned_text() {
        let f = RelevanceFilter::default();
        let raw = Document::from(Record::new(
            "1".to_string(),
            Utc::now(),
            "c".to_string(),
            "r".to_string(),
            "text",
        ));
        assert!(matches!(
            f.apply(vec![raw]),
            Err(Error::MissingColumn(_))
        ));
    }
}
