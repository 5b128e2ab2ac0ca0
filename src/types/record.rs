//! Canonical record.
//!
//! Every collector, whatever the shape of the API it talks to, has to produce [Record]s.
//! Fields a source does not expose are defaulted (`0` for engagement counts, [None] for optional references).
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique within a source. Native id, or a url digest when there's none.
    pub message_id: String,
    pub date: DateTime<Utc>,
    pub channel: String,
    /// Analysis cohort, assigned by configuration.
    pub region: String,
    pub text: String,
    pub views: u64,
    /// Only available at retrieval time.
    pub forwards: u64,
    pub reactions: u64,
    pub reply_to_id: Option<String>,
    pub edit_date: Option<DateTime<Utc>>,
    /// Citation only, never a key.
    pub source_url: Option<String>,
}

impl Record {
    /// Create a new record with defaulted engagement/reference fields.
    ///
    /// Newlines in `text` are collapsed into single spaces.
    pub fn new(
        message_id: String,
        date: DateTime<Utc>,
        channel: String,
        region: String,
        text: &str,
    ) -> Self {
        Self {
            message_id,
            date,
            channel,
            region,
            text: collapse_newlines(text),
            views: 0,
            forwards: 0,
            reactions: 0,
            reply_to_id: None,
            edit_date: None,
            source_url: None,
        }
    }

    /// Key used when merging outputs of several sources.
    pub fn key(&self) -> (&str, &str) {
        (&self.channel, &self.message_id)
    }
}

/// Replace each line break by a single space.
pub fn collapse_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn newlines_collapsed() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let r = Record::new(
            "1".to_string(),
            date,
            "rusembcy".to_string(),
            "Cyprus".to_string(),
            "first line\nsecond line\r\nthird",
        );
        assert_eq!(r.text, "first line second line third");
        assert_eq!(r.views, 0);
        assert!(r.reply_to_id.is_none());
        assert_eq!(r.key(), ("rusembcy", "1"));
    }
}
