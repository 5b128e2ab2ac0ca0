/*! Source collection

Every source type has a [Collector], turning a [SourceDescriptor] and a [TimeWindow] into canonical [Record]s.
Collectors only talk to the outside world through capability traits
([MessageStream], [DocumentSearch], [SocialSearch], [PageFetcher], [TextExtractor]),
and every outbound call goes through a [Backoff].

[Harvest] drives collectors over their configured sources, checkpointing each source as soon as it is done.
!*/
use std::{fmt, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{error::Error, types::Record};

pub mod document_search;
pub mod extract;
pub mod gdelt;
pub mod harvest;
pub mod message_stream;
pub mod mtproto;
pub mod retry;
pub mod sitemap;
pub mod social;
pub mod telegram;
pub mod twitter;

pub use document_search::{DocumentSearch, DocumentSearchCollector, SearchHit};
pub use extract::{HtmlExtractor, HttpFetcher, PageFetcher, TextExtractor};
pub use harvest::{Harvest, SourceOutcome};
pub use message_stream::{MessageStream, MessageStreamCollector, StreamMessage};
pub use retry::Backoff;
pub use sitemap::SitemapCollector;
pub use social::{SearchPage, SocialPost, SocialSearch, SocialSearchCollector};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    MessageStream,
    SocialSearch,
    Sitemap,
    DocumentSearch,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::MessageStream,
        SourceKind::SocialSearch,
        SourceKind::Sitemap,
        SourceKind::DocumentSearch,
    ];

    /// Directory/file name used for this kind.
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::MessageStream => "message_stream",
            SourceKind::SocialSearch => "social_search",
            SourceKind::Sitemap => "sitemap",
            SourceKind::DocumentSearch => "document_search",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single source to collect from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceDescriptor {
    pub kind: SourceKind,
    /// Channel handle, domain or search label.
    pub name: String,
    pub region: String,
    /// Search query, for search-based sources.
    #[serde(default)]
    pub query: Option<String>,
    /// Sitemap index url, for sitemap sources.
    #[serde(default)]
    pub sitemap_index: Option<String>,
    /// Overrides the default collection limit.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SourceDescriptor {
    pub fn new(kind: SourceKind, name: &str, region: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            region: region.to_string(),
            query: None,
            sitemap_index: None,
            limit: None,
        }
    }

    /// Name usable as a file stem (`rt.com` -> `rt_com`).
    pub fn file_stem(&self) -> String {
        self.name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    }
}

/// Collection window. An open end means "until now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: &DateTime<Utc>) -> bool {
        *date >= self.start && self.end.map_or(true, |end| *date < end)
    }
}

#[async_trait]
pub trait Collector: Send + Sync {
    /// Collect at most `limit` records of `source` within `window`.
    async fn collect(
        &self,
        source: &SourceDescriptor,
        window: &TimeWindow,
        limit: usize,
    ) -> Result<Vec<Record>, Error>;

    /// Pause between two sources, on top of any retry delay.
    fn pause_between_sources(&self) -> Option<Duration> {
        None
    }
}

/// Stable identifier for sources without native ids.
pub fn url_digest(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn file_stems() {
        let s = SourceDescriptor::new(SourceKind::Sitemap, "rt.com", "tier1_archived");
        assert_eq!(s.file_stem(), "rt_com");
        let s = SourceDescriptor::new(SourceKind::MessageStream, "rusembcy", "Cyprus");
        assert_eq!(s.file_stem(), "rusembcy");
    }

    #[test]
    fn windows() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let w = TimeWindow::new(start, Some(end));
        assert!(w.contains(&start));
        assert!(!w.contains(&end));
        assert!(TimeWindow::new(start, None).contains(&Utc::now()));
    }

    #[test]
    fn digests() {
        let d = url_digest("https://rt.com/news/1");
        assert_eq!(d.len(), 64);
        assert_eq!(d, url_digest("https://rt.com/news/1"));
        assert_ne!(d, url_digest("https://rt.com/news/2"));
    }

    #[test]
    fn descriptor_yaml() {
        let s: SourceDescriptor = serde_yaml::from_str(
            "kind: document_search\nname: rt.com\nregion: tier1_archived\nquery: Cyprus\n",
        )
        .unwrap();
        assert_eq!(s.kind, SourceKind::DocumentSearch);
        assert_eq!(s.query.as_deref(), Some("Cyprus"));
        assert!(s.limit.is_none());
    }
}
