/*! Document-search collection

One search per domain, each hit being turned into a record with the full article text.
Text comes from the live page, then from its web archive snapshot, then from the hit title.
!*/
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info, warn};

use crate::{error::Error, types::Record};

use super::{url_digest, Backoff, Collector, SourceDescriptor, TextExtractor, TimeWindow};

pub const ARCHIVE_PREFIX: &str = "https://web.archive.org/web/";

/// Broad default query, restricted to ASCII terms.
pub const DEFAULT_QUERY: &str = r#""Cyprus" OR "Christodoulides" OR "rusembcy" OR "ELAM""#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    /// Raw seen date, as given by the backend.
    pub seen_date: Option<String>,
}

#[async_trait]
pub trait DocumentSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        domain: &str,
        start: DateTime<Utc>,
        max_records: usize,
    ) -> Result<Vec<SearchHit>, Error>;
}

/// Drops the `OR`-separated terms holding non ASCII characters.
pub fn ascii_query(query: &str) -> String {
    let (kept, dropped): (Vec<&str>, Vec<&str>) = query
        .split(" OR ")
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .partition(|term| term.is_ascii());
    if !dropped.is_empty() {
        warn!("dropping non ascii search terms: {}", dropped.join(", "));
    }
    kept.join(" OR ")
}

/// Parses seen dates, either compact (`20240301T101500Z`) or RFC 3339.
pub fn parse_seen_date(date: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(date, "%Y%m%dT%H%M%SZ")
        .map(|d| d.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(date).map(|d| d.with_timezone(&Utc)))
        .ok()
}

pub struct DocumentSearchCollector<D: DocumentSearch, X: TextExtractor> {
    search: D,
    extractor: X,
    backoff: Backoff,
    max_records: usize,
    default_query: String,
}

impl<D: DocumentSearch, X: TextExtractor> DocumentSearchCollector<D, X> {
    /// Collector with 250 records per domain and [DEFAULT_QUERY].
    pub fn new(search: D, extractor: X, backoff: Backoff) -> Self {
        Self {
            search,
            extractor,
            backoff,
            max_records: 250,
            default_query: DEFAULT_QUERY.to_string(),
        }
    }

    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    pub fn with_default_query(mut self, query: &str) -> Self {
        self.default_query = query.to_string();
        self
    }

    async fn try_extract(&self, label: &str, url: &str) -> Option<String> {
        match self.backoff.run(label, || self.extractor.extract(url)).await {
            Ok(text) => text.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                debug!("{label}: extraction failed for {url}: {e}");
                None
            }
        }
    }

    /// Live page, then archive snapshot, then title.
    async fn full_text(&self, label: &str, hit: &SearchHit) -> String {
        if let Some(text) = self.try_extract(label, &hit.url).await {
            return text;
        }
        let archived = format!("{ARCHIVE_PREFIX}{}", hit.url);
        if let Some(text) = self.try_extract(label, &archived).await {
            return text;
        }
        hit.title.clone()
    }
}

#[async_trait]
impl<D: DocumentSearch, X: TextExtractor> Collector for DocumentSearchCollector<D, X> {
    async fn collect(
        &self,
        source: &SourceDescriptor,
        window: &TimeWindow,
        limit: usize,
    ) -> Result<Vec<Record>, Error> {
        let label = format!("document_search/{}", source.name);
        let query = ascii_query(source.query.as_deref().unwrap_or(&self.default_query));
        if query.is_empty() {
            return Err(Error::Config(format!("{label}: empty search query")));
        }

        let max_records = self.max_records.min(limit);
        let hits = self
            .backoff
            .run(&label, || {
                self.search
                    .search(&query, &source.name, window.start, max_records)
            })
            .await?;
        info!("{label}: {} hits", hits.len());

        let mut records = Vec::with_capacity(hits.len());
        let mut undated = 0;
        let mut late = 0;
        let mut textless = 0;
        for hit in hits.into_iter().filter(|h| !h.url.is_empty()).take(limit) {
            let date = match hit.seen_date.as_deref().and_then(parse_seen_date) {
                Some(date) => date,
                None => {
                    undated += 1;
                    window.start
                }
            };
            if window.end.map_or(false, |end| date >= end) {
                late += 1;
                continue;
            }
            let text = self.full_text(&label, &hit).await;
            if text.trim().is_empty() {
                debug!("{label}: no text for {}", hit.url);
                textless += 1;
                continue;
            }

            let mut record = Record::new(
                url_digest(&hit.url),
                date,
                source.name.clone(),
                source.region.clone(),
                &text,
            );
            record.source_url = Some(hit.url);
            records.push(record);
        }

        if undated > 0 {
            warn!("{label}: {undated} hits without a valid date, using window start");
        }
        if late + textless > 0 {
            warn!("{label}: dropped {late} hits after the window end and {textless} without text or title");
        }
        info!("{label}: {} documents kept", records.len());
        Ok(records)
    }
}
