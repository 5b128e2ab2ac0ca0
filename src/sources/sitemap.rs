/*! Sitemap crawling

Walks a sitemap index down to article urls, pre-selects them on cheap url/title hints,
then fetches full texts and keeps the ones passing the inclusion filter.

Child sitemaps are selected on the year appearing in their url. Flat `<urlset>` roots are accepted too.
!*/
use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::{debug, info, warn};
use quick_xml::{events::Event, Reader};

use crate::{
    error::Error,
    filtering::{Filter, Inclusion},
    types::Record,
};

use super::{url_digest, Backoff, Collector, PageFetcher, SourceDescriptor, TextExtractor, TimeWindow};

/// Ascii, lowercase hints looked for in article urls and titles.
pub const DEFAULT_HINTS: [&str; 7] = [
    "cyprus",
    "nicosia",
    "famagusta",
    "christodoulides",
    "limassol",
    "larnaca",
    "paphos",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sitemap {
    /// Child sitemap urls.
    Index(Vec<String>),
    UrlSet(Vec<SitemapEntry>),
}

/// Parse a sitemap index or urlset, namespaces being ignored.
pub fn parse_sitemap(xml: &str) -> Result<Sitemap, Error> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut root: Option<String> = None;
    let mut path: Vec<String> = Vec::new();
    let mut children = Vec::new();
    let mut entries = Vec::new();
    let mut entry = SitemapEntry::default();

    loop {
        let text = match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if root.is_none() {
                    root = Some(name.clone());
                }
                path.push(name);
                continue;
            }
            Event::End(_) => {
                if path.pop().as_deref() == Some("url") {
                    let done = std::mem::take(&mut entry);
                    if !done.loc.is_empty() {
                        entries.push(done);
                    }
                }
                continue;
            }
            Event::Text(t) => t.unescape()?.into_owned(),
            Event::CData(c) => String::from_utf8_lossy(&c.into_inner()).into_owned(),
            Event::Eof => break,
            _ => continue,
        };

        let n = path.len();
        let (parent, current) = match n {
            0 | 1 => continue,
            _ => (path[n - 2].as_str(), path[n - 1].as_str()),
        };
        match (parent, current) {
            ("sitemap", "loc") => children.push(text.trim().to_string()),
            ("url", "loc") => entry.loc = text.trim().to_string(),
            ("url", "lastmod") => entry.lastmod = Some(text.trim().to_string()),
            ("news", "title") => entry.title = Some(text.trim().to_string()),
            _ => {}
        }
    }

    match root.as_deref() {
        Some("sitemapindex") => Ok(Sitemap::Index(children)),
        Some("urlset") => Ok(Sitemap::UrlSet(entries)),
        other => Err(Error::Custom(format!("not a sitemap (root: {other:?})"))),
    }
}

/// `lastmod` is either a full W3C datetime or a plain date.
pub fn parse_lastmod(lastmod: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(lastmod)
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(lastmod, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc())
        })
}

pub struct SitemapCollector<F: PageFetcher, X: TextExtractor> {
    fetcher: F,
    extractor: X,
    backoff: Backoff,
    inclusion: Inclusion,
    hints: Vec<String>,
    max_articles: usize,
}

impl<F: PageFetcher, X: TextExtractor> SitemapCollector<F, X> {
    /// Collector with [DEFAULT_HINTS] and at most 500 fetched articles per source.
    pub fn new(fetcher: F, extractor: X, backoff: Backoff, inclusion: Inclusion) -> Self {
        Self {
            fetcher,
            extractor,
            backoff,
            inclusion,
            hints: DEFAULT_HINTS.iter().map(|h| h.to_string()).collect(),
            max_articles: 500,
        }
    }

    pub fn with_hints(mut self, hints: Vec<String>) -> Self {
        self.hints = hints.into_iter().map(|h| h.to_lowercase()).collect();
        self
    }

    pub fn with_max_articles(mut self, max_articles: usize) -> Self {
        self.max_articles = max_articles;
        self
    }

    fn is_hinted(&self, entry: &SitemapEntry) -> bool {
        let combined = format!("{} {}", entry.loc, entry.title.as_deref().unwrap_or_default()).to_lowercase();
        self.hints.iter().any(|hint| combined.contains(hint.as_str()))
    }

    async fn sitemap(&self, label: &str, url: &str) -> Result<Sitemap, Error> {
        let body = self.backoff.run(label, || self.fetcher.fetch(url)).await?;
        parse_sitemap(&body)
    }

    /// Every article entry reachable from `index`.
    async fn entries(&self, label: &str, index: &str, window: &TimeWindow) -> Result<Vec<SitemapEntry>, Error> {
        let children = match self.sitemap(label, index).await? {
            Sitemap::UrlSet(entries) => return Ok(entries),
            Sitemap::Index(children) => children,
        };

        let years: Vec<String> = (window.start.year()..=Utc::now().year())
            .map(|y| y.to_string())
            .collect();
        let children: Vec<String> = children
            .into_iter()
            .filter(|url| years.iter().any(|y| url.contains(y.as_str())))
            .collect();
        info!("{label}: {} child sitemaps in window", children.len());

        let mut entries = Vec::new();
        for child in children {
            match self.sitemap(label, &child).await {
                Ok(Sitemap::UrlSet(found)) => entries.extend(found),
                Ok(Sitemap::Index(_)) => debug!("{label}: ignoring nested index {child}"),
                Err(e) => warn!("{label}: skipping sitemap {child}: {e}"),
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl<F: PageFetcher, X: TextExtractor> Collector for SitemapCollector<F, X> {
    async fn collect(
        &self,
        source: &SourceDescriptor,
        window: &TimeWindow,
        limit: usize,
    ) -> Result<Vec<Record>, Error> {
        let label = format!("sitemap/{}", source.name);
        let index = source
            .sitemap_index
            .as_deref()
            .ok_or_else(|| Error::Config(format!("{label}: no sitemap index")))?;

        let entries = self.entries(&label, index, window).await?;
        info!("{label}: {} urls discovered", entries.len());

        let candidates: Vec<(SitemapEntry, Option<DateTime<Utc>>)> = entries
            .into_iter()
            .filter(|e| self.is_hinted(e))
            .map(|e| {
                let date = e.lastmod.as_deref().and_then(parse_lastmod);
                (e, date)
            })
            .filter(|(_, date)| date.map_or(true, |d| window.contains(&d)))
            .collect();
        info!("{label}: {} urls after hint pre-filter", candidates.len());

        let mut records = Vec::new();
        let mut undated = 0;
        let mut textless = 0;
        let mut irrelevant = 0;
        for (entry, date) in candidates.into_iter().take(self.max_articles) {
            if records.len() >= limit {
                break;
            }
            let text = match self
                .backoff
                .run(&label, || self.extractor.extract(&entry.loc))
                .await
            {
                Ok(text) => text.filter(|t| !t.trim().is_empty()),
                Err(e) => {
                    warn!("{label}: fetch failed for {}: {e}", entry.loc);
                    continue;
                }
            };
            let Some(text) = text.or_else(|| entry.title.clone()) else {
                textless += 1;
                continue;
            };
            if !self.inclusion.detect(text.as_str()) {
                debug!("{label}: not relevant: {}", entry.loc);
                irrelevant += 1;
                continue;
            }

            let date = date.unwrap_or_else(|| {
                undated += 1;
                window.start
            });
            let mut record = Record::new(
                url_digest(&entry.loc),
                date,
                source.name.clone(),
                source.region.clone(),
                &text,
            );
            record.source_url = Some(entry.loc);
            records.push(record);
        }

        if undated > 0 {
            warn!("{label}: {undated} articles without a valid lastmod, using window start");
        }
        if textless > 0 {
            warn!("{label}: dropped {textless} articles without text or title");
        }
        info!("{label}: {irrelevant} articles not relevant");
        info!("{label}: {} articles kept", records.len());
        Ok(records)
    }
}
