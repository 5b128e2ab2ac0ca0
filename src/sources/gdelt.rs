/*! GDELT DOC 2.0 backend

Article lists (`mode=artlist`) of a single domain, newest first.
The free endpoint caps results at 250 per query.
!*/
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;
use url::Url;

use crate::error::Error;

use super::{DocumentSearch, PageFetcher, SearchHit};

pub const DEFAULT_ENDPOINT: &str = "https://api.gdeltproject.org/api/v2/doc/doc";
const MAX_RECORDS: usize = 250;

#[derive(Debug, Deserialize)]
struct ArtList {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    seendate: Option<String>,
}

impl From<Article> for SearchHit {
    fn from(a: Article) -> Self {
        SearchHit {
            url: a.url,
            title: a.title,
            seen_date: a.seendate,
        }
    }
}

/// Parse an `artlist` JSON body.
///
/// An empty body means no results. Plain text throttling notices become [Error::RateLimited].
pub fn parse_articles(body: &str) -> Result<Vec<SearchHit>, Error> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Vec::new());
    }
    if !body.starts_with('{') {
        if body.to_lowercase().contains("limit requests") {
            return Err(Error::RateLimited("gdelt".to_string()));
        }
        return Err(Error::Custom(format!(
            "unexpected gdelt answer: {}",
            body.chars().take(120).collect::<String>()
        )));
    }
    let list: ArtList = serde_json::from_str(body)?;
    Ok(list.articles.into_iter().map(SearchHit::from).collect())
}

pub struct Gdelt<F: PageFetcher> {
    fetcher: F,
    endpoint: String,
}

impl<F: PageFetcher> Gdelt<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_endpoint(fetcher, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(fetcher: F, endpoint: &str) -> Self {
        Self {
            fetcher,
            endpoint: endpoint.to_string(),
        }
    }

    pub fn query_url(
        &self,
        query: &str,
        domain: &str,
        start: DateTime<Utc>,
        max_records: usize,
    ) -> Result<Url, Error> {
        let max_records = max_records.clamp(1, MAX_RECORDS).to_string();
        let url = Url::parse_with_params(
            &self.endpoint,
            &[
                ("query", format!("{query} domain:{domain}").as_str()),
                ("mode", "artlist"),
                ("maxrecords", max_records.as_str()),
                ("startdatetime", start.format("%Y%m%d%H%M%S").to_string().as_str()),
                ("format", "json"),
                ("sort", "DateDesc"),
            ],
        )?;
        Ok(url)
    }
}

#[async_trait]
impl<F: PageFetcher> DocumentSearch for Gdelt<F> {
    async fn search(
        &self,
        query: &str,
        domain: &str,
        start: DateTime<Utc>,
        max_records: usize,
    ) -> Result<Vec<SearchHit>, Error> {
        let url = self.query_url(query, domain, start, max_records)?;
        debug!("querying {url}");
        let body = self.fetcher.fetch(url.as_str()).await?;
        parse_articles(&body)
    }
}
