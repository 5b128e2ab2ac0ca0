/*! Page fetching and full-text extraction

[PageFetcher] fetches a page body, [TextExtractor] turns a url into the main text of the page.
Extraction works the same on live and on web archive urls.
!*/
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{header::RETRY_AFTER, Client, StatusCode};
use scraper::{Html, Selector};

use crate::error::Error;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; kypros corpus builder)";

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Get the body of `url`.
    async fn fetch(&self, url: &str) -> Result<String, Error>;
}

/// [PageFetcher] over HTTP.
///
/// Non-success statuses are errors. `429 Too Many Requests` with a `Retry-After` header
/// becomes an [Error::FloodWait].
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Turns an unsuccessful response into an error.
pub(crate) fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        if let Some(secs) = retry_after {
            return Err(Error::FloodWait(secs));
        }
    }
    Err(Error::HttpStatus(status.as_u16(), url))
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, Error> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        Ok(check_status(response)?.text().await?)
    }
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Main text of the page at `url`, [None] if there's none.
    async fn extract(&self, url: &str) -> Result<Option<String>, Error>;
}

/// Paragraph-based extraction: paragraphs under `article`/`main` when there are some, every paragraph otherwise.
pub struct HtmlExtractor<F: PageFetcher> {
    fetcher: F,
}

impl<F: PageFetcher> HtmlExtractor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl<F: PageFetcher> TextExtractor for HtmlExtractor<F> {
    async fn extract(&self, url: &str) -> Result<Option<String>, Error> {
        let html = self.fetcher.fetch(url).await?;
        Ok(extract_main_text(&html))
    }
}

fn paragraphs(doc: &Html, selector: &str) -> Vec<String> {
    let Ok(sel) = Selector::parse(selector) else {
        return Vec::new();
    };
    doc.select(&sel)
        .map(|p| {
            p.text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|p| !p.is_empty())
        .collect()
}

/// Extract the main text of an html page, one paragraph per line.
pub fn extract_main_text(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let mut found = paragraphs(&doc, "article p, main p");
    if found.is_empty() {
        found = paragraphs(&doc, "p");
    }
    (!found.is_empty()).then(|| found.join("\n"))
}
