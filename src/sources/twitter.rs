/*! X/Twitter API v2 recent search

Authenticated with an app bearer token. Authors are expanded in the same request,
and pages are chained with `next_token`.
!*/
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::Error;

use super::{extract::check_status, SearchPage, SocialPost, SocialSearch, TimeWindow};

pub const DEFAULT_ENDPOINT: &str = "https://api.twitter.com/2/tweets/search/recent";
pub const TOKEN_VAR: &str = "TWITTER_BEARER_TOKEN";
const RATE_LIMIT_RESET: &str = "x-rate-limit-reset";

#[derive(Debug, Default, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    retweet_count: u64,
    #[serde(default)]
    like_count: u64,
    #[serde(default)]
    impression_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct Reference {
    #[serde(rename = "type")]
    kind: String,
    id: String,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    author_id: Option<String>,
    #[serde(default)]
    public_metrics: PublicMetrics,
    #[serde(default)]
    referenced_tweets: Vec<Reference>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
    username: String,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<User>,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    meta: Meta,
}

/// Parse a search response body, flattening authors from `includes.users`.
pub fn parse_page(body: &str) -> Result<SearchPage, Error> {
    let response: SearchResponse = serde_json::from_str(body)?;
    let users: HashMap<&str, &str> = response
        .includes
        .users
        .iter()
        .map(|u| (u.id.as_str(), u.username.as_str()))
        .collect();

    let posts = response
        .data
        .iter()
        .map(|tweet| SocialPost {
            id: tweet.id.clone(),
            created_at: tweet.created_at,
            author: tweet
                .author_id
                .as_deref()
                .and_then(|id| users.get(id))
                .map(|name| name.to_string()),
            text: tweet.text.clone(),
            views: tweet.public_metrics.impression_count,
            reposts: tweet.public_metrics.retweet_count,
            likes: tweet.public_metrics.like_count,
            reply_to: tweet
                .referenced_tweets
                .iter()
                .find(|r| r.kind == "replied_to")
                .map(|r| r.id.clone()),
        })
        .collect();

    Ok(SearchPage {
        posts,
        next: response.meta.next_token,
    })
}

fn api_time(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub struct RecentSearch {
    client: Client,
    token: String,
    endpoint: String,
}

impl RecentSearch {
    pub fn new(client: Client, token: &str) -> Self {
        Self {
            client,
            token: token.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Token read from the environment.
    pub fn from_env(client: Client) -> Result<Self, Error> {
        let token = std::env::var(TOKEN_VAR)
            .map_err(|_| Error::Config(format!("{TOKEN_VAR} is not set")))?;
        Ok(Self::new(client, &token))
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[async_trait]
impl SocialSearch for RecentSearch {
    async fn search(
        &self,
        query: &str,
        window: &TimeWindow,
        page_size: usize,
        next: Option<&str>,
    ) -> Result<SearchPage, Error> {
        let mut params = vec![
            ("query", query.to_string()),
            ("start_time", api_time(&window.start)),
            ("max_results", page_size.clamp(10, 100).to_string()),
            (
                "tweet.fields",
                "created_at,public_metrics,referenced_tweets,author_id".to_string(),
            ),
            ("expansions", "author_id".to_string()),
            ("user.fields", "username".to_string()),
        ];
        if let Some(end) = window.end {
            params.push(("end_time", api_time(&end)));
        }
        if let Some(token) = next {
            params.push(("next_token", token.to_string()));
        }

        debug!("searching {query:?} (next: {next:?})");
        let response = self
            .client
            .get(&self.endpoint)
            .bearer_auth(&self.token)
            .query(&params)
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let reset = response
                .headers()
                .get(RATE_LIMIT_RESET)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<i64>().ok());
            if let Some(reset) = reset {
                let wait = (reset - Utc::now().timestamp()).max(0);
                return Err(Error::FloodWait(wait as u64));
            }
        }

        let body = check_status(response)?.text().await?;
        parse_page(&body)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const BODY: &str = r##"{
      "data": [
        {"id": "1001", "text": "Christodoulides\nspeaks", "created_at": "2026-01-10T08:00:00.000Z",
         "author_id": "u1",
         "public_metrics": {"retweet_count": 4, "reply_count": 1, "like_count": 12, "quote_count": 0, "impression_count": 900},
         "referenced_tweets": [{"type": "quoted", "id": "900"}, {"type": "replied_to", "id": "901"}]},
        {"id": "1002", "text": "#Cyprus", "created_at": "2026-01-10T09:00:00.000Z", "author_id": "u2"}
      ],
      "includes": {"users": [{"id": "u1", "name": "Someone", "username": "someone"}]},
      "meta": {"newest_id": "1002", "oldest_id": "1001", "result_count": 2, "next_token": "b26v89"}
    }"##;

    #[test]
    fn page() {
        let page = parse_page(BODY).unwrap();
        assert_eq!(page.next.as_deref(), Some("b26v89"));
        assert_eq!(page.posts.len(), 2);

        let post = &page.posts[0];
        assert_eq!(post.author.as_deref(), Some("someone"));
        assert_eq!(post.reply_to.as_deref(), Some("901"));
        assert_eq!((post.reposts, post.likes, post.views), (4, 12, Some(900)));
        assert_eq!(post.created_at, Utc.with_ymd_and_hms(2026, 1, 10, 8, 0, 0).unwrap());

        let post = &page.posts[1];
        assert_eq!(post.author, None);
        assert_eq!(post.reply_to, None);
        assert_eq!((post.reposts, post.likes, post.views), (0, 0, None));
    }

    #[test]
    fn last_page() {
        let page = parse_page(r#"{"meta": {"result_count": 0}}"#).unwrap();
        assert!(page.posts.is_empty());
        assert!(page.next.is_none());
    }

    #[test]
    fn times() {
        let d = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(api_time(&d), "2026-01-01T00:00:00Z");
    }
}
