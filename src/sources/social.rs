/*! Social-network keyword search

Paginated search over the collection window. Author and public metrics are flattened into the record:
reposts become forwards, likes become reactions.
!*/
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::{error::Error, types::Record};

use super::{Backoff, Collector, SourceDescriptor, TimeWindow};

pub const DEFAULT_QUERY: &str =
    "(Christodoulides OR #Cyprus OR Κυριάκος) lang:en OR lang:ru OR lang:el -is:retweet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialPost {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Author handle, when the backend expands it.
    pub author: Option<String>,
    pub text: String,
    pub views: Option<u64>,
    pub reposts: u64,
    pub likes: u64,
    /// Id of the `replied_to` reference, if any.
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub posts: Vec<SocialPost>,
    /// Pagination token of the next page.
    pub next: Option<String>,
}

#[async_trait]
pub trait SocialSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        window: &TimeWindow,
        page_size: usize,
        next: Option<&str>,
    ) -> Result<SearchPage, Error>;
}

pub struct SocialSearchCollector<S: SocialSearch> {
    search: S,
    backoff: Backoff,
    page_size: usize,
    default_query: String,
}

impl<S: SocialSearch> SocialSearchCollector<S> {
    /// Collector with 100 posts pages and [DEFAULT_QUERY].
    pub fn new(search: S, backoff: Backoff) -> Self {
        Self {
            search,
            backoff,
            page_size: 100,
            default_query: DEFAULT_QUERY.to_string(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_default_query(mut self, query: &str) -> Self {
        self.default_query = query.to_string();
        self
    }

    fn to_record(post: SocialPost, source: &SourceDescriptor) -> Record {
        let channel = post.author.unwrap_or_else(|| source.name.clone());
        let mut record = Record::new(
            post.id,
            post.created_at,
            channel,
            source.region.clone(),
            &post.text,
        );
        record.views = post.views.unwrap_or_default();
        record.forwards = post.reposts;
        record.reactions = post.likes;
        record.reply_to_id = post.reply_to;
        record
    }
}

#[async_trait]
impl<S: SocialSearch> Collector for SocialSearchCollector<S> {
    async fn collect(
        &self,
        source: &SourceDescriptor,
        window: &TimeWindow,
        limit: usize,
    ) -> Result<Vec<Record>, Error> {
        let label = format!("social_search/{}", source.name);
        let query = source.query.as_deref().unwrap_or(&self.default_query);

        let mut records = Vec::new();
        let mut empty = 0;
        let mut outside = 0;
        let mut next: Option<String> = None;
        loop {
            let page = self
                .backoff
                .run(&label, || {
                    self.search
                        .search(query, window, self.page_size, next.as_deref())
                })
                .await?;
            debug!("{label}: got {} posts", page.posts.len());

            for post in page.posts {
                if records.len() >= limit {
                    break;
                }
                if post.text.trim().is_empty() {
                    empty += 1;
                    continue;
                }
                if !window.contains(&post.created_at) {
                    outside += 1;
                    continue;
                }
                records.push(Self::to_record(post, source));
            }

            match page.next {
                Some(token) if records.len() < limit => next = Some(token),
                _ => break,
            }
        }

        if empty + outside > 0 {
            warn!("{label}: dropped {empty} posts without text and {outside} outside the window");
        }
        info!("{label}: {} posts collected", records.len());
        Ok(records)
    }
}
