/*! Message stream collection

Pages backward through a channel history, newest first, until the window start is reached.
Engagement counts are only available at fetch time, and are captured then.
!*/
use std::{ops::RangeInclusive, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use rand::Rng;

use crate::{error::Error, types::Record};

use super::{Backoff, Collector, SourceDescriptor, TimeWindow};

/// A message as exposed by a [MessageStream].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub text: Option<String>,
    pub views: Option<u64>,
    pub forwards: Option<u64>,
    /// Sum of every reaction count.
    pub reactions: u64,
    pub reply_to: Option<i64>,
    pub edit_date: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait MessageStream: Send + Sync {
    /// Resolve a channel name into the handle used by [MessageStream::history].
    async fn resolve(&self, channel: &str) -> Result<String, Error>;

    /// At most `limit` messages older than `before` (newest first), or the latest ones if `before` is [None].
    async fn history(
        &self,
        channel: &str,
        before: Option<i64>,
        limit: usize,
    ) -> Result<Vec<StreamMessage>, Error>;
}

pub struct MessageStreamCollector<S: MessageStream> {
    stream: S,
    backoff: Backoff,
    page_size: usize,
    /// Inter-channel pause bounds, in seconds.
    pause: RangeInclusive<u64>,
}

impl<S: MessageStream> MessageStreamCollector<S> {
    /// Collector with 100 messages pages and a 10 to 25s pause between channels.
    pub fn new(stream: S, backoff: Backoff) -> Self {
        Self {
            stream,
            backoff,
            page_size: 100,
            pause: 10..=25,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_pause(mut self, pause: RangeInclusive<u64>) -> Self {
        self.pause = pause;
        self
    }

    fn to_record(message: StreamMessage, source: &SourceDescriptor) -> Option<Record> {
        let text = message.text.filter(|t| !t.trim().is_empty())?;
        let mut record = Record::new(
            message.id.to_string(),
            message.date,
            source.name.clone(),
            source.region.clone(),
            &text,
        );
        record.views = message.views.unwrap_or_default();
        record.forwards = message.forwards.unwrap_or_default();
        record.reactions = message.reactions;
        record.reply_to_id = message.reply_to.map(|id| id.to_string());
        record.edit_date = message.edit_date;
        Some(record)
    }
}

#[async_trait]
impl<S: MessageStream> Collector for MessageStreamCollector<S> {
    /// `limit` bounds the number of examined messages, textless ones included.
    async fn collect(
        &self,
        source: &SourceDescriptor,
        window: &TimeWindow,
        limit: usize,
    ) -> Result<Vec<Record>, Error> {
        let label = format!("message_stream/{}", source.name);
        let channel = self
            .backoff
            .run(&label, || self.stream.resolve(&source.name))
            .await?;

        let mut records = Vec::new();
        let mut examined = 0;
        let mut before: Option<i64> = None;

        'pages: loop {
            let page_size = self.page_size.min(limit - examined);
            if page_size == 0 {
                break;
            }
            let page = self
                .backoff
                .run(&label, || self.stream.history(&channel, before, page_size))
                .await?;
            let Some(oldest) = page.last().map(|m| m.id) else {
                break;
            };
            debug!("{label}: got {} messages before {before:?}", page.len());

            for message in page {
                if message.date < window.start {
                    break 'pages;
                }
                examined += 1;
                if window.contains(&message.date) {
                    records.extend(Self::to_record(message, source));
                }
                if examined >= limit {
                    break 'pages;
                }
            }

            // guard against backends ignoring `before`
            if before.map_or(false, |b| oldest >= b) {
                break;
            }
            before = Some(oldest);
        }

        info!("{label}: {} messages kept out of {examined}", records.len());
        Ok(records)
    }

    fn pause_between_sources(&self) -> Option<Duration> {
        if self.pause.is_empty() {
            return None;
        }
        let secs = rand::thread_rng().gen_range(self.pause.clone());
        Some(Duration::from_secs(secs))
    }
}
