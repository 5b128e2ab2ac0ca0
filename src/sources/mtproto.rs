/*! Telegram MTProto backend

Reads channel histories through a signed-in user session, which exposes view, forward and reaction counts.
Signing in is done once, out of band: [Mtproto::connect] only opens an existing session file.

The application id is read from `TELEGRAM_API_ID`.
Flood control answers (`FLOOD_WAIT_<n>`) become [Error::FloodWait].
!*/
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grammers_client::{client::updates::UpdatesLike, types::peer::Peer, Client};
use grammers_mtsender::{SenderPool, SenderPoolHandle};
use grammers_session::storages::SqliteSession;
use grammers_tl_types as tl;
use log::{debug, info};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::Error;

use super::{MessageStream, StreamMessage};

pub const API_ID_VAR: &str = "TELEGRAM_API_ID";

pub struct Mtproto {
    client: Client,
    /// Resolved channels, by handle.
    peers: Mutex<HashMap<String, Peer>>,
    _handle: SenderPoolHandle,
    _updates: Mutex<mpsc::UnboundedReceiver<UpdatesLike>>,
    _runner: JoinHandle<()>,
}

impl Mtproto {
    /// Open the session stored at `session_file` and connect.
    ///
    /// Fails with [Error::Config] if the application id is missing or the session is not signed in.
    pub async fn connect(session_file: &Path) -> Result<Self, Error> {
        let api_id = std::env::var(API_ID_VAR)
            .map_err(|_| Error::Config(format!("{API_ID_VAR} is not set")))?
            .parse::<i32>()
            .map_err(|e| Error::Config(format!("{API_ID_VAR}: {e}")))?;

        let path = session_file
            .to_str()
            .ok_or_else(|| Error::Config(format!("invalid session path: {:?}", session_file)))?;
        if !session_file.exists() {
            return Err(Error::Config(format!("session file {path} not found")));
        }
        let session = SqliteSession::open(path)
            .map_err(|e| Error::Config(format!("cannot open session {path}: {e}")))?;

        let pool = SenderPool::new(Arc::new(session), api_id);
        let client = Client::new(&pool);
        let SenderPool {
            runner,
            updates,
            handle,
        } = pool;
        let runner = tokio::spawn(async move {
            runner.run().await;
        });

        if !client.is_authorized().await? {
            return Err(Error::Config(format!("session {path} is not signed in")));
        }
        info!("connected with session {path}");

        Ok(Self {
            client,
            peers: Mutex::new(HashMap::new()),
            _handle: handle,
            _updates: Mutex::new(updates),
            _runner: runner,
        })
    }

    fn cached(&self, channel: &str) -> Option<Peer> {
        self.peers.lock().ok()?.get(channel).cloned()
    }

    async fn peer(&self, channel: &str) -> Result<Peer, Error> {
        if let Some(peer) = self.cached(channel) {
            return Ok(peer);
        }
        let peer = self
            .client
            .resolve_username(channel)
            .await?
            .ok_or_else(|| Error::Custom(format!("channel @{channel} not found")))?;
        if let Ok(mut peers) = self.peers.lock() {
            peers.insert(channel.to_string(), peer.clone());
        }
        Ok(peer)
    }
}

#[async_trait]
impl MessageStream for Mtproto {
    async fn resolve(&self, channel: &str) -> Result<String, Error> {
        let channel = channel.trim_start_matches('@');
        self.peer(channel).await?;
        Ok(channel.to_string())
    }

    async fn history(
        &self,
        channel: &str,
        before: Option<i64>,
        limit: usize,
    ) -> Result<Vec<StreamMessage>, Error> {
        let peer = self.peer(channel).await?;
        let mut iter = self.client.iter_messages(&peer).limit(limit);
        if let Some(before) = before {
            let offset = i32::try_from(before)
                .map_err(|_| Error::Custom(format!("message id {before} out of range")))?;
            iter = iter.offset_id(offset);
        }

        let mut messages = Vec::with_capacity(limit);
        while let Some(message) = iter.next().await? {
            messages.extend(stream_message(&message.raw));
        }
        debug!("@{channel}: {} messages before {before:?}", messages.len());
        Ok(messages)
    }
}

fn timestamp(secs: i32) -> DateTime<Utc> {
    DateTime::from_timestamp(secs.into(), 0).unwrap_or_default()
}

fn count(n: i32) -> u64 {
    u64::try_from(n).unwrap_or_default()
}

/// Sum of every reaction count.
pub fn reaction_total(results: &[tl::enums::ReactionCount]) -> u64 {
    results
        .iter()
        .map(|r| match r {
            tl::enums::ReactionCount::Count(c) => count(c.count),
        })
        .sum()
}

fn reactions(reactions: Option<&tl::enums::MessageReactions>) -> u64 {
    match reactions {
        Some(tl::enums::MessageReactions::Reactions(r)) => reaction_total(&r.results),
        _ => 0,
    }
}

fn reply_to(header: Option<&tl::enums::MessageReplyHeader>) -> Option<i64> {
    match header {
        Some(tl::enums::MessageReplyHeader::Header(h)) => h.reply_to_msg_id.map(i64::from),
        _ => None,
    }
}

/// Map a raw message, service messages being kept without text.
fn stream_message(raw: &tl::enums::Message) -> Option<StreamMessage> {
    match raw {
        tl::enums::Message::Message(m) => Some(StreamMessage {
            id: m.id.into(),
            date: timestamp(m.date),
            text: Some(m.message.clone()),
            views: m.views.map(count),
            forwards: m.forwards.map(count),
            reactions: reactions(m.reactions.as_ref()),
            reply_to: reply_to(m.reply_to.as_ref()),
            edit_date: m.edit_date.map(timestamp),
        }),
        tl::enums::Message::Service(m) => Some(StreamMessage {
            id: m.id.into(),
            date: timestamp(m.date),
            text: None,
            views: None,
            forwards: None,
            reactions: 0,
            reply_to: None,
            edit_date: None,
        }),
        tl::enums::Message::Empty(_) => None,
    }
}
