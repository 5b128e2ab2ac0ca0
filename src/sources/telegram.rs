/*! Telegram public channel preview

Reads `https://t.me/s/<channel>`, the public web preview of a channel, which needs no account.
Pages hold about 20 messages in chronological order, older ones being reached with `?before=<id>`.
Forward counts are not exposed by the preview: it stands in for [super::mtproto::Mtproto] when no signed-in session is available.
!*/
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::warn;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::Error;

use super::{MessageStream, PageFetcher, StreamMessage};

pub const DEFAULT_BASE: &str = "https://t.me/s/";

pub struct WebPreview<F: PageFetcher> {
    fetcher: F,
    base: String,
}

impl<F: PageFetcher> WebPreview<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_base(fetcher, DEFAULT_BASE)
    }

    pub fn with_base(fetcher: F, base: &str) -> Self {
        Self {
            fetcher,
            base: base.to_string(),
        }
    }

    fn page_url(&self, channel: &str, before: Option<i64>) -> String {
        match before {
            Some(id) => format!("{}{channel}?before={id}", self.base),
            None => format!("{}{channel}", self.base),
        }
    }
}

#[async_trait]
impl<F: PageFetcher> MessageStream for WebPreview<F> {
    async fn resolve(&self, channel: &str) -> Result<String, Error> {
        let channel = channel.trim_start_matches('@');
        let html = self.fetcher.fetch(&self.page_url(channel, None)).await?;
        if is_channel_page(&html) {
            Ok(channel.to_string())
        } else {
            Err(Error::Custom(format!("{channel} is not a public channel")))
        }
    }

    async fn history(
        &self,
        channel: &str,
        before: Option<i64>,
        limit: usize,
    ) -> Result<Vec<StreamMessage>, Error> {
        let html = self.fetcher.fetch(&self.page_url(channel, before)).await?;
        let mut messages = parse_page(&html);
        // newest first
        messages.reverse();
        if let Some(before) = before {
            messages.retain(|m| m.id < before);
        }
        messages.truncate(limit);
        Ok(messages)
    }
}

fn selector(s: &str) -> Option<Selector> {
    Selector::parse(s).ok()
}

fn is_channel_page(html: &str) -> bool {
    let doc = Html::parse_document(html);
    selector(".tgme_channel_info, .tgme_widget_message")
        .map_or(false, |sel| doc.select(&sel).next().is_some())
}

/// Parse counts such as `842`, `1.2K` or `3M`.
pub fn parse_count(s: &str) -> Option<u64> {
    let s = s.trim();
    let (number, factor) = match s.chars().last()? {
        'K' | 'k' => (&s[..s.len() - 1], 1_000.0),
        'M' | 'm' => (&s[..s.len() - 1], 1_000_000.0),
        _ => (s, 1.0),
    };
    let value: f64 = number.trim().parse().ok()?;
    Some((value * factor).round() as u64)
}

/// Text of an element, `<br>` being line breaks.
fn text_with_breaks(element: ElementRef) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        match node.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) if e.name() == "br" => out.push('\n'),
            _ => {}
        }
    }
    out
}

fn first<'a>(element: ElementRef<'a>, sel: &Option<Selector>) -> Option<ElementRef<'a>> {
    sel.as_ref().and_then(|sel| element.select(sel).next())
}

/// Parse every message of a preview page, in page order.
pub fn parse_page(html: &str) -> Vec<StreamMessage> {
    let doc = Html::parse_document(html);
    let Some(message_sel) = selector(".tgme_widget_message[data-post]") else {
        return Vec::new();
    };
    let text_sel = selector(".tgme_widget_message_text");
    let views_sel = selector(".tgme_widget_message_views");
    let date_sel = selector(".tgme_widget_message_date time[datetime]");
    let reply_sel = selector("a.tgme_widget_message_reply[href]");
    let reaction_sel = selector(".tgme_reaction");

    let mut messages = Vec::new();
    for message in doc.select(&message_sel) {
        let Some(id) = message
            .value()
            .attr("data-post")
            .and_then(|post| post.rsplit('/').next())
            .and_then(|id| id.parse::<i64>().ok())
        else {
            continue;
        };

        let date = first(message, &date_sel)
            .and_then(|t| t.value().attr("datetime"))
            .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc));
        let Some(date) = date else {
            warn!("message {id} has no parseable date, skipping");
            continue;
        };

        let text = first(message, &text_sel).map(text_with_breaks);
        let views = first(message, &views_sel)
            .and_then(|v| parse_count(&v.text().collect::<String>()));
        let reply_to = first(message, &reply_sel)
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| href.split('?').next())
            .and_then(|href| href.rsplit('/').next())
            .and_then(|id| id.parse::<i64>().ok());
        let reactions = reaction_sel
            .as_ref()
            .map(|sel| {
                message
                    .select(sel)
                    .filter_map(|r| {
                        let text = r.text().collect::<String>();
                        parse_count(text.trim_start_matches(|c: char| !c.is_ascii_digit()))
                    })
                    .sum()
            })
            .unwrap_or_default();

        messages.push(StreamMessage {
            id,
            date,
            text,
            views,
            forwards: None,
            reactions,
            reply_to,
            edit_date: None,
        });
    }
    messages
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::sources::extract::tests::FakeFetcher;

    const PAGE: &str = r#"<html><body><section class="tgme_channel_history">
<div class="tgme_widget_message_wrap"><div class="tgme_widget_message" data-post="rusembcy/120">
  <div class="tgme_widget_message_text">Первое<br>сообщение</div>
  <div class="tgme_widget_message_footer">
    <span class="tgme_widget_message_views">1.2K</span>
    <a class="tgme_widget_message_date" href="https://t.me/rusembcy/120"><time datetime="2024-03-01T10:00:00+00:00">10:00</time></a>
  </div>
</div></div>
<div class="tgme_widget_message_wrap"><div class="tgme_widget_message" data-post="rusembcy/121">
  <a class="tgme_widget_message_reply" href="https://t.me/rusembcy/120"><div>reply</div></a>
  <div class="tgme_widget_message_text">Второе <b>сообщение</b></div>
  <div class="tgme_widget_message_reactions"><span class="tgme_reaction"><i>👍</i>15</span><span class="tgme_reaction"><i>🔥</i> 1K</span></div>
  <span class="tgme_widget_message_views">842</span>
  <a class="tgme_widget_message_date"><time datetime="2024-03-01T11:30:00+00:00">11:30</time></a>
</div></div>
<div class="tgme_widget_message_wrap"><div class="tgme_widget_message" data-post="rusembcy/122">
  <div class="tgme_widget_message_photo"></div>
  <a class="tgme_widget_message_date"><time datetime="2024-03-01T12:00:00+00:00">12:00</time></a>
</div></div>
</section></body></html>"#;

    #[test]
    fn counts() {
        assert_eq!(parse_count("842"), Some(842));
        assert_eq!(parse_count("1.2K"), Some(1200));
        assert_eq!(parse_count(" 3M "), Some(3_000_000));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("views"), None);
    }

    #[test]
    fn page() {
        let messages = parse_page(PAGE);
        assert_eq!(messages.len(), 3);

        let m = &messages[0];
        assert_eq!(m.id, 120);
        assert_eq!(m.text.as_deref(), Some("Первое\nсообщение"));
        assert_eq!(m.views, Some(1200));
        assert_eq!(m.date, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
        assert_eq!(m.reply_to, None);

        let m = &messages[1];
        assert_eq!(m.text.as_deref(), Some("Второе сообщение"));
        assert_eq!(m.reply_to, Some(120));
        assert_eq!(m.reactions, 1015);
        assert_eq!(m.views, Some(842));

        assert!(messages[2].text.is_none());
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let fetcher = FakeFetcher::default()
            .with("https://t.me/s/rusembcy", PAGE)
            .with("https://t.me/s/rusembcy?before=122", PAGE);
        let preview = WebPreview::new(fetcher);

        assert_eq!(preview.resolve("@rusembcy").await.unwrap(), "rusembcy");

        let ids: Vec<i64> = preview
            .history("rusembcy", None, 10)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![122, 121, 120]);

        let ids: Vec<i64> = preview
            .history("rusembcy", Some(122), 1)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![121]);
    }

    #[tokio::test]
    async fn not_a_channel() {
        let fetcher = FakeFetcher::default().with("https://t.me/s/someone", "<html><body><p>hi</p></body></html>");
        let preview = WebPreview::new(fetcher);
        assert!(preview.resolve("someone").await.is_err());
    }
}
