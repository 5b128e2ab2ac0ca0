/*! Text normalization

Produces `text_cleaned` from raw text:

1. inline markup tokens (`**`, `__`, `~~`, `` ` ``) are removed, until none remain,
2. URLs (`http…`, `www.…`) are removed,
3. characters outside of word characters, whitespace and `. , ! ? : " ' - # — « »` are replaced by a space,
4. whitespace runs are collapsed and the result is trimmed.

[clean] is idempotent.
!*/
use lazy_static::lazy_static;
use regex::Regex;

use crate::types::Document;

use super::Transform;

lazy_static! {
    static ref MARKUP: Regex = Regex::new(r"\*\*|__|~~|`").unwrap();
    static ref URL: Regex = Regex::new(r"http\S+|www\.\S+").unwrap();
    static ref DISALLOWED: Regex =
        Regex::new(r#"[^\w\s.,!?:"'\-#\x{2014}\x{00AB}\x{00BB}]"#).unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize a single message.
pub fn clean(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    // "_**_" only becomes markup-free after two passes
    let mut text = text.to_string();
    while MARKUP.is_match(&text) {
        text = MARKUP.replace_all(&text, "").into_owned();
    }

    let text = URL.replace_all(&text, "");
    let text = DISALLOWED.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Fills `text_cleaned` with the normalized raw content.
#[derive(Default)]
pub struct Normalizer;

impl Transform<Document> for Normalizer {
    fn transform_own(&self, mut doc: Document) -> Document {
        let cleaned = clean(doc.content());
        doc.metadata_mut().set_text_cleaned(cleaned);
        doc
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::types::Record;

    use super::*;

    #[test]
    fn url_and_spaces() {
        assert_eq!(
            clean("Check this out!! http://x.co/y   #win"),
            "Check this out!! #win"
        );
    }

    #[test]
    fn empty() {
        assert_eq!(clean(""), "");
        assert_eq!(clean("   "), "");
    }

    #[test]
    fn markup_and_emojis() {
        assert_eq!(
            clean("**Заявление** посольства 🇷🇺 `сегодня`"),
            "Заявление посольства сегодня"
        );
        assert_eq!(clean("~~old~~ __new__"), "old new");
    }

    #[test]
    fn keeps_allowed_punctuation() {
        let text = "«Κύπρος» — \"quote\" it's: ok, fine. yes? no!";
        assert_eq!(clean(text), text);
    }

    #[test]
    fn www_urls() {
        assert_eq!(clean("see www.mfa.gov.cy/news today"), "see today");
    }

    #[test]
    fn idempotent() {
        let inputs = [
            "_**_ nested",
            "Check this out!! http://x.co/y   #win",
            "a\tb\n\nc 🔥🔥 d",
            "**http://a.b** (brackets) [and] {braces} @mention",
            "__~~`x`~~__",
        ];
        for input in inputs {
            let once = clean(input);
            assert_eq!(clean(&once), once, "not idempotent on {input:?}");
            assert!(!once.contains("http"));
            assert!(!once.contains("  "));
            assert_eq!(once.trim(), once);
        }
    }

    #[test]
    fn transform_sets_cleaned() {
        let record = Record::new(
            "1".to_string(),
            Utc::now(),
            "chan".to_string(),
            "Cyprus".to_string(),
            "**hello** https://t.me/x",
        );
        let doc = Normalizer.transform_own(Document::from(record));
        assert_eq!(doc.metadata().text_cleaned(), Some("hello"));
        assert_eq!(doc.content(), "**hello** https://t.me/x");
    }
}
