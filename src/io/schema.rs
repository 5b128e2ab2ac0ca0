/*! CSV layout of records and documents

Columns are, in order:
- record columns ([RECORD_COLUMNS]),
- derived columns ([DERIVED_COLUMNS]), when the layout has them,
- one `0`/`1` column per tag category.

Dates are RFC 3339 strings, missing optional values are empty cells and lemmas are a JSON array.
!*/
use std::{cell::Cell, collections::HashMap};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::StringRecord;
use log::debug;

use crate::{
    error::Error,
    identifiers::ScriptType,
    lang::Lang,
    types::{Document, Metadata, Record},
};

pub const RECORD_COLUMNS: [&str; 11] = [
    "message_id",
    "date",
    "channel",
    "region",
    "text",
    "views",
    "forwards",
    "reactions",
    "reply_to_id",
    "edit_date",
    "source_url",
];

pub const DERIVED_COLUMNS: [&str; 4] = ["text_cleaned", "script_type", "language", "lemmas"];

/// Which columns get written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    derived: bool,
    tags: Vec<String>,
}

impl Layout {
    /// Record columns only.
    pub fn raw() -> Self {
        Self::default()
    }

    /// Record columns, derived columns and `tags`.
    pub fn derived(tags: Vec<String>) -> Self {
        Self {
            derived: true,
            tags,
        }
    }

    /// Derived layout with every tag present in `docs`.
    pub fn for_documents(docs: &[Document]) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for doc in docs {
            for tag in doc.metadata().tags().keys() {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        tags.sort();
        Self::derived(tags)
    }

    pub fn header(&self) -> Vec<&str> {
        let mut header: Vec<&str> = RECORD_COLUMNS.to_vec();
        if self.derived {
            header.extend(DERIVED_COLUMNS);
            header.extend(self.tags.iter().map(String::as_str));
        }
        header
    }

    pub fn row(&self, doc: &Document) -> Result<Vec<String>, Error> {
        let mut row = record_row(doc.record());
        if self.derived {
            let metadata = doc.metadata();
            row.push(metadata.text_cleaned().unwrap_or_default().to_string());
            row.push(opt(metadata.script_type()));
            row.push(opt(metadata.language()));
            row.push(match metadata.lemmas() {
                Some(lemmas) => serde_json::to_string(lemmas)?,
                None => String::new(),
            });
            for tag in &self.tags {
                let value = metadata.tags().get(tag).copied().unwrap_or_default();
                row.push(if value { "1" } else { "0" }.to_string());
            }
        }
        Ok(row)
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn record_row(r: &Record) -> Vec<String> {
    vec![
        r.message_id.clone(),
        r.date.to_rfc3339(),
        r.channel.clone(),
        r.region.clone(),
        r.text.clone(),
        r.views.to_string(),
        r.forwards.to_string(),
        r.reactions.to_string(),
        r.reply_to_id.clone().unwrap_or_default(),
        opt(r.edit_date.map(|d| d.to_rfc3339())),
        r.source_url.clone().unwrap_or_default(),
    ]
}

/// Parse a timestamp.
///
/// Accepts RFC 3339 and its space-separated variant, compact `20240301T101500Z` timestamps,
/// offset-less `2024-03-01 10:15:00` (taken as UTC) and plain dates.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z"))
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y%m%dT%H%M%SZ", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|d| d.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|d| d.and_utc())
        })
}

/// Column positions of a CSV header.
pub struct Columns {
    positions: HashMap<String, usize>,
    tags: Vec<(String, usize)>,
    /// Rows whose `date` or `edit_date` could not be parsed.
    bad_dates: Cell<usize>,
}

impl Columns {
    /// Map `header`. Unknown columns are tag candidates.
    pub fn new(header: &StringRecord) -> Result<Self, Error> {
        let mut positions = HashMap::new();
        let mut tags = Vec::new();
        for (idx, name) in header.iter().enumerate() {
            if RECORD_COLUMNS.contains(&name) || DERIVED_COLUMNS.contains(&name) {
                positions.insert(name.to_string(), idx);
            } else {
                tags.push((name.to_string(), idx));
            }
        }
        for required in ["message_id", "date", "text"] {
            if !positions.contains_key(required) {
                return Err(Error::MissingColumn(required.to_string()));
            }
        }
        Ok(Self {
            positions,
            tags,
            bad_dates: Cell::new(0),
        })
    }

    fn get<'a>(&self, row: &'a StringRecord, column: &str) -> Option<&'a str> {
        self.positions.get(column).and_then(|idx| row.get(*idx))
    }

    /// Non-empty value of `column`.
    fn non_empty<'a>(&self, row: &'a StringRecord, column: &str) -> Option<&'a str> {
        self.get(row, column).filter(|v| !v.is_empty())
    }

    fn count(&self, row: &StringRecord, column: &str) -> u64 {
        self.non_empty(row, column)
            // counts may have been written as floats by other tools
            .and_then(|v| v.parse::<u64>().ok().or_else(|| v.parse::<f64>().ok().map(|f| f as u64)))
            .unwrap_or_default()
    }

    /// Number of rows read so far with an unparseable date.
    pub fn bad_dates(&self) -> usize {
        self.bad_dates.get()
    }

    fn date(&self, value: Option<&str>) -> Option<DateTime<Utc>> {
        let date = value.and_then(parse_date);
        if date.is_none() {
            debug!("unparseable date {value:?}");
            self.bad_dates.set(self.bad_dates.get() + 1);
        }
        date
    }

    /// Parse a record. An unparseable `date` falls back to the Unix epoch and an unparseable `edit_date` is dropped,
    /// both being counted in [Columns::bad_dates].
    pub fn record(&self, row: &StringRecord) -> Result<Record, Error> {
        let date = self.date(self.get(row, "date")).unwrap_or_default();
        let mut record = Record::new(
            self.get(row, "message_id").unwrap_or_default().to_string(),
            date,
            self.get(row, "channel").unwrap_or_default().to_string(),
            self.get(row, "region").unwrap_or_default().to_string(),
            self.get(row, "text").unwrap_or_default(),
        );
        record.views = self.count(row, "views");
        record.forwards = self.count(row, "forwards");
        record.reactions = self.count(row, "reactions");
        record.reply_to_id = self.non_empty(row, "reply_to_id").map(String::from);
        record.edit_date = self
            .non_empty(row, "edit_date")
            .and_then(|d| self.date(Some(d)));
        record.source_url = self.non_empty(row, "source_url").map(String::from);
        Ok(record)
    }

    pub fn document(&self, row: &StringRecord) -> Result<Document, Error> {
        let record = self.record(row)?;
        let mut metadata = Metadata::default();
        // an empty cell next to a non-empty text is a row that was never normalized
        if let Some(cleaned) = self
            .get(row, "text_cleaned")
            .filter(|c| !c.is_empty() || record.text.is_empty())
        {
            metadata.set_text_cleaned(cleaned.to_string());
        }
        if let Some(script) = self.non_empty(row, "script_type") {
            metadata.set_script_type(script.parse::<ScriptType>()?);
        }
        if let Some(language) = self.non_empty(row, "language") {
            metadata.set_language(language.parse::<Lang>()?);
        }
        if let Some(lemmas) = self.non_empty(row, "lemmas") {
            metadata.set_lemmas(serde_json::from_str(lemmas)?);
        }
        for (name, idx) in &self.tags {
            match row.get(*idx) {
                Some("1") | Some("true") | Some("True") => metadata.add_tag(name.clone(), true),
                Some("0") | Some("false") | Some("False") => metadata.add_tag(name.clone(), false),
                other => debug!("ignoring non-binary value {other:?} in column {name}"),
            }
        }
        Ok(Document::new(record, metadata))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn header(cols: &[&str]) -> StringRecord {
        StringRecord::from(cols.to_vec())
    }

    #[test]
    fn layouts() {
        assert_eq!(Layout::raw().header().len(), 11);
        let l = Layout::derived(vec!["WAR".to_string()]);
        assert_eq!(l.header().len(), 16);
        assert_eq!(l.header()[15], "WAR");
    }

    #[test]
    fn row_and_back() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut record = Record::new(
            "7".to_string(),
            date,
            "rusembcy".to_string(),
            "Cyprus".to_string(),
            "Заявление, \"цитата\"",
        );
        record.views = 1200;
        record.reply_to_id = Some("5".to_string());
        let mut doc = Document::from(record);
        doc.metadata_mut().set_text_cleaned("Заявление, \"цитата\"".to_string());
        doc.metadata_mut().set_language(Lang::Ru);
        doc.metadata_mut().set_lemmas(vec!["заявление".to_string()]);
        doc.metadata_mut().add_tag("WAR".to_string(), true);

        let layout = Layout::for_documents(std::slice::from_ref(&doc));
        let header = StringRecord::from(layout.header());
        let row = StringRecord::from(layout.row(&doc).unwrap());
        let columns = Columns::new(&header).unwrap();
        let parsed = columns.document(&row).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn required_columns() {
        assert!(matches!(
            Columns::new(&header(&["message_id", "text"])),
            Err(Error::MissingColumn(c)) if c == "date"
        ));
    }

    #[test]
    fn date_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap();
        for s in [
            "2024-03-01T10:15:00Z",
            "2024-03-01T13:15:00+03:00",
            "2024-03-01 10:15:00+00:00",
            "20240301T101500Z",
            "2024-03-01 10:15:00",
        ] {
            assert_eq!(parse_date(s), Some(expected), "{s}");
        }
        assert_eq!(
            parse_date("2024-03-01"),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).single()
        );
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn bad_dates_fall_back() {
        let columns = Columns::new(&header(&["message_id", "date", "text", "edit_date"])).unwrap();
        let ok = columns
            .record(&StringRecord::from(vec!["1", "20240301T101500Z", "a", ""]))
            .unwrap();
        assert_eq!(ok.date, Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap());
        assert_eq!(columns.bad_dates(), 0);

        let bad = columns
            .record(&StringRecord::from(vec!["2", "last tuesday", "b", "soon"]))
            .unwrap();
        assert_eq!(bad.date, DateTime::<Utc>::default());
        assert_eq!(bad.edit_date, None);
        assert_eq!(bad.text, "b");
        assert_eq!(columns.bad_dates(), 2);
    }

    #[test]
    fn unnormalized_rows_have_no_cleaned_text() {
        let columns = Columns::new(&header(&["message_id", "date", "text", "text_cleaned"])).unwrap();
        let doc = columns
            .document(&StringRecord::from(vec!["1", "2024-03-01", "raw text", ""]))
            .unwrap();
        assert_eq!(doc.metadata().text_cleaned(), None);

        let doc = columns
            .document(&StringRecord::from(vec!["2", "2024-03-01", "", ""]))
            .unwrap();
        assert_eq!(doc.metadata().text_cleaned(), Some(""));
    }

    #[test]
    fn lenient_values() {
        let columns = Columns::new(&header(&["message_id", "date", "text", "views", "note"])).unwrap();
        let row = StringRecord::from(vec!["1", "2024-01-02 10:00:00+00:00", "hi", "12.0", "free text"]);
        let doc = columns.document(&row).unwrap();
        assert_eq!(doc.record().views, 12);
        assert!(doc.metadata().tags().is_empty());
        assert!(doc.metadata().text_cleaned().is_none());
    }
}
