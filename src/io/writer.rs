//! CSV writers.
use std::{
    collections::HashSet,
    fs::{self, OpenOptions},
    path::Path,
};

use log::debug;

use crate::{
    error::Error,
    types::{Document, Record},
};

use super::{reader::read_records, schema::Layout};

fn create_parent(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Write `docs` to `path`, replacing any existing file.
pub fn write_documents(path: &Path, docs: &[Document], layout: &Layout) -> Result<(), Error> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(layout.header())?;
    for doc in docs {
        writer.write_record(layout.row(doc)?)?;
    }
    writer.flush()?;
    debug!("wrote {} rows to {:?}", docs.len(), path);
    Ok(())
}

/// Write `records` to `path`, replacing any existing file.
pub fn write_records(path: &Path, records: &[Record]) -> Result<(), Error> {
    let docs: Vec<Document> = records.iter().cloned().map(Document::from).collect();
    write_documents(path, &docs, &Layout::raw())
}

/// Append the records whose `message_id` is not already in `path`.
///
/// Existing rows are never rewritten. Returns the number of appended records.
pub fn append_records(path: &Path, records: &[Record]) -> Result<usize, Error> {
    if !path.exists() {
        let mut seen = HashSet::new();
        let unique: Vec<Record> = records
            .iter()
            .filter(|r| seen.insert(r.message_id.as_str()))
            .cloned()
            .collect();
        write_records(path, &unique)?;
        return Ok(unique.len());
    }

    let existing = read_records(path)?;
    let mut seen: HashSet<String> = existing.into_iter().map(|r| r.message_id).collect();
    let layout = Layout::raw();

    let file = OpenOptions::new().append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    let mut appended = 0;
    for record in records {
        if seen.insert(record.message_id.clone()) {
            writer.write_record(layout.row(&Document::from(record.clone()))?)?;
            appended += 1;
        }
    }
    writer.flush()?;
    debug!("appended {appended} records to {:?}", path);
    Ok(appended)
}

/// Write a `(key, count)` table with the provided header.
pub fn write_table(path: &Path, header: [&str; 2], rows: &[(String, usize)]) -> Result<(), Error> {
    create_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for (key, count) in rows {
        writer.write_record([key.as_str(), count.to_string().as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use crate::io::reader::read_documents;

    use super::*;

    fn record(id: &str, text: &str) -> Record {
        Record::new(
            id.to_string(),
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            "mfa".to_string(),
            "Cyprus".to_string(),
            text,
        )
    }

    #[test]
    fn append_only() {
        let dst = tempdir().unwrap();
        let path = dst.path().join("raw").join("chan_raw.csv");

        let first = vec![record("1", "one"), record("2", "two"), record("2", "dup")];
        assert_eq!(append_records(&path, &first).unwrap(), 2);

        let second = vec![record("2", "changed"), record("3", "three")];
        assert_eq!(append_records(&path, &second).unwrap(), 1);

        let records = read_records(&path).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.message_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(records[1].text, "two");
    }

    #[test]
    fn tables() {
        let dst = tempdir().unwrap();
        let path = dst.path().join("ru_word_frequency.csv");
        write_table(&path, ["word", "frequency"], &[("кипр".to_string(), 3)]).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "word,frequency\nкипр,3\n");
    }

    #[test]
    fn documents() {
        let dst = tempdir().unwrap();
        let path = dst.path().join("docs.csv");
        let mut doc = Document::from(record("1", "multi\nline"));
        doc.metadata_mut().add_tag("MIGR".to_string(), false);
        let layout = Layout::for_documents(std::slice::from_ref(&doc));
        write_documents(&path, &[doc.clone()], &layout).unwrap();

        let docs = read_documents(&path).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content(), "multi line");
        assert_eq!(docs[0].metadata().tags().get("MIGR"), Some(&false));
    }
}
