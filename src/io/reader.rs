//! CSV readers.
use std::path::Path;

use log::{debug, warn};

use crate::{
    error::Error,
    types::{Document, Record},
};

use super::schema::Columns;

/// Read every record of a CSV file. Derived columns are ignored.
pub fn read_records(path: &Path) -> Result<Vec<Record>, Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns = Columns::new(reader.headers()?)?;
    let records = reader
        .records()
        .map(|row| columns.record(&row?))
        .collect::<Result<Vec<_>, _>>()?;
    report_bad_dates(&columns, path);
    debug!("read {} records from {:?}", records.len(), path);
    Ok(records)
}

/// Read every document of a CSV file, along with the derived columns that are present.
pub fn read_documents(path: &Path) -> Result<Vec<Document>, Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let columns = Columns::new(reader.headers()?)?;
    let docs = reader
        .records()
        .map(|row| columns.document(&row?))
        .collect::<Result<Vec<_>, _>>()?;
    report_bad_dates(&columns, path);
    debug!("read {} documents from {:?}", docs.len(), path);
    Ok(docs)
}

fn report_bad_dates(columns: &Columns, path: &Path) {
    let bad = columns.bad_dates();
    if bad > 0 {
        warn!("{:?}: {bad} unparseable dates, rows dated at the Unix epoch or without edit date", path);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;

    #[test]
    fn mixed_date_formats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.csv");
        fs::write(
            &path,
            "message_id,date,channel,region,text\n\
             1,2024-03-01T10:15:00+00:00,rt.com,tier1,Путин\n\
             2,20240301T101500Z,rt.com,tier1,Кипр\n\
             3,not a date,rt.com,tier1,НАТО\n",
        )
        .unwrap();

        let docs = read_documents(&path).unwrap();
        assert_eq!(docs.len(), 3);
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap();
        assert_eq!(docs[0].record().date, expected);
        assert_eq!(docs[1].record().date, expected);
        assert_eq!(docs[2].record().date, DateTime::<Utc>::default());
        assert_eq!(docs[2].content(), "НАТО");
    }
}
