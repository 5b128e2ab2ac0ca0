/*! Language-separated document writer.

Each language is given a CSV writer, created on first write, wrapped into a [Mutex].
Files are named `<lang>_<stage>.csv`.
!*/
use std::{
    collections::HashMap,
    fs::{self, File},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError, RwLock},
};

use log::info;

use crate::{error::Error, lang::Lang, types::Document};

use super::schema::Layout;

/// Path of the `stage` file of `lang` in `dst`.
pub fn lang_path(dst: &Path, lang: Lang, stage: &str) -> PathBuf {
    dst.join(format!("{}_{stage}.csv", lang.code()))
}

type LanguageMap = HashMap<Lang, Mutex<csv::Writer<File>>>;

pub struct LangFiles {
    writers: RwLock<LanguageMap>,
    dst: PathBuf,
    stage: String,
    layout: Layout,
}

impl LangFiles {
    /// Create a new LangFiles. No file is created until a document of a given language is written.
    pub fn new(dst: &Path, stage: &str, layout: Layout) -> Self {
        Self {
            writers: RwLock::new(HashMap::new()),
            dst: dst.to_path_buf(),
            stage: stage.to_string(),
            layout,
        }
    }

    pub fn contains(&self, lang: &Lang) -> bool {
        self.writers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(lang)
    }

    /// Create the file of `lang` and write its header.
    /// Keeps the existing writer if there's one already.
    pub fn insert_writer(&self, lang: Lang) -> Result<(), Error> {
        let mut writers = self.writers.write().unwrap_or_else(PoisonError::into_inner);
        if writers.contains_key(&lang) {
            return Ok(());
        }

        let path = lang_path(&self.dst, lang, &self.stage);
        info!("Creating writer {:?}", path);
        fs::create_dir_all(&self.dst)?;
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.layout.header())?;
        writers.insert(lang, Mutex::new(writer));
        Ok(())
    }

    /// Write `doc` into the file of its language. Documents without a language go to [Lang::Unknown].
    pub fn write(&self, doc: &Document) -> Result<(), Error> {
        let lang = doc.metadata().language().copied().unwrap_or(Lang::Unknown);
        if !self.contains(&lang) {
            self.insert_writer(lang)?;
        }

        let row = self.layout.row(doc)?;
        let writers = self.writers.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(writer) = writers.get(&lang) {
            writer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write_record(row)?;
        }
        Ok(())
    }

    /// Flush every writer.
    pub fn flush(&self) -> Result<(), Error> {
        let writers = self.writers.read().unwrap_or_else(PoisonError::into_inner);
        for writer in writers.values() {
            writer.lock().unwrap_or_else(PoisonError::into_inner).flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::tempdir;

    use crate::{io::reader::read_documents, types::Record};

    use super::*;

    fn doc(id: &str, lang: Option<Lang>) -> Document {
        let mut d = Document::from(Record::new(
            id.to_string(),
            Utc::now(),
            "c".to_string(),
            "r".to_string(),
            "text",
        ));
        if let Some(lang) = lang {
            d.metadata_mut().set_language(lang);
        }
        d
    }

    #[test]
    fn test_contains() {
        let dst = tempdir().unwrap();
        let lf = LangFiles::new(dst.path(), "posts", Layout::derived(vec![]));
        assert!(!lf.contains(&Lang::El));
        lf.insert_writer(Lang::El).unwrap();
        assert!(lf.contains(&Lang::El));
        assert!(lang_path(dst.path(), Lang::El, "posts").exists());
    }

    #[test]
    fn split_by_language() {
        let dst = tempdir().unwrap();
        let lf = LangFiles::new(dst.path(), "posts", Layout::derived(vec![]));
        for d in [
            doc("1", Some(Lang::Ru)),
            doc("2", Some(Lang::En)),
            doc("3", Some(Lang::Ru)),
            doc("4", None),
        ] {
            lf.write(&d).unwrap();
        }
        lf.flush().unwrap();

        let ru = read_documents(&lang_path(dst.path(), Lang::Ru, "posts")).unwrap();
        assert_eq!(ru.len(), 2);
        let unknown = read_documents(&lang_path(dst.path(), Lang::Unknown, "posts")).unwrap();
        assert_eq!(unknown.len(), 1);
        assert!(!lang_path(dst.path(), Lang::El, "posts").exists());
    }
}
