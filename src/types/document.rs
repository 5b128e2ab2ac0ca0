use std::collections::BTreeMap;

use crate::identifiers::ScriptType;
use crate::lang::Lang;

use super::Record;

/// Fields derived by the pipeline stages.
///
/// Stages only ever set fields: once computed, a derived field stays on the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    text_cleaned: Option<String>,
    script_type: Option<ScriptType>,
    language: Option<Lang>,
    lemmas: Option<Vec<String>>,
    tags: BTreeMap<String, bool>,
}

impl Metadata {
    pub fn text_cleaned(&self) -> Option<&str> {
        self.text_cleaned.as_deref()
    }

    pub fn set_text_cleaned(&mut self, text_cleaned: String) {
        self.text_cleaned = Some(text_cleaned);
    }

    pub fn script_type(&self) -> Option<&ScriptType> {
        self.script_type.as_ref()
    }

    pub fn set_script_type(&mut self, script_type: ScriptType) {
        self.script_type = Some(script_type);
    }

    pub fn language(&self) -> Option<&Lang> {
        self.language.as_ref()
    }

    pub fn set_language(&mut self, language: Lang) {
        self.language = Some(language);
    }

    pub fn lemmas(&self) -> Option<&[String]> {
        self.lemmas.as_deref()
    }

    pub fn set_lemmas(&mut self, lemmas: Vec<String>) {
        self.lemmas = Some(lemmas);
    }

    /// Category tags, ordered by category name.
    pub fn tags(&self) -> &BTreeMap<String, bool> {
        &self.tags
    }

    pub fn add_tag(&mut self, category: String, value: bool) {
        self.tags.insert(category, value);
    }
}

/// Text columns a stage can read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColumn {
    Text,
    TextCleaned,
}

impl TextColumn {
    pub fn name(&self) -> &'static str {
        match self {
            TextColumn::Text => "text",
            TextColumn::TextCleaned => "text_cleaned",
        }
    }

    /// Get the column value for `doc`, [None] if it has not been computed yet.
    pub fn get<'a>(&self, doc: &'a Document) -> Option<&'a str> {
        match self {
            TextColumn::Text => Some(doc.content()),
            TextColumn::TextCleaned => doc.metadata().text_cleaned(),
        }
    }
}

/// A Document is a [Record] along with the fields the pipeline derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    record: Record,
    metadata: Metadata,
}

impl Document {
    pub fn new(record: Record, metadata: Metadata) -> Self {
        Self { record, metadata }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Raw text of the record.
    pub fn content(&self) -> &str {
        &self.record.text
    }

    pub fn into_record(self) -> Record {
        self.record
    }
}

impl From<Record> for Document {
    fn from(record: Record) -> Self {
        Self::new(record, Metadata::default())
    }
}
