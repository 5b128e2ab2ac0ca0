/*! Category tagging

Annotates every document with a binary indicator per keyword category.
This does not filter anything.
!*/
use crate::{
    error::Error,
    filtering::{Keywords, PatternSet},
    types::Document,
};

use super::Annotate;

pub struct CategoryTagger {
    categories: Vec<(String, PatternSet)>,
}

impl CategoryTagger {
    /// Tag with every category of `keywords`.
    pub fn new(keywords: &Keywords) -> Self {
        Self {
            categories: keywords
                .iter()
                .map(|(name, set)| (name.to_string(), set.clone()))
                .collect(),
        }
    }

    /// Tag with a subset of the categories of `keywords`.
    ///
    /// # Errors
    /// [Error::UnknownCategory] if a selected category does not exist.
    pub fn with_selection<S: AsRef<str>>(keywords: &Keywords, selection: &[S]) -> Result<Self, Error> {
        let categories = selection
            .iter()
            .map(|name| {
                let name = name.as_ref();
                keywords
                    .get(name)
                    .map(|set| (name.to_string(), set.clone()))
                    .ok_or_else(|| Error::UnknownCategory(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { categories })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }
}

impl Annotate<Document> for CategoryTagger {
    fn annotate(&self, doc: &mut Document) {
        let text = doc
            .metadata()
            .text_cleaned()
            .unwrap_or_else(|| doc.content())
            .to_lowercase();
        for (name, set) in &self.categories {
            let value = set.is_match(&text);
            doc.metadata_mut().add_tag(name.clone(), value);
        }
    }
}
