//! Lazily built morphological pipelines.
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use log::{debug, info};

use crate::{error::Error, lang::Lang};

use super::{Morphology, MorphologyBuilder};

/// Pipeline holder.
/// Internally has two [HashMap]: One with builders and one with the actual pipelines.
///
/// Pipelines are built on first use, at most once per language.
#[derive(Default)]
pub struct PipelineRegistry {
    pipelines: RwLock<HashMap<Lang, Arc<dyn Morphology>>>,
    builders: RwLock<HashMap<Lang, Box<dyn MorphologyBuilder>>>,
}

impl PipelineRegistry {
    /// Insert a new builder for a given language.
    /// Behaves like [HashMap::insert].
    ///
    /// Be aware that the pipeline is only built on the first [PipelineRegistry::get].
    pub fn insert_builder(&self, lang: Lang, builder: Box<dyn MorphologyBuilder>) {
        debug!("Registering builder for {lang}");
        let mut builders = self.builders.write().unwrap_or_else(PoisonError::into_inner);
        builders.insert(lang, builder);
    }

    /// Check if there is a builder for a given language.
    pub fn contains(&self, lang: &Lang) -> bool {
        self.builders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(lang)
    }

    /// Check if the pipeline of a given language has been built.
    pub fn is_loaded(&self, lang: &Lang) -> bool {
        self.pipelines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(lang)
    }

    /// Get the pipeline for `lang`, building it if needed.
    ///
    /// # Errors
    /// [Error::UnsupportedLang] if no builder is registered for `lang`,
    /// or any error the builder raises.
    pub fn get(&self, lang: Lang) -> Result<Arc<dyn Morphology>, Error> {
        if let Some(pipeline) = self
            .pipelines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&lang)
        {
            return Ok(pipeline.clone());
        }

        let mut pipelines = self.pipelines.write().unwrap_or_else(PoisonError::into_inner);

        // another caller may have built it while we were waiting for the lock
        if let Some(pipeline) = pipelines.get(&lang) {
            return Ok(pipeline.clone());
        }

        let builders = self.builders.read().unwrap_or_else(PoisonError::into_inner);
        let builder = builders.get(&lang).ok_or(Error::UnsupportedLang(lang))?;

        info!("Building morphological pipeline for {lang}");
        let pipeline: Arc<dyn Morphology> = Arc::from(builder.build()?);
        pipelines.insert(lang, pipeline.clone());
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::lemmatize::Token;

    use super::*;

    struct Echo;
    impl Morphology for Echo {
        fn analyze(&self, text: &str) -> Result<Vec<Token>, Error> {
            Ok(text
                .split_whitespace()
                .map(|w| Token::new(w, Some(w), "NOUN"))
                .collect())
        }
    }

    struct CountingBuilder(Arc<AtomicUsize>);
    impl MorphologyBuilder for CountingBuilder {
        fn build(&self) -> Result<Box<dyn Morphology>, Error> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Echo))
        }
    }

    struct FailingBuilder;
    impl MorphologyBuilder for FailingBuilder {
        fn build(&self) -> Result<Box<dyn Morphology>, Error> {
            Err(Error::Custom("no model".to_string()))
        }
    }

    #[test]
    fn built_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = PipelineRegistry::default();
        registry.insert_builder(Lang::Ru, Box::new(CountingBuilder(builds.clone())));

        assert!(registry.contains(&Lang::Ru));
        assert!(!registry.is_loaded(&Lang::Ru));
        for _ in 0..5 {
            registry.get(Lang::Ru).unwrap();
        }
        assert!(registry.is_loaded(&Lang::Ru));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn built_once_across_threads() {
        let builds = Arc::new(AtomicUsize::new(0));
        let registry = Arc::new(PipelineRegistry::default());
        registry.insert_builder(Lang::El, Box::new(CountingBuilder(builds.clone())));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.get(Lang::El).map(|_| ()))
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_builder() {
        let registry = PipelineRegistry::default();
        assert!(matches!(
            registry.get(Lang::En),
            Err(Error::UnsupportedLang(Lang::En))
        ));
    }

    #[test]
    fn failed_build_is_not_cached() {
        let registry = PipelineRegistry::default();
        registry.insert_builder(Lang::En, Box::new(FailingBuilder));
        assert!(registry.get(Lang::En).is_err());
        assert!(!registry.is_loaded(&Lang::En));
    }
}
