/*! Collection configuration

Loaded from a YAML file. Credentials never live in the file: they are read from the environment,
a `.env` file in the working directory being loaded first if present.

```yaml
window:
  start: 2024-01-01T00:00:00Z
limit: 3000
retry:
  max_retries: 3
message_stream:
  backend: mtproto
  session_file: kypros.session
sources:
  - kind: message_stream
    name: rusembcy
    region: Cyprus
  - kind: sitemap
    name: rt.com
    region: tier1_archived
    sitemap_index: https://www.rt.com/sitemap.xml
```
!*/
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use log::debug;
use serde::Deserialize;

use crate::{
    error::Error,
    filtering::{Exclusion, Inclusion, Keywords, PatternSet},
    lang::Lang,
    sources::{retry::BackoffConfig, SourceDescriptor, SourceKind, TimeWindow},
};

fn default_limit() -> usize {
    3000
}

fn default_timeout() -> u64 {
    30
}

fn default_languages() -> Vec<Lang> {
    Lang::TARGETS.to_vec()
}

/// Message stream backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageBackend {
    /// Signed-in MTProto session, with forward counts and flood control.
    Mtproto,
    /// Account-free public web preview, without forward counts.
    WebPreview,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MessageStreamConfig {
    pub backend: MessageBackend,
    /// Signed-in session file, for the [MessageBackend::Mtproto] backend.
    pub session_file: PathBuf,
    pub page_size: usize,
    /// Inter-channel pause bounds, in seconds.
    pub pause_min_secs: u64,
    pub pause_max_secs: u64,
}

impl Default for MessageStreamConfig {
    fn default() -> Self {
        Self {
            backend: MessageBackend::Mtproto,
            session_file: PathBuf::from("kypros.session"),
            page_size: 100,
            pause_min_secs: 10,
            pause_max_secs: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DocumentSearchConfig {
    pub max_records: usize,
    pub query: Option<String>,
}

impl Default for DocumentSearchConfig {
    fn default() -> Self {
        Self {
            max_records: 250,
            query: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    pub max_articles: usize,
    pub hints: Option<Vec<String>>,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            max_articles: 500,
            hints: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SocialSearchConfig {
    pub page_size: usize,
    pub query: Option<String>,
}

impl Default for SocialSearchConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            query: None,
        }
    }
}

/// Keyword overrides. Missing entries keep the built-in lists.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct KeywordsConfig {
    pub include: Option<BTreeMap<String, Vec<String>>>,
    pub exclude: Vec<String>,
}

impl KeywordsConfig {
    pub fn keywords(&self) -> Result<Keywords, Error> {
        match &self.include {
            Some(map) => Keywords::from_map(map),
            None => Ok(Keywords::default()),
        }
    }

    pub fn inclusion(&self) -> Result<Inclusion, Error> {
        Ok(Inclusion::new(self.keywords()?))
    }

    pub fn exclusion(&self) -> Result<Exclusion, Error> {
        Ok(Exclusion::new(PatternSet::new(&self.exclude)?))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CorpusConfig {
    pub window: TimeWindow,
    /// Per-source default limit.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// HTTP request timeout, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub retry: BackoffConfig,
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
    #[serde(default)]
    pub message_stream: MessageStreamConfig,
    #[serde(default)]
    pub document_search: DocumentSearchConfig,
    #[serde(default)]
    pub sitemap: SitemapConfig,
    #[serde(default)]
    pub social_search: SocialSearchConfig,
    #[serde(default)]
    pub keywords: KeywordsConfig,
    #[serde(default = "default_languages")]
    pub languages: Vec<Lang>,
}

impl CorpusConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        let config: CorpusConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration at `path` (and the `.env` file, if any).
    pub fn load(path: &Path) -> Result<Self, Error> {
        match dotenvy::dotenv() {
            Ok(env) => debug!("loaded environment from {:?}", env),
            Err(e) => debug!("no .env file loaded: {e}"),
        }
        Self::from_yaml(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), Error> {
        if let Some(end) = self.window.end {
            if end <= self.window.start {
                return Err(Error::Config(format!(
                    "window end {end} is not after its start {}",
                    self.window.start
                )));
            }
        }
        if self.message_stream.pause_min_secs > self.message_stream.pause_max_secs {
            return Err(Error::Config("message_stream pause bounds are inverted".to_string()));
        }
        for source in &self.sources {
            if source.kind == SourceKind::Sitemap && source.sitemap_index.is_none() {
                return Err(Error::Config(format!(
                    "sitemap source {} has no sitemap_index",
                    source.name
                )));
            }
        }
        // compile patterns early
        self.keywords.keywords()?;
        self.keywords.exclusion()?;
        Ok(())
    }

    /// Kinds having at least one configured source, in [SourceKind::ALL] order.
    pub fn kinds(&self) -> Vec<SourceKind> {
        SourceKind::ALL
            .into_iter()
            .filter(|kind| self.sources.iter().any(|s| s.kind == *kind))
            .collect()
    }
}
