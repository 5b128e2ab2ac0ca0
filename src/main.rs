//! # Kypros
//!
//! Corpus construction tool: collection of raw records, then processing into
//! language-split, filtered, lemmatized corpora and frequency tables.
//!
//! ```sh
//! kypros 0.1.0
//! multilingual corpus construction tool.
//!
//! USAGE:
//!     kypros <SUBCOMMAND>
//!
//! SUBCOMMANDS:
//!     collect    Collect every configured source
//!     help       Prints this message or the help of the given subcommand(s)
//!     process    Normalize, classify, filter, lemmatize and count a raw file
//! ```
//!
//! Logging is configured with `RUST_LOG` (e.g. `RUST_LOG=kypros=info`).
use std::time::Duration;

use structopt::StructOpt;

use kypros::{
    config::{CorpusConfig, MessageBackend},
    error::Error,
    filtering::{Length, RelevanceFilter},
    identifiers::FastText,
    lemmatize::{udpipe::UdpipeBuilder, Lemmatizer},
    pipelines::{Corpus, Pipeline},
    sources::{
        gdelt::Gdelt, mtproto::Mtproto, telegram::WebPreview, twitter::RecentSearch, Backoff, Collector,
        DocumentSearchCollector, Harvest, HtmlExtractor, HttpFetcher, MessageStreamCollector,
        SitemapCollector, SocialSearchCollector, SourceKind,
    },
    transformers::CategoryTagger,
};

#[macro_use]
extern crate log;

mod cli;

/// Collector of `kind`, as configured.
async fn collector(
    kind: SourceKind,
    config: &CorpusConfig,
    fetcher: &HttpFetcher,
) -> Result<Box<dyn Collector>, Error> {
    let backoff = Backoff::from(&config.retry);
    let collector: Box<dyn Collector> = match kind {
        SourceKind::MessageStream => {
            let c = &config.message_stream;
            let pause = c.pause_min_secs..=c.pause_max_secs;
            match c.backend {
                MessageBackend::Mtproto => Box::new(
                    MessageStreamCollector::new(Mtproto::connect(&c.session_file).await?, backoff)
                        .with_page_size(c.page_size)
                        .with_pause(pause),
                ),
                MessageBackend::WebPreview => Box::new(
                    MessageStreamCollector::new(WebPreview::new(fetcher.clone()), backoff)
                        .with_page_size(c.page_size)
                        .with_pause(pause),
                ),
            }
        }
        SourceKind::DocumentSearch => {
            let c = &config.document_search;
            let mut collector = DocumentSearchCollector::new(
                Gdelt::new(fetcher.clone()),
                HtmlExtractor::new(fetcher.clone()),
                backoff,
            )
            .with_max_records(c.max_records);
            if let Some(query) = &c.query {
                collector = collector.with_default_query(query);
            }
            Box::new(collector)
        }
        SourceKind::Sitemap => {
            let c = &config.sitemap;
            let mut collector = SitemapCollector::new(
                fetcher.clone(),
                HtmlExtractor::new(fetcher.clone()),
                backoff,
                config.keywords.inclusion()?,
            )
            .with_max_articles(c.max_articles);
            if let Some(hints) = &c.hints {
                collector = collector.with_hints(hints.clone());
            }
            Box::new(collector)
        }
        SourceKind::SocialSearch => {
            let c = &config.social_search;
            let search = RecentSearch::from_env(fetcher.client().clone())?;
            let mut collector =
                SocialSearchCollector::new(search, backoff).with_page_size(c.page_size);
            if let Some(query) = &c.query {
                collector = collector.with_default_query(query);
            }
            Box::new(collector)
        }
    };
    Ok(collector)
}

async fn collect(opt: cli::Collect) -> Result<(), Error> {
    let config = CorpusConfig::load(&opt.config)?;
    let fetcher = HttpFetcher::new(Duration::from_secs(config.timeout_secs))?;
    let harvest = Harvest::new(&opt.dst, config.window, config.limit);

    for kind in config.kinds() {
        let collector = match collector(kind, &config, &fetcher).await {
            Ok(c) => c,
            Err(e) => {
                error!("{kind}: cannot set up collector: {e}");
                continue;
            }
        };
        let outcomes = harvest.run(kind, collector.as_ref(), &config.sources).await?;
        for outcome in outcomes {
            info!("{kind}/{outcome}");
        }
    }
    Ok(())
}

fn process(opt: cli::Process) -> Result<(), Error> {
    let config = opt.config.as_deref().map(CorpusConfig::load).transpose()?;
    let (keywords, languages) = match &config {
        Some(c) => (c.keywords.clone(), c.languages.clone()),
        None => (Default::default(), kypros::lang::Lang::TARGETS.to_vec()),
    };

    let identifier = FastText::new_lid(&opt.lid_path, &languages)?;
    let relevance = RelevanceFilter::new(
        Length::with_min_size(opt.min_length),
        keywords.exclusion()?,
        keywords.inclusion()?,
    );
    let tagger = if opt.categories.is_empty() {
        CategoryTagger::new(&keywords.keywords()?)
    } else {
        CategoryTagger::with_selection(&keywords.keywords()?, &opt.categories)?
    };
    let mut lemmatizer = Lemmatizer::default();
    for lang in &languages {
        lemmatizer =
            lemmatizer.with_builder(*lang, Box::new(UdpipeBuilder::for_lang(&opt.udpipe_url, *lang)?));
    }

    let corpus = Corpus::new(
        &opt.src,
        &opt.dst,
        identifier,
        relevance,
        tagger,
        lemmatizer,
        languages,
    )
    .with_top_n(opt.top_n)
    .with_min_freq(opt.min_freq);
    corpus.run()?;
    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::Kypros::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::Kypros::Collect(c) => {
            // processing uses blocking clients, only collection runs on a runtime
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(collect(c))?;
        }
        cli::Kypros::Process(p) => process(p)?,
    };
    Ok(())
}
