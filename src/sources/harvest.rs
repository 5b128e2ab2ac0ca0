/*! Collection driver

Sources are collected one after the other. Each successful source is checkpointed right away,
so that a crash or a failing source never loses what has already been collected.
!*/
use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
};

use log::{error, info, warn};
use tokio::time::sleep;

use crate::{
    error::Error,
    io::{append_records, read_records, write_records},
    types::Record,
};

use super::{Collector, SourceDescriptor, SourceKind, TimeWindow};

/// What happened to a single source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Collected {
        source: String,
        fetched: usize,
        appended: usize,
    },
    Skipped {
        source: String,
        reason: String,
    },
}

impl SourceOutcome {
    pub fn source(&self) -> &str {
        match self {
            SourceOutcome::Collected { source, .. } | SourceOutcome::Skipped { source, .. } => {
                source
            }
        }
    }

    pub fn is_collected(&self) -> bool {
        matches!(self, SourceOutcome::Collected { .. })
    }
}

impl fmt::Display for SourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOutcome::Collected {
                source,
                fetched,
                appended,
            } => write!(f, "{source}: {fetched} fetched, {appended} new"),
            SourceOutcome::Skipped { source, reason } => write!(f, "{source}: skipped ({reason})"),
        }
    }
}

pub struct Harvest {
    dst: PathBuf,
    window: TimeWindow,
    limit: usize,
}

impl Harvest {
    /// `limit` is the per-source default, overridden by [SourceDescriptor::limit].
    pub fn new(dst: &Path, window: TimeWindow, limit: usize) -> Self {
        Self {
            dst: dst.to_path_buf(),
            window,
            limit,
        }
    }

    /// `<dst>/raw/<kind>/<source>_raw.csv`
    pub fn checkpoint_path(&self, source: &SourceDescriptor) -> PathBuf {
        self.dst
            .join("raw")
            .join(source.kind.name())
            .join(format!("{}_raw.csv", source.file_stem()))
    }

    /// `<dst>/raw/<kind>_raw.csv`
    pub fn merged_path(&self, kind: SourceKind) -> PathBuf {
        self.dst.join("raw").join(format!("{}_raw.csv", kind.name()))
    }

    async fn collect_one(
        &self,
        collector: &dyn Collector,
        source: &SourceDescriptor,
    ) -> Result<(usize, usize), Error> {
        let limit = source.limit.unwrap_or(self.limit);
        let records = collector.collect(source, &self.window, limit).await?;
        let appended = append_records(&self.checkpoint_path(source), &records)?;
        Ok((records.len(), appended))
    }

    /// Collect every source of `kind`, then write the merged file of this kind.
    pub async fn run(
        &self,
        kind: SourceKind,
        collector: &dyn Collector,
        sources: &[SourceDescriptor],
    ) -> Result<Vec<SourceOutcome>, Error> {
        let sources: Vec<&SourceDescriptor> = sources.iter().filter(|s| s.kind == kind).collect();
        info!("{kind}: collecting {} sources", sources.len());

        let mut outcomes = Vec::with_capacity(sources.len());
        for (idx, source) in sources.iter().enumerate() {
            if idx > 0 {
                if let Some(pause) = collector.pause_between_sources() {
                    info!("{kind}: pausing {}s", pause.as_secs());
                    sleep(pause).await;
                }
            }

            let outcome = match self.collect_one(collector, source).await {
                Ok((fetched, appended)) => SourceOutcome::Collected {
                    source: source.name.clone(),
                    fetched,
                    appended,
                },
                Err(e) => {
                    error!("{kind}/{}: {e}", source.name);
                    SourceOutcome::Skipped {
                        source: source.name.clone(),
                        reason: e.to_string(),
                    }
                }
            };
            info!("{kind}/{outcome}");
            outcomes.push(outcome);
        }

        let merged = self.merge(&sources)?;
        write_records(&self.merged_path(kind), &merged)?;

        let collected = outcomes.iter().filter(|o| o.is_collected()).count();
        info!(
            "{kind}: {collected} sources collected, {} skipped, {} records merged",
            outcomes.len() - collected,
            merged.len()
        );
        Ok(outcomes)
    }

    /// Every existing checkpoint of `sources`, deduplicated on `(channel, message_id)`.
    fn merge(&self, sources: &[&SourceDescriptor]) -> Result<Vec<Record>, Error> {
        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        for source in sources {
            let path = self.checkpoint_path(source);
            if !path.exists() {
                warn!("no checkpoint for {}", source.name);
                continue;
            }
            for record in read_records(&path)? {
                let (channel, message_id) = record.key();
                if seen.insert((channel.to_string(), message_id.to_string())) {
                    merged.push(record);
                }
            }
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use super::*;

    /// Returns ids `[round, round + 3)` per call, fails for `broken`.
    struct FakeCollector {
        round: AtomicUsize,
    }

    #[async_trait]
    impl Collector for FakeCollector {
        async fn collect(
            &self,
            source: &SourceDescriptor,
            window: &TimeWindow,
            limit: usize,
        ) -> Result<Vec<Record>, Error> {
            if source.name == "broken" {
                return Err(Error::HttpStatus(403, source.name.clone()));
            }
            let round = self.round.load(Ordering::SeqCst);
            Ok((round..round + 3)
                .take(limit)
                .map(|id| {
                    Record::new(
                        id.to_string(),
                        window.start,
                        source.name.clone(),
                        source.region.clone(),
                        &format!("{} {id}", source.name),
                    )
                })
                .collect())
        }

        fn pause_between_sources(&self) -> Option<Duration> {
            Some(Duration::from_secs(10))
        }
    }

    fn sources() -> Vec<SourceDescriptor> {
        vec![
            SourceDescriptor::new(SourceKind::MessageStream, "rusembcy", "Cyprus"),
            SourceDescriptor::new(SourceKind::MessageStream, "broken", "Cyprus"),
            SourceDescriptor::new(SourceKind::Sitemap, "rt.com", "tier1_archived"),
            SourceDescriptor::new(SourceKind::MessageStream, "cy.news", "Cyprus"),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn checkpoints_and_merge() {
        let dst = tempdir().unwrap();
        let window = TimeWindow::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), None);
        let harvest = Harvest::new(dst.path(), window, 100);
        let collector = FakeCollector {
            round: AtomicUsize::new(0),
        };

        let outcomes = harvest
            .run(SourceKind::MessageStream, &collector, &sources())
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(
            outcomes[0],
            SourceOutcome::Collected {
                source: "rusembcy".to_string(),
                fetched: 3,
                appended: 3
            }
        );
        assert!(!outcomes[1].is_collected());
        assert_eq!(outcomes[2].source(), "cy.news");

        let checkpoint = dst.path().join("raw/message_stream/cy_news_raw.csv");
        assert_eq!(read_records(&checkpoint).unwrap().len(), 3);
        assert!(!dst.path().join("raw/sitemap").exists());

        // a second run only appends the new ids
        collector.round.store(2, Ordering::SeqCst);
        let outcomes = harvest
            .run(SourceKind::MessageStream, &collector, &sources())
            .await
            .unwrap();
        assert_eq!(
            outcomes[0],
            SourceOutcome::Collected {
                source: "rusembcy".to_string(),
                fetched: 3,
                appended: 2
            }
        );

        let merged = read_records(&harvest.merged_path(SourceKind::MessageStream)).unwrap();
        assert_eq!(merged.len(), 10);
        let ids: Vec<&str> = merged
            .iter()
            .filter(|r| r.channel == "rusembcy")
            .map(|r| r.message_id.as_str())
            .collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn source_limit_overrides_default() {
        let dst = tempdir().unwrap();
        let window = TimeWindow::new(Utc::now(), None);
        let harvest = Harvest::new(dst.path(), window, 100);
        let collector = FakeCollector {
            round: AtomicUsize::new(0),
        };
        let mut source = SourceDescriptor::new(SourceKind::Sitemap, "rt.com", "tier1_archived");
        source.limit = Some(1);

        let outcomes = harvest
            .run(SourceKind::Sitemap, &collector, &[source])
            .await
            .unwrap();
        assert_eq!(
            outcomes,
            vec![SourceOutcome::Collected {
                source: "rt.com".to_string(),
                fetched: 1,
                appended: 1
            }]
        );
    }
}
