//! Fetch → deduplicate → render → write, for one run.
//!
//! Feeds are fetched with at most `concurrency` requests in flight. Results
//! are always consumed in feed-list order, so the merged output does not
//! depend on which server answers first.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::pin::pin;

use crate::config::{Config, FailurePolicy};
use crate::dedup::SeenSet;
use crate::entry::Entry;
use crate::error::MergeError;
use crate::fetch::FeedSource;
use crate::output::FeedSink;
use crate::rss::{self, ChannelMeta, Clock, SystemClock};

/// A feed that was skipped under [`FailurePolicy::Skip`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFeed {
    pub url: String,
    pub error: String,
}

/// Counts for one completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Feed URLs attempted
    pub feeds: usize,
    /// Entries fetched across all feeds, duplicates included
    pub fetched: usize,
    /// Entries written after deduplication
    pub unique: usize,
    pub failed: Vec<FailedFeed>,
}

impl RunReport {
    pub fn skipped(&self) -> usize {
        self.failed.len()
    }
}

pub struct Pipeline<S, K, C = SystemClock> {
    source: S,
    sink: K,
    clock: C,
    channel: ChannelMeta,
    concurrency: usize,
    on_fetch_error: FailurePolicy,
}

impl<S: FeedSource, K: FeedSink> Pipeline<S, K> {
    /// Sequential, abort-on-error pipeline with default channel metadata
    pub fn new(source: S, sink: K) -> Self {
        Pipeline {
            source,
            sink,
            clock: SystemClock,
            channel: ChannelMeta::default(),
            concurrency: 1,
            on_fetch_error: FailurePolicy::Abort,
        }
    }

    /// Pipeline configured from `cfg`
    pub fn from_config(source: S, sink: K, cfg: &Config) -> Self {
        Pipeline::new(source, sink)
            .channel(cfg.channel.clone())
            .concurrency(cfg.concurrency)
            .on_fetch_error(cfg.on_fetch_error)
    }
}

impl<S, K, C> Pipeline<S, K, C> {
    pub fn channel(mut self, channel: ChannelMeta) -> Self {
        self.channel = channel;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn on_fetch_error(mut self, policy: FailurePolicy) -> Self {
        self.on_fetch_error = policy;
        self
    }

    pub fn clock<C2: Clock>(self, clock: C2) -> Pipeline<S, K, C2> {
        Pipeline {
            source: self.source,
            sink: self.sink,
            clock,
            channel: self.channel,
            concurrency: self.concurrency,
            on_fetch_error: self.on_fetch_error,
        }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}

impl<S: FeedSource, K: FeedSink, C: Clock> Pipeline<S, K, C> {
    /// Merge `urls` into one document and hand it to the sink.
    ///
    /// Nothing is written if the run fails.
    pub async fn run(&self, urls: &[String]) -> Result<RunReport, MergeError> {
        let (entries, failed) = self.fetch_all(urls).await?;
        let fetched = entries.len();
        tracing::info!(fetched = fetched, "Fetched entries");

        let (unique, _seen) = SeenSet::new().filter(entries);
        tracing::info!(unique = unique.len(), "Unique entries after deduplication");

        let document = rss::render_with_clock(&unique, &self.channel, &self.clock)?;
        self.sink.write(&document)?;

        Ok(RunReport {
            feeds: urls.len(),
            fetched,
            unique: unique.len(),
            failed,
        })
    }

    /// Fetch every feed and concatenate the entries in feed-list order
    async fn fetch_all(&self, urls: &[String]) -> Result<(Vec<Entry>, Vec<FailedFeed>), MergeError> {
        let mut results = pin!(
            stream::iter(urls)
                .map(|url| async move {
                    tracing::info!(url = %url, "Fetching feed");
                    (url, self.source.fetch(url).await)
                })
                .buffered(self.concurrency)
        );

        let mut entries = Vec::new();
        let mut failed = Vec::new();

        while let Some((url, result)) = results.next().await {
            match result {
                Ok(mut batch) => {
                    tracing::debug!(url = %url, entries = batch.len(), "Fetched feed");
                    entries.append(&mut batch);
                }
                Err(source) => match self.on_fetch_error {
                    FailurePolicy::Abort => {
                        return Err(MergeError::Fetch {
                            url: url.clone(),
                            source,
                        });
                    }
                    FailurePolicy::Skip => {
                        tracing::warn!(url = %url, error = %source, "Skipping feed");
                        failed.push(FailedFeed {
                            url: url.clone(),
                            error: source.to_string(),
                        });
                    }
                },
            }
        }

        Ok((entries, failed))
    }
}
