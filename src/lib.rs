//! Merge several RSS/Atom feeds into a single deduplicated RSS 2.0 feed.
//!
//! Entries are identified by a fingerprint of their normalized link and
//! title; the first occurrence across the feed list wins.
//!
//! ```ignore
//! use rss_merge::{FileSink, HttpSource, Pipeline};
//!
//! let source = HttpSource::new("rss-merge", Duration::from_secs(10))?;
//! let report = Pipeline::new(source, FileSink::new("output/merged.xml"))
//!     .run(&urls)
//!     .await?;
//! ```

pub mod config;
pub mod dedup;
pub mod entry;
pub mod error;
pub mod feeds_file;
pub mod fetch;
pub mod fingerprint;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod rss;

pub use config::{Config, FailurePolicy};
pub use dedup::{SeenSet, deduplicate};
pub use entry::Entry;
pub use error::MergeError;
pub use fetch::{FeedSource, FetchError, HttpSource};
pub use fingerprint::Fingerprint;
pub use normalize::normalize_link;
pub use output::{FeedSink, FileSink, MemorySink};
pub use pipeline::{Pipeline, RunReport};
pub use rss::{ChannelMeta, Clock, FixedClock, SystemClock};
