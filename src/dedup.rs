use std::collections::HashSet;

use crate::entry::Entry;
use crate::fingerprint::Fingerprint;

/// Fingerprints already emitted during one merge run.
///
/// Owned by the caller and threaded through [`SeenSet::filter`], so nothing
/// leaks from one run into the next.
#[derive(Debug, Default, Clone)]
pub struct SeenSet {
    seen: HashSet<Fingerprint>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn contains(&self, fp: &Fingerprint) -> bool {
        self.seen.contains(fp)
    }

    /// Keep the first entry for each fingerprint, in input order.
    ///
    /// Returns the surviving entries and the updated set.
    pub fn filter(mut self, entries: Vec<Entry>) -> (Vec<Entry>, SeenSet) {
        let total = entries.len();

        let unique: Vec<Entry> = entries
            .into_iter()
            .filter(|entry| self.seen.insert(Fingerprint::of(entry)))
            .collect();

        tracing::debug!(
            total = total,
            unique = unique.len(),
            dropped = total - unique.len(),
            "Deduplicated entries"
        );

        (unique, self)
    }
}

/// Deduplicate one batch against an empty [`SeenSet`]
pub fn deduplicate(entries: Vec<Entry>) -> Vec<Entry> {
    SeenSet::new().filter(entries).0
}
