use sha2::{Digest, Sha256};
use std::fmt;

use crate::entry::Entry;
use crate::normalize::normalize_link;

/// Identity of an entry for deduplication: a hex SHA-256 digest of
/// `"{normalized link}-{normalized title}"`.
///
/// Summary and publish date are deliberately not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn of(entry: &Entry) -> Self {
        let link = normalize_link(entry.link.as_deref().unwrap_or(""));
        let title = entry
            .title
            .as_deref()
            .unwrap_or("")
            .to_lowercase()
            .trim()
            .to_string();

        let hash = Sha256::digest(format!("{link}-{title}").as_bytes());
        Fingerprint(format!("{:x}", hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
