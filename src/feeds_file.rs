use std::fs;
use std::path::Path;

use crate::error::MergeError;

/// Read the feed list: one URL per line.
///
/// Blank lines and `#` comments are skipped.
pub fn load_feed_urls(path: &Path) -> Result<Vec<String>, MergeError> {
    let contents = fs::read_to_string(path).map_err(|source| MergeError::Input {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_feed_urls(&contents))
}

pub fn parse_feed_urls(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
