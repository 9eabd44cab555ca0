use std::path::PathBuf;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::rss::RenderError;

/// Fatal errors for one merge run
#[derive(Debug, Error)]
pub enum MergeError {
    /// The feed list could not be read
    #[error("Failed to read feed list '{}': {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A feed could not be fetched or parsed (abort policy only)
    #[error("Failed to fetch '{url}': {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Render(#[from] RenderError),

    /// The merged document could not be written
    #[error("Failed to write merged feed to '{}': {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
