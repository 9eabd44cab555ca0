/// A single item pulled from a source feed.
///
/// Every field is optional; consumers apply their own fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub summary: Option<String>,
    /// Publication date as provided by the source (RFC 822 when we parsed it)
    pub published: Option<String>,
}

impl Entry {
    /// Shorthand for an entry with only a title and link
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            link: Some(link.into()),
            ..Default::default()
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = Some(published.into());
        self
    }
}
