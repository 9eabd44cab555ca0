use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use feed_rs::model::Link;
use feed_rs::parser;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::entry::Entry;
use crate::rss::format_rfc822;

/// Why a single feed could not be turned into entries
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out")]
    Timeout,
    /// Body could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Anything that turns a feed URL into its entries, in feed order
pub trait FeedSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<Entry>, FetchError>>;
}

/// Fetches feeds over HTTP and parses them with `feed-rs`
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl FeedSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Vec<Entry>, FetchError> {
        let resp = self.client.get(url).send().await.map_err(classify)?;
        if !resp.status().is_success() {
            return Err(FetchError::HttpStatus(resp.status().as_u16()));
        }

        let bytes = resp.bytes().await.map_err(classify)?;
        let entries = parse_entries(&bytes)?;
        tracing::debug!(url = %url, entries = entries.len(), "Parsed feed");
        Ok(entries)
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err)
    }
}

/// Parse an RSS or Atom document into entries
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<Entry>, FetchError> {
    let feed = parser::Builder::new()
        .timestamp_parser(parse_loose_timestamp)
        .build()
        .parse(bytes)
        .map_err(|e| FetchError::Parse(e.to_string()))?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let summary = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body));

            Entry {
                title: entry.title.map(|t| t.content),
                link: entry_link(&entry.links),
                summary,
                published: entry.published.map(format_rfc822),
            }
        })
        .collect();

    Ok(entries)
}

/// The entry's page: the first `alternate` (or rel-less) link, else the first link.
///
/// Atom feeds often list `replies`, `edit` or `self` links ahead of it.
fn entry_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
}

/// Dates feeds commonly publish outside RFC 822 / RFC 3339.
///
/// Anything still unparsed ends up without a date and gets the build time.
fn parse_loose_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Site</title>
  <link>https://site.com</link>
  <description>d</description>
  <item>
    <title>Post A</title>
    <link>https://site.com/a</link>
    <description>About A</description>
    <pubDate>Mon, 02 Jan 2006 15:04:05 GMT</pubDate>
  </item>
  <item>
    <link>https://site.com/b</link>
    <description>Only B</description>
  </item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Site</title>
  <id>urn:site</id>
  <updated>2006-01-02T15:04:05Z</updated>
  <entry>
    <title>Atom Post</title>
    <id>urn:site:1</id>
    <link href="https://site.com/atom-1"/>
    <updated>2006-01-02T15:04:05Z</updated>
    <content type="html">Body only</content>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items_in_order() {
        let entries = parse_entries(RSS.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].title.as_deref(), Some("Post A"));
        assert_eq!(entries[0].link.as_deref(), Some("https://site.com/a"));
        assert_eq!(entries[0].summary.as_deref(), Some("About A"));
        assert_eq!(
            entries[0].published.as_deref(),
            Some("Mon, 02 Jan 2006 15:04:05 GMT")
        );

        assert_eq!(entries[1].title, None);
        assert_eq!(entries[1].link.as_deref(), Some("https://site.com/b"));
        assert_eq!(entries[1].summary.as_deref(), Some("Only B"));
        assert_eq!(entries[1].published, None);
    }

    #[test]
    fn atom_content_fills_missing_summary() {
        let entries = parse_entries(ATOM.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title.as_deref(), Some("Atom Post"));
        assert_eq!(entries[0].link.as_deref(), Some("https://site.com/atom-1"));
        assert_eq!(entries[0].summary.as_deref(), Some("Body only"));
    }

    #[test]
    fn atom_prefers_alternate_link() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Blog</title>
  <id>urn:blog</id>
  <updated>2024-01-10T00:00:00Z</updated>
  <entry>
    <title>Post</title>
    <id>urn:blog:1</id>
    <updated>2024-01-10T00:00:00Z</updated>
    <link rel="replies" type="application/atom+xml" href="https://blog.example/feeds/1/comments"/>
    <link rel="edit" type="application/atom+xml" href="https://blog.example/feeds/posts/1"/>
    <link rel="alternate" type="text/html" href="https://blog.example/2024/01/post.html"/>
  </entry>
  <entry>
    <title>Only replies</title>
    <id>urn:blog:2</id>
    <updated>2024-01-10T00:00:00Z</updated>
    <link rel="replies" href="https://blog.example/feeds/2/comments"/>
  </entry>
</feed>"#;
        let entries = parse_entries(atom.as_bytes()).unwrap();
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://blog.example/2024/01/post.html")
        );
        assert_eq!(
            entries[1].link.as_deref(),
            Some("https://blog.example/feeds/2/comments")
        );
    }

    #[test]
    fn loose_dates_are_recovered() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Site</title><link>https://site.com/</link><description>d</description>
  <item><title>A</title><link>https://site.com/a</link><pubDate>March 5, 2024</pubDate></item>
  <item><title>B</title><link>https://site.com/b</link><pubDate>sometime soon</pubDate></item>
</channel></rss>"#;
        let entries = parse_entries(rss.as_bytes()).unwrap();
        assert_eq!(
            entries[0].published.as_deref(),
            Some("Tue, 05 Mar 2024 00:00:00 GMT")
        );
        assert_eq!(entries[1].published, None);
    }

    #[test]
    fn loose_timestamp_formats() {
        let expect = |text: &str, rfc822: &str| {
            assert_eq!(
                parse_loose_timestamp(text).map(format_rfc822).as_deref(),
                Some(rfc822),
                "{text}"
            );
        };
        expect("Mon, 02 Jan 2006 15:04:05 GMT", "Mon, 02 Jan 2006 15:04:05 GMT");
        expect("2006-01-02T17:04:05+02:00", "Mon, 02 Jan 2006 15:04:05 GMT");
        expect("2006-01-02 15:04:05", "Mon, 02 Jan 2006 15:04:05 GMT");
        expect("2006-01-02", "Mon, 02 Jan 2006 00:00:00 GMT");
        expect("Jan 02, 2006", "Mon, 02 Jan 2006 00:00:00 GMT");
        assert_eq!(parse_loose_timestamp("not a date"), None);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_entries(b"definitely not xml").unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn http_source_fetches_and_parses() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&mock_server)
            .await;

        let source = HttpSource::new("rss-merge-test", Duration::from_secs(5)).unwrap();
        let entries = source
            .fetch(&format!("{}/feed.xml", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn http_status_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let source = HttpSource::new("rss-merge-test", Duration::from_secs(5)).unwrap();
        let err = source.fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(404)));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(RSS)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let source = HttpSource::new("rss-merge-test", Duration::from_millis(50)).unwrap();
        let err = source.fetch(&mock_server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout));
    }
}
