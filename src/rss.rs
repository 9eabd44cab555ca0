//! RSS 2.0 rendering for the merged channel.
//!
//! Titles and descriptions go out as CDATA, everything else as escaped text.
//! The build time comes from a [`Clock`] so rendering is reproducible in tests.

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

use crate::entry::Entry;

/// `Mon, 02 Jan 2006 15:04:05 GMT`
pub const RFC822_GMT: &str = "%a, %d %b %Y %H:%M:%S GMT";

const NO_TITLE: &str = "No title";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to write RSS document: {0}")]
    Xml(String),
    #[error("RSS document is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Source of the channel build time
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Channel-level metadata written ahead of the items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMeta {
    pub title: String,
    pub link: String,
    pub description: String,
}

impl Default for ChannelMeta {
    fn default() -> Self {
        Self {
            title: "Combined Feed".to_string(),
            link: "https://example.com/merged.xml".to_string(),
            description: "Merged feed from multiple sources".to_string(),
        }
    }
}

pub fn format_rfc822(dt: DateTime<Utc>) -> String {
    dt.format(RFC822_GMT).to_string()
}

/// Render `entries` as a complete RSS 2.0 document built at `now`.
pub fn render(
    entries: &[Entry],
    meta: &ChannelMeta,
    now: DateTime<Utc>,
) -> Result<String, RenderError> {
    let build_date = format_rfc822(now);
    let mut w = Writer::new_with_indent(Vec::new(), b' ', 2);

    emit(&mut w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    emit(&mut w, Event::Start(rss))?;
    emit(&mut w, Event::Start(BytesStart::new("channel")))?;

    write_text_element(&mut w, "title", &meta.title)?;
    write_text_element(&mut w, "link", &meta.link)?;
    write_text_element(&mut w, "description", &meta.description)?;
    write_text_element(&mut w, "lastBuildDate", &build_date)?;

    for entry in entries {
        emit(&mut w, Event::Start(BytesStart::new("item")))?;
        write_cdata_element(&mut w, "title", entry.title.as_deref().unwrap_or(NO_TITLE))?;
        write_text_element(&mut w, "link", entry.link.as_deref().unwrap_or(""))?;
        write_text_element(
            &mut w,
            "pubDate",
            entry.published.as_deref().unwrap_or(&build_date),
        )?;
        write_cdata_element(&mut w, "description", entry.summary.as_deref().unwrap_or(""))?;
        emit(&mut w, Event::End(BytesEnd::new("item")))?;
    }

    emit(&mut w, Event::End(BytesEnd::new("channel")))?;
    emit(&mut w, Event::End(BytesEnd::new("rss")))?;

    Ok(String::from_utf8(w.into_inner())?)
}

/// Render with the build time taken from `clock`
pub fn render_with_clock(
    entries: &[Entry],
    meta: &ChannelMeta,
    clock: &impl Clock,
) -> Result<String, RenderError> {
    render(entries, meta, clock.now())
}

fn emit(w: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), RenderError> {
    w.write_event(event)
        .map_err(|e| RenderError::Xml(e.to_string()))
}

fn write_text_element(
    w: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), RenderError> {
    let text = strip_invalid_chars(text);
    emit(w, Event::Start(BytesStart::new(name)))?;
    emit(w, Event::Text(BytesText::new(&text)))?;
    emit(w, Event::End(BytesEnd::new(name)))
}

fn write_cdata_element(
    w: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), RenderError> {
    let text = strip_invalid_chars(text);
    emit(w, Event::Start(BytesStart::new(name)))?;
    for section in cdata_sections(&text) {
        emit(w, Event::CData(BytesCData::new(section)))?;
    }
    emit(w, Event::End(BytesEnd::new(name)))
}

/// Split `text` so no section contains `]]>`.
///
/// `a]]>b` becomes `a]]` and `>b`, which readers join back together.
fn cdata_sections(text: &str) -> Vec<String> {
    let parts: Vec<&str> = text.split("]]>").collect();
    let last = parts.len() - 1;

    parts
        .iter()
        .enumerate()
        .map(|(i, part)| {
            let mut section = String::with_capacity(part.len() + 3);
            if i > 0 {
                section.push('>');
            }
            section.push_str(part);
            if i < last {
                section.push_str("]]");
            }
            section
        })
        .collect()
}

/// Drop characters XML 1.0 does not allow (C0 controls other than tab, LF, CR).
fn strip_invalid_chars(input: &str) -> String {
    input
        .chars()
        .filter(|&c| {
            matches!(c, '\t' | '\n' | '\r')
                || (c >= '\u{20}' && c != '\u{FFFE}' && c != '\u{FFFF}')
        })
        .collect()
}
