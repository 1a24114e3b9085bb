//! RSS item extraction.
//!
//! Items are read straight off the XML event stream rather than through a
//! general feed model, so that an item without a `<guid>` stays without an id
//! and can be rejected instead of receiving a synthesized one.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub category: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed feed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("feed XML ended with {0} unclosed elements")]
    Truncated(usize),
    #[error("feed XML has no root element")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Guid,
    Title,
    Link,
    Description,
    PubDate,
    Category,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"guid" => Some(Field::Guid),
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"description" => Some(Field::Description),
            b"pubDate" => Some(Field::PubDate),
            b"category" => Some(Field::Category),
            _ => None,
        }
    }
}

/// Text collected for one `<item>`. `None` means the element never appeared;
/// only the first occurrence of each element is captured.
#[derive(Debug, Default)]
struct RawItem {
    guid: Option<String>,
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
    category: Option<String>,
    thumbnail: Option<String>,
}

impl RawItem {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Guid => &mut self.guid,
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Description => &mut self.description,
            Field::PubDate => &mut self.pub_date,
            Field::Category => &mut self.category,
        }
    }

    fn append(&mut self, field: Field, text: &str) {
        if let Some(value) = self.slot(field) {
            value.push_str(text);
        }
    }

    fn capture_thumbnail(&mut self, element: &BytesStart<'_>) -> Result<(), quick_xml::Error> {
        if self.thumbnail.is_some() || element.local_name().as_ref() != b"thumbnail" {
            return Ok(());
        }
        if let Some(url) = element.try_get_attribute("url")? {
            self.thumbnail = Some(url.unescape_value()?.trim().to_string());
        }
        Ok(())
    }

    fn into_article(self, fallback_category: &str) -> Option<Article> {
        let id = trimmed(self.guid);
        let title = trimmed(self.title);
        if id.is_empty() || title.is_empty() {
            return None;
        }

        let category = match trimmed(self.category) {
            c if c.is_empty() => fallback_category.to_string(),
            c => c,
        };

        Some(Article {
            id,
            title,
            link: trimmed(self.link),
            description: trimmed(self.description),
            published_at: self.pub_date.as_deref().and_then(parse_pub_date),
            category,
            image_url: self.thumbnail.filter(|url| !url.is_empty()),
        })
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn text_of(text: &BytesText<'_>) -> String {
    match text.unescape() {
        Ok(unescaped) => unescaped.into_owned(),
        // HTML entities such as &nbsp; are not XML; keep the raw text.
        Err(_) => String::from_utf8_lossy(text).into_owned(),
    }
}

/// Parse an RSS `pubDate`. RFC 2822 is the norm; RFC 3339 is accepted too.
pub fn parse_pub_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Extract every admissible article from an RSS document, in feed order.
///
/// Items without a guid or without a title are dropped. A missing category
/// becomes `fallback_category`.
pub fn parse_articles(xml: &[u8], fallback_category: &str) -> Result<Vec<Article>, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut articles = Vec::new();
    let mut dropped = 0usize;

    // Elements open in the whole document
    let mut open = 0usize;
    let mut saw_root = false;

    let mut current: Option<RawItem> = None;
    // Nesting depth below the current <item>
    let mut depth = 0usize;
    // Field being captured and the depth its element opened at
    let mut capturing: Option<(Field, usize)> = None;

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match &event {
            Event::Start(_) => {
                open += 1;
                saw_root = true;
            }
            Event::Empty(_) => saw_root = true,
            Event::End(_) => open = open.saturating_sub(1),
            _ => {}
        }

        match event {
            Event::Start(e) => match current.as_mut() {
                None => {
                    if e.local_name().as_ref() == b"item" {
                        current = Some(RawItem::default());
                        depth = 0;
                        capturing = None;
                    }
                }
                Some(item) => {
                    depth += 1;
                    if capturing.is_none() {
                        if let Some(field) = Field::from_local_name(e.local_name().as_ref()) {
                            let slot = item.slot(field);
                            if slot.is_none() {
                                *slot = Some(String::new());
                                capturing = Some((field, depth));
                            }
                        }
                    }
                    item.capture_thumbnail(&e)?;
                }
            },
            Event::Empty(e) => {
                if let Some(item) = current.as_mut() {
                    item.capture_thumbnail(&e)?;
                }
            }
            Event::Text(e) => {
                if let (Some(item), Some((field, _))) = (current.as_mut(), capturing) {
                    item.append(field, &text_of(&e));
                }
            }
            Event::CData(e) => {
                if let (Some(item), Some((field, _))) = (current.as_mut(), capturing) {
                    item.append(field, &String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if current.is_some() {
                    if depth == 0 {
                        if let Some(item) = current.take() {
                            match item.into_article(fallback_category) {
                                Some(article) => articles.push(article),
                                None => dropped += 1,
                            }
                        }
                    } else {
                        if matches!(capturing, Some((_, d)) if d == depth) {
                            capturing = None;
                        }
                        depth -= 1;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if open > 0 {
        return Err(ParseError::Truncated(open));
    }
    if !saw_root {
        return Err(ParseError::Empty);
    }

    if dropped > 0 {
        debug!("Dropped {} feed items without id or title", dropped);
    }

    Ok(articles)
}
