// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 The blog2md contributors

//! XML parsing for blog export archives.
//!
//! This module reads an export document into a loosely-typed list of
//! [`RawEntry`] records. Two export dialects are understood:
//!
//! - **Blogger** Atom exports: a `<feed>` root with one `<entry>` per post
//!   (comments, settings and templates are entries too).
//! - **WordPress** WXR exports: an `<rss>` root whose `<channel>` holds one
//!   `<item>` per post.
//!
//! Entries are kept close to the document shape. Text fields are
//! [`TextValue`]s, which remember whether the element was a bare string or
//! carried attributes, and dates are passed through untouched.
//!
//! # Example
//!
//! ```
//! use blog2md::feed::{Mode, parse_feed};
//!
//! let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
//!     <entry>
//!         <title type="text">Hello</title>
//!         <published>2020-01-01</published>
//!         <category term="tech"/>
//!     </entry>
//! </feed>"#;
//!
//! let entries = parse_feed(xml, Mode::Blogger).unwrap();
//! assert_eq!(entries.len(), 1);
//! assert_eq!(entries[0].title.as_ref().and_then(|t| t.resolve()), Some("Hello"));
//! ```

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use snafu::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Category scheme Blogger uses to mark what kind of entry a record is.
pub const BLOGGER_KIND_SCHEME: &str = "http://schemas.google.com/g/2005#kind";

/// Error type for export parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// The document is not well-formed XML.
    #[snafu(display("failed to parse XML: {source}"))]
    Xml {
        /// The underlying XML error.
        source: quick_xml::Error,
    },

    /// The document contains no root element.
    #[snafu(display("document has no root element"))]
    EmptyDocument,

    /// The document ended while an element was still open.
    #[snafu(display("document ended inside <{name}>"))]
    Unclosed {
        /// Name of the innermost open element.
        name: String,
    },

    /// The root element does not match the selected export dialect.
    #[snafu(display("expected <{expected}> root element for {mode} export, found <{found}>"))]
    UnexpectedRoot {
        /// The dialect the document was parsed as.
        mode: Mode,
        /// The root element that dialect requires.
        expected: &'static str,
        /// The root element actually found.
        found: String,
    },

    /// A WordPress export has no `<channel>` element.
    #[snafu(display("WordPress export has no <channel> element"))]
    MissingChannel,
}

/// The export dialect of the input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Blogger Atom export (`feed/entry`).
    Blogger,
    /// WordPress WXR export (`rss/channel/item`).
    WordPress,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b" | "blogger" => Ok(Self::Blogger),
            "w" | "wordpress" => Ok(Self::WordPress),
            other => Err(format!(
                "unknown mode '{other}' (expected b, blogger, w or wordpress)"
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Blogger => "Blogger",
            Self::WordPress => "WordPress",
        })
    }
}

/// A text field as it appeared in the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextValue {
    /// An element with neither attributes nor child elements.
    Plain(String),

    /// An element carrying attributes or child elements.
    Wrapped {
        /// The element's character data, if it had any.
        text: Option<String>,
        /// The element's attributes.
        attributes: BTreeMap<String, String>,
    },
}

impl TextValue {
    /// Returns the text payload, or `None` when the value carries no text.
    #[must_use]
    pub fn resolve(&self) -> Option<&str> {
        match self {
            Self::Plain(text) => Some(text),
            Self::Wrapped { text, .. } => text.as_deref(),
        }
    }
}

/// A category (tag) attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Category {
    /// The tag text. Missing when the export omitted it.
    pub term: Option<String>,
    /// The categorization scheme, if any.
    pub scheme: Option<String>,
}

impl Category {
    /// Creates a category with only a term.
    #[must_use]
    pub fn term(term: impl Into<String>) -> Self {
        Self {
            term: Some(term.into()),
            scheme: None,
        }
    }
}

/// One post record as read from the export, before normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawEntry {
    /// The entry title.
    pub title: Option<TextValue>,
    /// The entry body as HTML.
    pub content: Option<TextValue>,
    /// Every publication timestamp found, in document order.
    pub published: Vec<String>,
    /// Every update timestamp found, in document order.
    pub updated: Vec<String>,
    /// The entry's categories, in document order.
    pub category: Vec<Category>,
}

impl RawEntry {
    /// Returns `true` for Blogger comment entries.
    #[must_use]
    pub fn is_comment(&self) -> bool {
        self.category.iter().any(|c| {
            c.scheme.as_deref() == Some(BLOGGER_KIND_SCHEME)
                && c.term.as_deref().is_some_and(|t| t.ends_with("#comment"))
        })
    }
}

/// A generic XML element, the intermediate shape between the document and
/// [`RawEntry`].
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: BTreeMap<String, String>,
    text: String,
    children: Vec<Self>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, ParseError> {
        let mut attributes = BTreeMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from).context(XmlSnafu)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value().context(XmlSnafu)?.into_owned();
            attributes.insert(key, value);
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    /// The element name without its namespace prefix.
    fn local_name(&self) -> &str {
        self.name
            .rsplit_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    fn first_local(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.local_name() == name)
    }

    fn all_local<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.local_name() == name)
    }

    fn first_named(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.name == name)
    }

    fn all_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn to_text_value(&self) -> TextValue {
        if self.attributes.is_empty() && self.children.is_empty() {
            return TextValue::Plain(self.text.clone());
        }
        TextValue::Wrapped {
            text: (!self.text.is_empty()).then(|| self.text.clone()),
            attributes: self.attributes.clone(),
        }
    }
}

/// Reads the whole document into an element tree and returns its root.
fn parse_tree(xml: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().context(XmlSnafu)? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                // quick-xml rejects mismatched end tags, so the stack is never empty here
                if let Some(mut element) = stack.pop() {
                    if !element.children.is_empty() {
                        element.text = element.text.trim().to_owned();
                    }
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text.unescape().context(XmlSnafu)?);
                }
            }
            Event::CData(data) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return UnclosedSnafu { name: open.name }.fail();
    }
    root.context(EmptyDocumentSnafu)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {}
    }
}

fn text_of(element: &Element) -> String {
    element.text.trim().to_owned()
}

fn blogger_entry(entry: &Element) -> RawEntry {
    RawEntry {
        title: entry.first_local("title").map(Element::to_text_value),
        content: entry.first_local("content").map(Element::to_text_value),
        published: entry.all_local("published").map(text_of).collect(),
        updated: entry.all_local("updated").map(text_of).collect(),
        category: entry
            .all_local("category")
            .map(|c| Category {
                term: c.attributes.get("term").cloned(),
                scheme: c.attributes.get("scheme").cloned(),
            })
            .collect(),
    }
}

/// WXR post types that hold written content.
const WORDPRESS_POST_TYPES: &[&str] = &["post", "page"];

/// Returns `false` for attachments, menu items and other non-content records.
/// Items without a `wp:post_type` are kept.
fn is_wordpress_post(item: &Element) -> bool {
    let Some(post_type) = item.first_named("wp:post_type").map(text_of) else {
        return true;
    };
    if WORDPRESS_POST_TYPES.contains(&post_type.as_str()) {
        return true;
    }
    debug!(post_type = %post_type, "skipping WordPress item");
    false
}

fn wordpress_item(item: &Element) -> RawEntry {
    let mut published: Vec<String> = item.all_named("wp:post_date").map(text_of).collect();
    if published.is_empty() {
        published = item.all_named("pubDate").map(text_of).collect();
    }

    RawEntry {
        title: item.first_named("title").map(Element::to_text_value),
        content: item.first_named("content:encoded").map(Element::to_text_value),
        published,
        updated: item.all_named("wp:post_modified").map(text_of).collect(),
        category: item
            .all_named("category")
            .map(|c| {
                let term = text_of(c);
                Category {
                    term: (!term.is_empty()).then_some(term),
                    scheme: c.attributes.get("domain").cloned(),
                }
            })
            .collect(),
    }
}

/// Parses an export document into its entries, in document order.
///
/// # Errors
///
/// Returns an error if the document is not well-formed XML or its root
/// element does not match `mode`. A well-formed export without entries
/// yields an empty vector.
pub fn parse_feed(xml: &str, mode: Mode) -> Result<Vec<RawEntry>, ParseError> {
    let root = parse_tree(xml)?;

    match mode {
        Mode::Blogger => {
            ensure!(
                root.local_name() == "feed",
                UnexpectedRootSnafu {
                    mode,
                    expected: "feed",
                    found: root.name.clone(),
                }
            );
            Ok(root.all_local("entry").map(blogger_entry).collect())
        }
        Mode::WordPress => {
            ensure!(
                root.local_name() == "rss",
                UnexpectedRootSnafu {
                    mode,
                    expected: "rss",
                    found: root.name.clone(),
                }
            );
            let channel = root.first_local("channel").context(MissingChannelSnafu)?;
            Ok(channel
                .all_local("item")
                .filter(|item| is_wordpress_post(item))
                .map(wordpress_item)
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(entries: &str) -> String {
        format!(
            r#"<?xml version='1.0' encoding='UTF-8'?>
            <feed xmlns='http://www.w3.org/2005/Atom' xmlns:thr='http://purl.org/syndication/thread/1.0'>
                <id>tag:blogger.com,1999:blog-1</id>
                <title type='text'>My Blog</title>
                {entries}
            </feed>"#
        )
    }

    #[test]
    fn parses_blogger_entry() {
        let xml = atom(
            r"<entry>
                <published>2020-01-01T10:00:00.000-03:00</published>
                <updated>2020-01-02T10:00:00.000-03:00</updated>
                <category scheme='http://www.blogger.com/atom/ns#' term='tech'/>
                <category scheme='http://www.blogger.com/atom/ns#' term='rust'/>
                <title type='text'>Hello World</title>
                <content type='html'>&lt;p&gt;Hi &amp;amp; bye&lt;/p&gt;</content>
            </entry>",
        );
        let entries = parse_feed(&xml, Mode::Blogger).unwrap();

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(
            entry.title.as_ref().and_then(TextValue::resolve),
            Some("Hello World")
        );
        assert_eq!(
            entry.content.as_ref().and_then(TextValue::resolve),
            Some("<p>Hi &amp; bye</p>")
        );
        assert_eq!(entry.published, vec!["2020-01-01T10:00:00.000-03:00"]);
        assert_eq!(entry.updated, vec!["2020-01-02T10:00:00.000-03:00"]);
        let terms: Vec<_> = entry
            .category
            .iter()
            .map(|c| c.term.as_deref().unwrap())
            .collect();
        assert_eq!(terms, ["tech", "rust"]);
    }

    #[test]
    fn title_without_attributes_is_plain() {
        let xml = atom("<entry><title>Bare</title></entry>");
        let entries = parse_feed(&xml, Mode::Blogger).unwrap();

        assert_eq!(
            entries[0].title,
            Some(TextValue::Plain("Bare".into()))
        );
    }

    #[test]
    fn empty_title_with_attributes_has_no_payload() {
        let xml = atom("<entry><title type='text'></title></entry>");
        let entries = parse_feed(&xml, Mode::Blogger).unwrap();

        match &entries[0].title {
            Some(value @ TextValue::Wrapped { attributes, .. }) => {
                assert_eq!(attributes.get("type").map(String::as_str), Some("text"));
                assert!(value.resolve().is_none());
            }
            other => panic!("Expected Wrapped title, got {other:?}"),
        }
    }

    #[test]
    fn missing_fields_are_absent() {
        let xml = atom("<entry><id>1</id></entry>");
        let entries = parse_feed(&xml, Mode::Blogger).unwrap();

        assert_eq!(entries[0], RawEntry::default());
    }

    #[test]
    fn reads_cdata_content() {
        let xml = atom("<entry><content type='html'><![CDATA[<b>bold</b>]]></content></entry>");
        let entries = parse_feed(&xml, Mode::Blogger).unwrap();

        assert_eq!(
            entries[0].content.as_ref().and_then(TextValue::resolve),
            Some("<b>bold</b>")
        );
    }

    #[test]
    fn keeps_entry_order() {
        let xml = atom(
            "<entry><title>First</title></entry>
             <entry><title>Second</title></entry>
             <entry><title>Third</title></entry>",
        );
        let entries = parse_feed(&xml, Mode::Blogger).unwrap();

        let titles: Vec<_> = entries
            .iter()
            .filter_map(|e| e.title.as_ref()?.resolve())
            .collect();
        assert_eq!(titles, ["First", "Second", "Third"]);
    }

    #[test]
    fn feed_without_entries_is_empty() {
        let entries = parse_feed(&atom(""), Mode::Blogger).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn detects_blogger_comments() {
        let xml = atom(
            "<entry>
                <category scheme='http://schemas.google.com/g/2005#kind'
                          term='http://schemas.google.com/blogger/2008/kind#comment'/>
            </entry>
            <entry>
                <category scheme='http://schemas.google.com/g/2005#kind'
                          term='http://schemas.google.com/blogger/2008/kind#post'/>
            </entry>",
        );
        let entries = parse_feed(&xml, Mode::Blogger).unwrap();

        assert!(entries[0].is_comment());
        assert!(!entries[1].is_comment());
    }

    #[test]
    fn comment_term_needs_kind_scheme() {
        let entry = RawEntry {
            category: vec![Category::term("something#comment")],
            ..RawEntry::default()
        };
        assert!(!entry.is_comment());
    }

    #[test]
    fn parses_wordpress_item() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <rss version="2.0"
                 xmlns:content="http://purl.org/rss/1.0/modules/content/"
                 xmlns:wp="http://wordpress.org/export/1.2/">
                <channel>
                    <title>My Blog</title>
                    <item>
                        <title>Hello WordPress</title>
                        <pubDate>Wed, 01 Jan 2020 10:00:00 +0000</pubDate>
                        <category domain="category" nicename="news"><![CDATA[News]]></category>
                        <category domain="post_tag" nicename="rust"><![CDATA[Rust]]></category>
                        <content:encoded><![CDATA[<p>Body</p>]]></content:encoded>
                        <wp:post_date><![CDATA[2020-01-01 10:00:00]]></wp:post_date>
                        <wp:post_modified><![CDATA[2020-01-03 12:00:00]]></wp:post_modified>
                    </item>
                </channel>
            </rss>"#;
        let entries = parse_feed(xml, Mode::WordPress).unwrap();

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(
            entry.title,
            Some(TextValue::Plain("Hello WordPress".into()))
        );
        assert_eq!(
            entry.content.as_ref().and_then(TextValue::resolve),
            Some("<p>Body</p>")
        );
        assert_eq!(entry.published, vec!["2020-01-01 10:00:00"]);
        assert_eq!(entry.updated, vec!["2020-01-03 12:00:00"]);
        assert_eq!(entry.category[0].term.as_deref(), Some("News"));
        assert_eq!(entry.category[1].scheme.as_deref(), Some("post_tag"));
    }

    #[test]
    fn wordpress_falls_back_to_pub_date() {
        let xml = "<rss><channel><item>
                <title>T</title>
                <pubDate>Wed, 01 Jan 2020 10:00:00 +0000</pubDate>
            </item></channel></rss>";
        let entries = parse_feed(xml, Mode::WordPress).unwrap();

        assert_eq!(entries[0].published, vec!["Wed, 01 Jan 2020 10:00:00 +0000"]);
    }

    #[test]
    fn rejects_wrong_root_for_mode() {
        let err = parse_feed(&atom(""), Mode::WordPress).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedRoot { expected: "rss", .. }));

        let err = parse_feed("<rss><channel/></rss>", Mode::Blogger).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedRoot { expected: "feed", .. }));
    }

    #[test]
    fn rejects_wordpress_without_channel() {
        let err = parse_feed("<rss version='2.0'/>", Mode::WordPress).unwrap_err();
        assert!(matches!(err, ParseError::MissingChannel));
    }

    #[test]
    fn rejects_malformed_xml() {
        let err = parse_feed("<feed><entry></feed>", Mode::Blogger).unwrap_err();
        assert!(matches!(err, ParseError::Xml { .. }));
    }

    #[test]
    fn rejects_truncated_document() {
        let err = parse_feed("<feed><entry>", Mode::Blogger).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Unclosed { .. } | ParseError::Xml { .. }
        ));
    }

    #[test]
    fn rejects_empty_document() {
        let err = parse_feed("", Mode::Blogger).unwrap_err();
        assert!(matches!(err, ParseError::EmptyDocument));
    }

    #[test]
    fn skips_wordpress_non_content_items() {
        let xml = r#"<rss xmlns:wp="http://wordpress.org/export/1.2/"><channel>
                <item>
                    <title>A Post</title>
                    <wp:post_type><![CDATA[post]]></wp:post_type>
                </item>
                <item>
                    <title>photo.jpg</title>
                    <wp:post_type><![CDATA[attachment]]></wp:post_type>
                </item>
                <item>
                    <title>About</title>
                    <wp:post_type><![CDATA[page]]></wp:post_type>
                </item>
                <item>
                    <title>Home</title>
                    <wp:post_type><![CDATA[nav_menu_item]]></wp:post_type>
                </item>
                <item>
                    <title>Untyped</title>
                </item>
            </channel></rss>"#;
        let entries = parse_feed(xml, Mode::WordPress).unwrap();

        let titles: Vec<_> = entries
            .iter()
            .filter_map(|e| e.title.as_ref()?.resolve())
            .collect();
        assert_eq!(titles, ["A Post", "About", "Untyped"]);
    }

    #[test]
    fn parses_mode_names() {
        assert_eq!("b".parse::<Mode>(), Ok(Mode::Blogger));
        assert_eq!("blogger".parse::<Mode>(), Ok(Mode::Blogger));
        assert_eq!("w".parse::<Mode>(), Ok(Mode::WordPress));
        assert_eq!("wordpress".parse::<Mode>(), Ok(Mode::WordPress));
        assert!("x".parse::<Mode>().is_err());
    }
}
