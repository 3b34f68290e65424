//! Item payloads: links and raw markup.
//!
//! A [`ContentNode`] is what an item shows. Links take part in URL prefixing
//! and active-state matching; raw markup is emitted verbatim and never does.
//!
//! A link stores the URL exactly as the caller supplied it. The href that ends
//! up in the markup is computed by the tree (see `MenuTree::evaluated_url`),
//! because prefixing depends on where the item sits.

use crate::attributes::AttributeSet;
use maud::{Escaper, Markup, PreEscaped};
use serde::Serialize;
use std::fmt::Write;

/// Discriminant of [`ContentNode`], used by content-type queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Link,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentNode {
    Link(Link),
    Raw(Raw),
}

impl ContentNode {
    pub fn link(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self::Link(Link::new(url, label))
    }

    pub fn raw(markup: impl Into<String>) -> Self {
        Self::Raw(Raw::new(markup))
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Link(_) => ContentKind::Link,
            Self::Raw(_) => ContentKind::Raw,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, Self::Link(_))
    }

    pub fn as_link(&self) -> Option<&Link> {
        match self {
            Self::Link(link) => Some(link),
            Self::Raw(_) => None,
        }
    }

    pub fn as_link_mut(&mut self) -> Option<&mut Link> {
        match self {
            Self::Link(link) => Some(link),
            Self::Raw(_) => None,
        }
    }

    /// Render with `href` as the link target. Raw content ignores it.
    pub fn render(&self, href: &str) -> Markup {
        match self {
            Self::Link(link) => link.render(href),
            Self::Raw(raw) => raw.render(),
        }
    }
}

/// A hyperlink: unprefixed URL, label text, and anchor attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    url: String,
    label: String,
    attributes: AttributeSet,
}

impl Link {
    pub fn new(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            label: label.into(),
            attributes: AttributeSet::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: AttributeSet) -> Self {
        self.attributes = attributes;
        self
    }

    /// The URL as supplied, before any prefixing.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeSet {
        &mut self.attributes
    }

    /// Render an anchor pointing at `href`. The label is escaped.
    ///
    /// `href` always comes first; an `href` in the link's own attributes is ignored.
    pub fn render(&self, href: &str) -> Markup {
        let mut attributes = AttributeSet::new();
        attributes.set("href", Some(href));
        for (key, value) in self.attributes.iter().filter(|(k, _)| *k != "href") {
            attributes.set(key, Some(value));
        }

        let mut out = String::new();
        out.push_str("<a");
        out.push_str(&attributes.serialize());
        out.push('>');
        write!(Escaper::new(&mut out), "{}", self.label).expect("writing to a String cannot fail");
        out.push_str("</a>");
        PreEscaped(out)
    }
}

/// Opaque markup, rendered verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Raw {
    markup: String,
}

impl Raw {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
        }
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn render(&self) -> Markup {
        PreEscaped(self.markup.clone())
    }
}

/// Whether `url` starts with one of the special prefixes (`#`, `javascript:`, ...).
///
/// Leading whitespace and ASCII case are ignored, so `" JavaScript:void(0)"`
/// counts as special too.
pub fn is_special_url(url: &str, special_prefixes: &[String]) -> bool {
    let url = url.trim_start().to_ascii_lowercase();
    special_prefixes
        .iter()
        .any(|prefix| url.starts_with(&prefix.to_ascii_lowercase()))
}
