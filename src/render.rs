//! Recursive rendering of a menu tree to markup.
//!
//! ## Depths
//!
//! The list a render starts from sits at depth 0, its items at depth 1, their
//! child lists at depth 2, and so on. A list deeper than its effective
//! `max_depth` renders nothing at all, not even its wrapping element:
//!
//! ```text
//! <ul>                       depth 0
//!   <li>...                  depth 1
//!     <ul>                   depth 2   (omitted when max_depth = 1)
//! ```
//!
//! ## Active Classes
//!
//! Active and active-child classes are added to a copy of the item's
//! attributes for the duration of one render; the tree itself is not touched,
//! so rendering the same tree for another location starts clean.
//!
//! ## Entities
//!
//! Labels are escaped on output. Callers frequently hand over labels that are
//! already escaped (`Tom &amp; Jerry`), which would otherwise show up as
//! `&amp;amp;`. Each item decodes that double escaping in its own content and
//! tags before its rendered children are appended, so nothing is decoded twice.

use crate::attributes::AttributeSet;
use crate::request::Location;
use crate::tree::{ItemId, ListId, MenuTree};
use maud::{Markup, PreEscaped, html};
use regex::Regex;
use std::sync::LazyLock;

static DOUBLE_ESCAPED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&amp;((?:[a-zA-Z][a-zA-Z0-9]*|#[0-9]+|#[xX][0-9a-fA-F]+);)")
        .expect("entity pattern is valid")
});

/// Render `list` as the top of a menu.
pub fn render(tree: &MenuTree, list: ListId, location: &Location) -> Markup {
    render_list_at(tree, list, 0, location)
}

/// Render `list` as if it sat at `depth`.
pub fn render_list_at(tree: &MenuTree, list: ListId, depth: usize, location: &Location) -> Markup {
    if let Some(max_depth) = tree.max_depth_for(list) {
        if depth > max_depth {
            tracing::trace!("List {} at depth {} exceeds max depth {}", list, depth, max_depth);
            return PreEscaped(String::new());
        }
    }
    let node = tree.list(list);
    tracing::trace!("Rendering list {} ({} items) at depth {}", list, node.items().len(), depth);

    let body = html! {
        @for &item in node.items() {
            (render_item(tree, item, depth + 1, location))
        }
    };
    let (open, close) = tags(node.element(), node.attributes());
    PreEscaped(format!("{open}{}{close}", body.into_string()))
}

/// Render one item and, below it, its child list at `depth + 1`.
pub fn render_item(tree: &MenuTree, item: ItemId, depth: usize, location: &Location) -> Markup {
    let node = tree.item(item);
    let config = tree.config();

    let content = node.content().render(&tree.evaluated_url(item));
    let mut attributes = node.attributes().clone();
    if tree.is_active(item, location) {
        attributes.add_class(&config.item.active_class);
    }
    if tree.has_active_child(item, location) {
        attributes.add_class(&config.item.active_child_class);
    }
    let (open, close) = tags(node.element(), &attributes);
    let own = decode_double_escaped(&format!("{open}{}", content.into_string()));

    let children = match node.children() {
        Some(children) if !tree.list(children).is_empty() => {
            render_list_at(tree, children, depth + 1, location).into_string()
        }
        _ => String::new(),
    };
    PreEscaped(format!("{own}{children}{close}"))
}

/// Undo one level of escaping applied to text that was already escaped.
///
/// `&amp;lt;` becomes `&lt;`; a lone `&amp;` stays as it is.
pub fn decode_double_escaped(markup: &str) -> String {
    DOUBLE_ESCAPED.replace_all(markup, "&$1").into_owned()
}

/// Opening and closing tags, or two empty strings when there is no element.
fn tags(element: Option<&str>, attributes: &AttributeSet) -> (String, String) {
    match element {
        Some(element) => (
            format!("<{element}{}>", attributes.serialize()),
            format!("</{element}>"),
        ),
        None => (String::new(), String::new()),
    }
}
