//! Plain-text outlines of menus, for logs and debugging.
//!
//! # Output Format
//!
//! Each item leads with its 1-based position among its siblings, then its
//! label and, for links, the evaluated href. Nesting is shown with four
//! spaces per level. Raw items show their markup with tags stripped.
//!
//! ```text
//! main
//!     001 Home → home
//!     002 Products → products  [active child]
//!         001 Widgets → products/widgets  [active]
//!         002 (raw) New!
//! ```
//!
//! Format functions return `Vec<String>` and never print; callers decide
//! where the lines go.

use crate::content::ContentNode;
use crate::registry::Menu;
use crate::request::Location;
use crate::tree::{ListId, MenuTree};

/// Longest raw-markup excerpt shown before truncating.
const RAW_EXCERPT: usize = 40;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Strip HTML tags from a string (simple angle-bracket stripping).
fn strip_html_tags(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Outline of `list`. With a location, active items are marked.
pub fn format_outline(tree: &MenuTree, list: ListId, location: Option<&Location>) -> Vec<String> {
    let mut lines = Vec::new();
    outline_recursive(tree, list, 0, location, &mut lines);
    lines
}

/// Outline of every registered menu, each under its name.
pub fn format_menu_outline(menu: &Menu, location: Option<&Location>) -> Vec<String> {
    let mut lines = Vec::new();
    for name in menu.names() {
        let Ok(list) = menu.item_list(name) else {
            continue;
        };
        lines.push(if name.is_empty() { "(default)".to_string() } else { name.to_string() });
        outline_recursive(menu.tree(), list, 1, location, &mut lines);
    }
    lines
}

fn outline_recursive(
    tree: &MenuTree,
    list: ListId,
    depth: usize,
    location: Option<&Location>,
    lines: &mut Vec<String>,
) {
    for (i, &item) in tree.list(list).items().iter().enumerate() {
        let node = tree.item(item);
        let mut line = match node.content() {
            ContentNode::Link(link) => format!(
                "{}{} {} \u{2192} {}",
                indent(depth),
                format_index(i + 1),
                link.label(),
                tree.evaluated_url(item)
            ),
            ContentNode::Raw(raw) => format!(
                "{}{} (raw) {}",
                indent(depth),
                format_index(i + 1),
                truncate(strip_html_tags(raw.markup()).trim(), RAW_EXCERPT)
            ),
        };
        if let Some(location) = location {
            if tree.is_active(item, location) {
                line.push_str("  [active]");
            } else if tree.has_active_child(item, location) {
                line.push_str("  [active child]");
            }
        }
        lines.push(line);
        if let Some(children) = node.children() {
            outline_recursive(tree, children, depth + 1, location, lines);
        }
    }
}
