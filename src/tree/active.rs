//! URL evaluation and active-state resolution.
//!
//! ## Evaluated URLs
//!
//! The href of a link is built from segments joined with `/`:
//!
//! ```text
//! [prefix] [ancestor urls, root first] [root list name] url
//! ```
//!
//! Each stage is switched by the options of the item's list, inherited from
//! ancestor lists and finally from the config. Special URLs (`#`,
//! `javascript:`) skip every stage. Ancestor segments use the raw URLs of the
//! ancestor links, never their evaluated ones, so prefixes do not compound.
//! Slashes at segment boundaries collapse to one: a parent of `/docs/` and a
//! url of `intro` give `/docs/intro`.
//!
//! ## Active State
//!
//! An item is active when its evaluated URL equals the request's path,
//! full URL, or bare URL, or when one of its active patterns matches the
//! path. An item has an active child when any item below it is active.

use super::{ItemId, ListId, MenuTree};
use crate::content::{ContentNode, is_special_url};
use crate::error::MenuError;
use crate::request::{Location, trim_slashes};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

/// How an active pattern is addressed on its item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PatternKey {
    /// Setting a pattern under an existing name replaces it.
    Named(String),
    Index(usize),
}

/// A case-insensitive regex matched against the current path.
#[derive(Debug, Clone)]
pub struct ActivePattern {
    key: PatternKey,
    regex: Regex,
}

impl ActivePattern {
    /// Compile `pattern`. Without a name the pattern is positional.
    pub fn regex(name: Option<&str>, pattern: &str) -> Result<Self, MenuError> {
        let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            key: match name {
                Some(name) => PatternKey::Named(name.to_string()),
                None => PatternKey::Index(0),
            },
            regex,
        })
    }

    /// A pattern matching `text` anywhere in the path, taken literally.
    pub fn literal(name: Option<&str>, text: &str) -> Result<Self, MenuError> {
        Self::regex(name, &regex::escape(text))
    }

    pub fn key(&self) -> &PatternKey {
        &self.key
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub(super) fn set_index(&mut self, index: usize) {
        self.key = PatternKey::Index(index);
    }
}

impl PartialEq for ActivePattern {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.as_str() == other.as_str()
    }
}

impl Serialize for ActivePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ActivePattern", 2)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("pattern", self.as_str())?;
        state.end()
    }
}

impl MenuTree {
    /// Whether `url` starts with one of the configured special prefixes.
    pub fn is_special_url(&self, url: &str) -> bool {
        is_special_url(url, &self.config.link.special_prefixes)
    }

    /// The href rendered for `item`. Raw content evaluates to an empty string.
    pub fn evaluated_url(&self, item: ItemId) -> String {
        let node = &self.items[item.0];
        let Some(link) = node.content.as_link() else {
            return String::new();
        };
        if self.is_special_url(link.url()) {
            return link.url().to_string();
        }

        let list = node.list;
        let mut segments: Vec<String> = Vec::new();
        if let Some(prefix) = self.effective_prefix(list) {
            segments.push(prefix);
        }
        if self.effective_prefix_parents(list) {
            segments.extend(self.ancestor_urls(list));
        }
        if self.effective_prefix_handler(list) {
            let root = self.root_of(list);
            segments.push(self.lists[root.0].name.clone().unwrap_or_default());
        }
        segments.push(link.url().to_string());
        join_segments(&segments)
    }

    /// Raw URLs of the link items above `list`, root first.
    ///
    /// Raw content and special URLs contribute nothing.
    pub fn ancestor_urls(&self, list: ListId) -> Vec<String> {
        self.ancestor_items(list)
            .into_iter()
            .filter_map(|item| self.items[item.0].content.as_link())
            .map(|link| link.url())
            .filter(|url| !self.is_special_url(url))
            .map(String::from)
            .collect()
    }

    pub fn is_active(&self, item: ItemId, location: &Location) -> bool {
        let node = &self.items[item.0];
        let ContentNode::Link(link) = &node.content else {
            return false;
        };
        if !self.is_special_url(link.url()) {
            let url = self.evaluated_url(item);
            if trim_slashes(&url) == location.path
                || (!location.url.is_empty() && url == location.url)
                || (!location.bare_url.is_empty() && url == location.bare_url)
            {
                return true;
            }
        }
        node.active_patterns
            .iter()
            .any(|pattern| pattern.is_match(&location.path))
    }

    /// Whether any item nested below `item`, at any depth, is active.
    pub fn has_active_child(&self, item: ItemId, location: &Location) -> bool {
        let Some(children) = self.items[item.0].children else {
            return false;
        };
        self.lists[children.0]
            .items
            .iter()
            .any(|&child| self.is_active(child, location) || self.has_active_child(child, location))
    }

    fn effective_prefix(&self, list: ListId) -> Option<String> {
        self.inherited(list, |o| o.prefix.clone())
            .or_else(|| self.config.item_list.prefix.clone())
            .filter(|prefix| !prefix.is_empty())
    }

    fn effective_prefix_parents(&self, list: ListId) -> bool {
        self.inherited(list, |o| o.prefix_parents)
            .unwrap_or(self.config.item_list.prefix_parents)
    }

    fn effective_prefix_handler(&self, list: ListId) -> bool {
        self.inherited(list, |o| o.prefix_handler)
            .unwrap_or(self.config.item_list.prefix_handler)
    }
}

/// Join with `/`, trimming slashes where two segments meet.
fn join_segments(segments: &[String]) -> String {
    let last = segments.len().saturating_sub(1);
    segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let segment = if i > 0 { segment.trim_start_matches('/') } else { segment };
            if i < last { segment.trim_end_matches('/') } else { segment }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use crate::config::MenuConfig;
    use crate::test_helpers::*;
    use crate::tree::{MenuTree, NewItem};
    use crate::request::Location;

    #[test]
    fn unprefixed_url_is_unchanged() {
        let mut tree = MenuTree::default();
        let root = tree.create_list(None).add("about", "About").id();
        assert_eq!(tree.evaluated_url(item_by_url(&tree, root, "about")), "about");
    }

    #[test]
    fn prefix_parents_chain() {
        let mut tree = MenuTree::default();
        let root = tree
            .create_list(None)
            .prefix("base")
            .prefix_parents(true)
            .add_with("a", "A", |a| {
                a.add_with("b", "B", |b| {
                    b.add("c", "C");
                });
            })
            .id();
        assert_eq!(tree.evaluated_url(item_by_url(&tree, root, "a")), "base/a");
        assert_eq!(tree.evaluated_url(item_by_url(&tree, root, "c")), "base/a/b/c");
    }

    #[test]
    fn empty_prefix_stops_inheritance() {
        let mut tree = MenuTree::default();
        let root = tree
            .create_list(None)
            .prefix("base")
            .add_with("a", "A", |a| {
                a.prefix("").add("b", "B");
            })
            .id();
        assert_eq!(tree.evaluated_url(item_by_url(&tree, root, "b")), "b");
    }

    #[test]
    fn slashes_collapse_between_segments() {
        let mut tree = MenuTree::default();
        let root = tree
            .create_list(None)
            .prefix("/en/")
            .prefix_parents(true)
            .add_with("/docs/", "Docs", |c| {
                c.add("/intro", "Intro").add("faq/", "FAQ");
            })
            .id();
        let intro = item_by_url(&tree, root, "/intro");
        assert_eq!(tree.evaluated_url(intro), "/en/docs/intro");
        assert_eq!(tree.evaluated_url(item_by_url(&tree, root, "faq/")), "/en/docs/faq/");
        assert!(tree.is_active(intro, &Location::from_path("en/docs/intro")));
    }

    #[test]
    fn parent_with_slashes_keeps_child_active() {
        let mut tree = MenuTree::default();
        let root = tree
            .create_list(None)
            .prefix_parents(true)
            .add_with("/docs/", "Docs", |c| {
                c.add("intro", "Intro");
            })
            .id();
        let intro = item_by_url(&tree, root, "intro");
        assert_eq!(tree.evaluated_url(intro), "/docs/intro");
        assert!(tree.is_active(intro, &Location::from_path("docs/intro")));
    }

    #[test]
    fn prefix_handler_uses_root_name() {
        let mut tree = MenuTree::default();
        let root = tree
            .create_list(Some("admin"))
            .prefix_handler(true)
            .add_with("users", "Users", |c| {
                c.add("new", "New");
            })
            .id();
        assert_eq!(tree.evaluated_url(item_by_url(&tree, root, "users")), "admin/users");
        assert_eq!(tree.evaluated_url(item_by_url(&tree, root, "new")), "admin/new");
    }

    #[test]
    fn stages_apply_in_order() {
        let mut tree = MenuTree::default();
        let root = tree
            .create_list(Some("site"))
            .prefix("en")
            .prefix_parents(true)
            .prefix_handler(true)
            .add_with("docs", "Docs", |c| {
                c.add("intro", "Intro");
            })
            .id();
        assert_eq!(
            tree.evaluated_url(item_by_url(&tree, root, "intro")),
            "en/docs/site/intro"
        );
    }

    #[test]
    fn config_supplies_defaults() {
        let mut config = MenuConfig::default();
        config.item_list.prefix = Some("shop".to_string());
        let mut tree = MenuTree::new(config);
        let root = tree.create_list(None).add("cart", "Cart").id();
        assert_eq!(tree.evaluated_url(item_by_url(&tree, root, "cart")), "shop/cart");
    }

    #[test]
    fn special_urls_bypass_every_stage() {
        let mut tree = MenuTree::default();
        let root = tree
            .create_list(Some("main"))
            .prefix("base")
            .prefix_parents(true)
            .prefix_handler(true)
            .add_with("a", "A", |c| {
                c.add("#", "Top").add("javascript:void(0)", "Toggle");
            })
            .id();
        assert_eq!(tree.evaluated_url(item_by_url(&tree, root, "#")), "#");
        assert_eq!(
            tree.evaluated_url(item_by_url(&tree, root, "javascript:void(0)")),
            "javascript:void(0)"
        );
    }

    #[test]
    fn special_and_raw_ancestors_are_skipped() {
        let mut tree = MenuTree::default();
        let root = tree
            .create_list(None)
            .prefix_parents(true)
            .add_with("#", "Dropdown", |c| {
                c.raw_with("<span>Group</span>", |g| {
                    g.add("leaf", "Leaf");
                });
            })
            .id();
        assert_eq!(tree.evaluated_url(item_by_url(&tree, root, "leaf")), "leaf");
    }

    // =========================================================================
    // Active state
    // =========================================================================

    #[test]
    fn exact_path_match() {
        let mut tree = MenuTree::default();
        let root = tree.create_list(None).add("shop/cart", "Cart").add("shop/carts", "Carts").id();
        let location = Location::from_path("/shop/cart/");
        assert!(tree.is_active(item_by_url(&tree, root, "shop/cart"), &location));
        assert!(!tree.is_active(item_by_url(&tree, root, "shop/carts"), &location));
    }

    #[test]
    fn full_and_bare_url_match() {
        let mut tree = MenuTree::default();
        let root = tree
            .create_list(None)
            .add("https://example.com/a?x=1", "Full")
            .add("https://example.com/a", "Bare")
            .id();
        let location = Location::from_url("https://example.com/a?x=1");
        assert!(tree.is_active(item_by_url(&tree, root, "https://example.com/a?x=1"), &location));
        assert!(tree.is_active(item_by_url(&tree, root, "https://example.com/a"), &location));
    }

    #[test]
    fn empty_request_urls_do_not_match_empty_links() {
        let mut tree = MenuTree::default();
        let root = tree.create_list(None).add("", "Home").id();
        let location = Location::from_path("shop");
        assert!(!tree.is_active(item_by_url(&tree, root, ""), &location));
    }

    #[test]
    fn raw_content_is_never_active() {
        let mut tree = MenuTree::default();
        let root = tree.create_list(None).raw("shop").id();
        let raw = tree.list(root).items()[0];
        assert!(!tree.is_active(raw, &Location::from_path("shop")));
    }

    #[test]
    fn special_url_is_not_compared() {
        let mut tree = MenuTree::default();
        let root = tree.create_list(None).add("#", "Top").id();
        let mut location = Location::from_path("");
        location.url = "#".to_string();
        assert!(!tree.is_active(item_by_url(&tree, root, "#"), &location));
    }

    #[test]
    fn patterns_match_case_insensitively() {
        let mut tree = MenuTree::default();
        let root = tree.create_list(None).add("blog", "Blog").id();
        let blog = item_by_url(&tree, root, "blog");
        tree.item_mut(blog).active_pattern("^blog/\\d+").unwrap();
        assert!(tree.is_active(blog, &Location::from_path("BLOG/2024")));
        assert!(!tree.is_active(blog, &Location::from_path("blogroll")));
    }

    #[test]
    fn patterns_activate_special_links() {
        let mut tree = MenuTree::default();
        let root = tree.create_list(None).add("#", "Shop").id();
        let toggle = item_by_url(&tree, root, "#");
        tree.item_mut(toggle).active_literal("shop/").unwrap();
        assert!(tree.is_active(toggle, &Location::from_path("shop/cart")));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let mut tree = MenuTree::default();
        let root = tree.create_list(None).add("a", "A").id();
        let item = item_by_url(&tree, root, "a");
        assert!(tree.item_mut(item).active_pattern("(unclosed").is_err());
    }

    #[test]
    fn active_child_propagates_through_all_children() {
        let mut tree = MenuTree::default();
        let root = tree
            .create_list(None)
            .add_with("x", "X", |c| {
                c.add_with("first", "First", |f| {
                    f.add("nope", "Nope");
                })
                .add_with("second", "Second", |s| {
                    s.add("y", "Y");
                });
            })
            .id();
        let location = Location::from_path("y");
        let x = item_by_url(&tree, root, "x");
        assert!(tree.has_active_child(x, &location));
        assert!(!tree.is_active(x, &location));
        assert!(tree.is_active(item_by_url(&tree, root, "y"), &location));
        assert!(!tree.has_active_child(item_by_url(&tree, root, "first"), &location));
    }

    #[test]
    fn pushed_children_take_part_in_active_child() {
        let mut tree = MenuTree::default();
        let sub = tree.create_list(None).add("y", "Y").id();
        let root = tree.create_list(None).push(NewItem::link("x", "X").children(sub)).unwrap().id();
        assert!(tree.has_active_child(item_by_url(&tree, root, "x"), &Location::from_path("y")));
    }
}
