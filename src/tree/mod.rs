//! The menu tree: an arena of item lists and items.
//!
//! ## Ownership Model
//!
//! Every list and item lives in one [`MenuTree`] and is addressed by a small
//! copyable handle ([`ListId`], [`ItemId`]). Relations are stored as handles:
//!
//! ```text
//! ListNode { items: [ItemId], parent_item: Option<ItemId> }
//!                 │                        ▲
//!                 ▼                        │
//! ItemNode { list: ListId, children: Option<ListId> }
//! ```
//!
//! An item owns its child list and a list owns its items; the `parent_item`
//! and `list` fields are plain back-pointers used for prefix and ancestor
//! walks. Nesting is checked when it happens: a list can belong to at most one
//! item, and never to an item inside its own subtree, so upward walks always
//! terminate.
//!
//! The arena only grows. A list that nothing points at any more (an emptied
//! `attach` source, a replaced child list) stays addressable but is simply not
//! reachable from any root.
//!
//! ## Building
//!
//! [`ListMut`] and [`ItemMut`] borrow the tree mutably and chain:
//!
//! ```rust
//! use simple_menu::tree::MenuTree;
//!
//! let mut tree = MenuTree::default();
//! let main = tree
//!     .create_list(Some("main"))
//!     .add("home", "Home")
//!     .add_with("algorithms", "Algorithms", |children| {
//!         children.prefix_parents(true).add("crypto", "Crypto");
//!     })
//!     .id();
//! assert_eq!(tree.list(main).items().len(), 2);
//! ```

mod active;
mod query;

pub use active::{ActivePattern, PatternKey};

use crate::attributes::AttributeSet;
use crate::config::{self, MenuConfig};
use crate::content::{ContentNode, Link};
use crate::error::MenuError;
use serde::Serialize;
use std::fmt;

/// Handle of an item list inside a [`MenuTree`].
///
/// Carries the tree's epoch at creation; [`MenuTree::clear`] starts a new
/// epoch, so handles from before the clear no longer resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ListId(usize, u32);

/// Handle of an item inside a [`MenuTree`]. Epoch-tagged like [`ListId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ItemId(usize, u32);

impl ListId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl ItemId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Per-list options consumed by URL evaluation and rendering.
///
/// `None` means "inherit": the value is taken from the nearest ancestor list
/// that sets it, falling back to the tree's [`MenuConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    /// Segment prepended to link URLs. An empty string stops inheritance without adding a segment.
    pub prefix: Option<String>,
    pub prefix_parents: Option<bool>,
    pub prefix_handler: Option<bool>,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListNode {
    name: Option<String>,
    items: Vec<ItemId>,
    element: Option<String>,
    attributes: AttributeSet,
    options: ListOptions,
    parent_item: Option<ItemId>,
}

impl ListNode {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Wrapping element, `None` when the list renders unwrapped.
    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn options(&self) -> &ListOptions {
        &self.options
    }

    /// The item this list is nested under, `None` for roots.
    pub fn parent_item(&self) -> Option<ItemId> {
        self.parent_item
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemNode {
    list: ListId,
    content: ContentNode,
    children: Option<ListId>,
    element: Option<String>,
    attributes: AttributeSet,
    active_patterns: Vec<ActivePattern>,
}

impl ItemNode {
    /// The list this item belongs to.
    pub fn list(&self) -> ListId {
        self.list
    }

    pub fn content(&self) -> &ContentNode {
        &self.content
    }

    pub fn children(&self) -> Option<ListId> {
        self.children
    }

    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    pub fn active_patterns(&self) -> &[ActivePattern] {
        &self.active_patterns
    }
}

/// Description of an item to insert with [`ListMut::push`].
#[derive(Debug, Clone)]
pub struct NewItem {
    content: ContentNode,
    children: Option<ListId>,
    attributes: AttributeSet,
    element: Option<Option<String>>,
}

impl NewItem {
    pub fn link(url: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(ContentNode::link(url, label))
    }

    pub fn raw(markup: impl Into<String>) -> Self {
        Self::new(ContentNode::raw(markup))
    }

    pub fn new(content: ContentNode) -> Self {
        Self {
            content,
            children: None,
            attributes: AttributeSet::new(),
            element: None,
        }
    }

    /// Nest `list` under the new item.
    pub fn children(mut self, list: ListId) -> Self {
        self.children = Some(list);
        self
    }

    pub fn child_list(&self) -> Option<ListId> {
        self.children
    }

    /// Attributes for the anchor. Ignored for raw content.
    pub fn link_attributes(mut self, attributes: AttributeSet) -> Self {
        if let Some(link) = self.content.as_link_mut() {
            *link.attributes_mut() = attributes;
        }
        self
    }

    /// Attributes for the item's own element.
    pub fn item_attributes(mut self, attributes: AttributeSet) -> Self {
        self.attributes = attributes;
        self
    }

    /// Override the configured item element. `None` renders the item unwrapped.
    pub fn element(mut self, element: Option<&str>) -> Self {
        self.element = Some(element.map(String::from));
        self
    }
}

/// Arena holding every list and item of a menu, plus the config they were built with.
#[derive(Debug, Clone, Serialize)]
pub struct MenuTree {
    config: MenuConfig,
    lists: Vec<ListNode>,
    items: Vec<ItemNode>,
    epoch: u32,
}

impl Default for MenuTree {
    fn default() -> Self {
        Self::new(MenuConfig::default())
    }
}

impl MenuTree {
    pub fn new(config: MenuConfig) -> Self {
        Self {
            config,
            lists: Vec::new(),
            items: Vec::new(),
            epoch: 0,
        }
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    /// Drop every list and item. Handles minted before the call stop resolving.
    pub fn clear(&mut self) {
        self.lists.clear();
        self.items.clear();
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Create an empty, unattached list using the configured list element.
    pub fn create_list(&mut self, name: Option<&str>) -> ListMut<'_> {
        let element = config::element_or_none(&self.config.item_list.element);
        let id = self.insert_list(name, element, AttributeSet::new());
        self.list_mut(id)
    }

    /// Read a list.
    ///
    /// # Panics
    ///
    /// If `id` was not minted by this tree (or the tree was cleared since).
    /// Use [`MenuTree::check_list`] first when the handle may be stale.
    pub fn list(&self, id: ListId) -> &ListNode {
        self.try_list(id)
            .unwrap_or_else(|| panic!("list handle {id} does not belong to this tree"))
    }

    /// Read an item.
    ///
    /// # Panics
    ///
    /// If `id` was not minted by this tree (or the tree was cleared since).
    pub fn item(&self, id: ItemId) -> &ItemNode {
        self.try_item(id)
            .unwrap_or_else(|| panic!("item handle {id} does not belong to this tree"))
    }

    pub fn try_list(&self, id: ListId) -> Option<&ListNode> {
        if id.1 != self.epoch {
            return None;
        }
        self.lists.get(id.0)
    }

    pub fn try_item(&self, id: ItemId) -> Option<&ItemNode> {
        if id.1 != self.epoch {
            return None;
        }
        self.items.get(id.0)
    }

    /// Fail with [`MenuError::StaleHandle`] unless `id` resolves in this tree.
    pub fn check_list(&self, id: ListId) -> Result<(), MenuError> {
        match self.try_list(id) {
            Some(_) => Ok(()),
            None => Err(MenuError::StaleHandle(format!("list {id}"))),
        }
    }

    /// Fail with [`MenuError::StaleHandle`] unless `id` resolves in this tree.
    pub fn check_item(&self, id: ItemId) -> Result<(), MenuError> {
        match self.try_item(id) {
            Some(_) => Ok(()),
            None => Err(MenuError::StaleHandle(format!("item {id}"))),
        }
    }

    pub fn list_mut(&mut self, id: ListId) -> ListMut<'_> {
        ListMut { tree: self, id }
    }

    pub fn item_mut(&mut self, id: ItemId) -> ItemMut<'_> {
        ItemMut { tree: self, id }
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Insert an item at the end of `list`, wiring the child list if any.
    pub fn push_item(&mut self, list: ListId, new: NewItem) -> Result<ItemId, MenuError> {
        self.check_list(list)?;
        let element = match new.element {
            Some(Some(element)) => Some(checked_element(&element)?),
            Some(None) => None,
            None => config::element_or_none(&self.config.item.element),
        };
        let id = ItemId(self.items.len(), self.epoch);
        self.items.push(ItemNode {
            list,
            content: new.content,
            children: None,
            element,
            attributes: new.attributes,
            active_patterns: Vec::new(),
        });
        if let Some(children) = new.children {
            if let Err(err) = self.set_children(id, Some(children)) {
                self.items.pop();
                return Err(err);
            }
        }
        self.lists[list.0].items.push(id);
        Ok(id)
    }

    /// Nest `children` under `item`, replacing (and detaching) any previous child list.
    ///
    /// Fails when `children` already belongs to another item, or when `item`
    /// sits inside `children`'s own subtree.
    pub fn set_children(&mut self, item: ItemId, children: Option<ListId>) -> Result<(), MenuError> {
        self.check_item(item)?;
        if let Some(list) = children {
            self.check_list(list)?;
            match self.lists[list.0].parent_item {
                Some(owner) if owner != item => return Err(MenuError::ListInUse(list.0)),
                _ => {}
            }
            if self.list_is_within(self.items[item.0].list, list) {
                return Err(MenuError::Cycle(list.0));
            }
        }
        if let Some(previous) = self.items[item.0].children.take() {
            self.lists[previous.0].parent_item = None;
        }
        if let Some(list) = children {
            self.lists[list.0].parent_item = Some(item);
        }
        self.items[item.0].children = children;
        Ok(())
    }

    /// Move every item of `source` to the end of `target`. `source` is left empty.
    pub fn attach(&mut self, target: ListId, source: ListId) -> Result<(), MenuError> {
        self.check_list(target)?;
        self.check_list(source)?;
        if target == source || self.list_is_within(target, source) {
            return Err(MenuError::Cycle(source.0));
        }
        let moved = std::mem::take(&mut self.lists[source.0].items);
        tracing::debug!(
            "Attaching {} items from list {} to list {}",
            moved.len(),
            source,
            target
        );
        for &item in &moved {
            self.items[item.0].list = target;
        }
        self.lists[target.0].items.extend(moved);
        Ok(())
    }

    /// Deep-copy `list` and everything below it into a new, unattached list.
    pub fn clone_list(&mut self, list: ListId) -> ListId {
        let source = self.lists[list.0].clone();
        let copy = self.insert_list(source.name.as_deref(), source.element, source.attributes);
        self.lists[copy.0].options = source.options;
        for item in source.items {
            let node = self.items[item.0].clone();
            let children = node.children.map(|c| self.clone_list(c));
            let id = ItemId(self.items.len(), self.epoch);
            self.items.push(ItemNode {
                list: copy,
                children,
                ..node
            });
            if let Some(children) = children {
                self.lists[children.0].parent_item = Some(id);
            }
            self.lists[copy.0].items.push(id);
        }
        copy
    }

    /// The list at the top of `list`'s ancestor chain.
    pub fn root_of(&self, list: ListId) -> ListId {
        let mut current = list;
        while let Some(parent) = self.lists[current.0].parent_item {
            current = self.items[parent.0].list;
        }
        current
    }

    /// Whether `list` is `ancestor` or nested anywhere below it.
    pub fn list_is_within(&self, list: ListId, ancestor: ListId) -> bool {
        let mut current = list;
        loop {
            if current == ancestor {
                return true;
            }
            match self.lists[current.0].parent_item {
                Some(parent) => current = self.items[parent.0].list,
                None => return false,
            }
        }
    }

    /// Items from the root down to (excluding) the item owning `list`'s items.
    ///
    /// Returned root first.
    pub fn ancestor_items(&self, list: ListId) -> Vec<ItemId> {
        let mut ancestors = Vec::new();
        let mut current = list;
        while let Some(parent) = self.lists[current.0].parent_item {
            ancestors.push(parent);
            current = self.items[parent.0].list;
        }
        ancestors.reverse();
        ancestors
    }

    /// Resolve an inheritable list option: own value, then ancestors, innermost first.
    fn inherited<T>(&self, list: ListId, pick: impl Fn(&ListOptions) -> Option<T>) -> Option<T> {
        let mut current = list;
        loop {
            if let Some(value) = pick(&self.lists[current.0].options) {
                return Some(value);
            }
            match self.lists[current.0].parent_item {
                Some(parent) => current = self.items[parent.0].list,
                None => return None,
            }
        }
    }

    /// Effective render depth limit for `list`.
    pub fn max_depth_for(&self, list: ListId) -> Option<usize> {
        self.inherited(list, |o| o.max_depth)
            .or_else(|| self.config.depth_limit())
    }

    fn insert_list(
        &mut self,
        name: Option<&str>,
        element: Option<String>,
        attributes: AttributeSet,
    ) -> ListId {
        let id = ListId(self.lists.len(), self.epoch);
        self.lists.push(ListNode {
            name: name.map(String::from),
            items: Vec::new(),
            element,
            attributes,
            options: ListOptions::default(),
            parent_item: None,
        });
        id
    }

    /// Append an item with the configured element and no children. Cannot fail.
    pub(crate) fn append_plain_item(&mut self, list: ListId, content: ContentNode) -> ItemId {
        let element = config::element_or_none(&self.config.item.element);
        let id = ItemId(self.items.len(), self.epoch);
        self.items.push(ItemNode {
            list,
            content,
            children: None,
            element,
            attributes: AttributeSet::new(),
            active_patterns: Vec::new(),
        });
        self.lists[list.0].items.push(id);
        id
    }
}

/// Validate an element name for lists and items. Empty names are rejected.
pub(crate) fn checked_element(element: &str) -> Result<String, MenuError> {
    if element.is_empty() || !config::is_valid_element(element) {
        return Err(MenuError::InvalidArgument(format!(
            "{element:?} is not a valid element name"
        )));
    }
    Ok(element.to_string())
}

// ============================================================================
// Builders
// ============================================================================

/// Mutable, chainable access to one list.
#[derive(Debug)]
pub struct ListMut<'a> {
    tree: &'a mut MenuTree,
    id: ListId,
}

impl<'a> ListMut<'a> {
    pub fn id(&self) -> ListId {
        self.id
    }

    /// Release the borrow, returning the tree.
    pub fn tree(self) -> &'a mut MenuTree {
        self.tree
    }

    /// Add a link item.
    pub fn add(self, url: &str, label: &str) -> Self {
        self.push_fresh(ContentNode::link(url, label))
    }

    /// Add a raw markup item.
    pub fn raw(self, markup: &str) -> Self {
        self.push_fresh(ContentNode::raw(markup))
    }

    /// Add a link item whose children are built by `build` on a fresh list.
    pub fn add_with(self, url: &str, label: &str, build: impl FnOnce(ListMut<'_>)) -> Self {
        self.push_fresh_with(ContentNode::link(url, label), build)
    }

    /// Add a raw markup item whose children are built by `build` on a fresh list.
    pub fn raw_with(self, markup: &str, build: impl FnOnce(ListMut<'_>)) -> Self {
        self.push_fresh_with(ContentNode::raw(markup), build)
    }

    /// Add a fully described item.
    pub fn push(self, new: NewItem) -> Result<Self, MenuError> {
        self.tree.push_item(self.id, new)?;
        Ok(self)
    }

    /// Move every item of `other` into this list.
    pub fn attach(self, other: ListId) -> Result<Self, MenuError> {
        self.tree.attach(self.id, other)?;
        Ok(self)
    }

    pub fn name(self, name: Option<&str>) -> Self {
        self.tree.lists[self.id.0].name = name.map(String::from);
        self
    }

    /// Change the wrapping element. `None` renders the list unwrapped.
    pub fn element(self, element: Option<&str>) -> Result<Self, MenuError> {
        let element = element.map(checked_element).transpose()?;
        self.tree.lists[self.id.0].element = element;
        Ok(self)
    }

    /// Replace all attributes of the list element.
    pub fn attributes(self, attributes: AttributeSet) -> Self {
        self.tree.lists[self.id.0].attributes = attributes;
        self
    }

    pub fn set_attribute(self, key: &str, value: Option<&str>) -> Self {
        self.tree.lists[self.id.0].attributes.set(key, value);
        self
    }

    pub fn add_class(self, class: &str) -> Self {
        self.tree.lists[self.id.0].attributes.add_class(class);
        self
    }

    /// Prefix every link in this list (and lists below it that set no prefix).
    pub fn prefix(self, prefix: &str) -> Self {
        self.tree.lists[self.id.0].options.prefix = Some(prefix.to_string());
        self
    }

    /// Prefix links with the URLs of the items this list is nested under.
    pub fn prefix_parents(self, enabled: bool) -> Self {
        self.tree.lists[self.id.0].options.prefix_parents = Some(enabled);
        self
    }

    /// Prefix links with the name of the list at the top of the tree.
    pub fn prefix_handler(self, enabled: bool) -> Self {
        self.tree.lists[self.id.0].options.prefix_handler = Some(enabled);
        self
    }

    pub fn max_depth(self, max_depth: Option<usize>) -> Self {
        self.tree.lists[self.id.0].options.max_depth = max_depth;
        self
    }

    /// The most recently added item, if any.
    pub fn last_item(&self) -> Option<ItemId> {
        self.tree.lists[self.id.0].items.last().copied()
    }

    fn push_fresh(self, content: ContentNode) -> Self {
        self.tree.append_plain_item(self.id, content);
        self
    }

    fn push_fresh_with(self, content: ContentNode, build: impl FnOnce(ListMut<'_>)) -> Self {
        let item = self.tree.append_plain_item(self.id, content);
        let children = self.tree.create_list(None).id();
        self.tree.lists[children.0].parent_item = Some(item);
        self.tree.items[item.0].children = Some(children);
        build(self.tree.list_mut(children));
        self
    }
}

/// Mutable, chainable access to one item.
#[derive(Debug)]
pub struct ItemMut<'a> {
    tree: &'a mut MenuTree,
    id: ItemId,
}

impl<'a> ItemMut<'a> {
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Release the borrow, returning the tree.
    pub fn tree(self) -> &'a mut MenuTree {
        self.tree
    }

    /// Change the wrapping element. `None` renders the item unwrapped.
    pub fn element(self, element: Option<&str>) -> Result<Self, MenuError> {
        let element = element.map(checked_element).transpose()?;
        self.tree.items[self.id.0].element = element;
        Ok(self)
    }

    /// Replace all attributes of the item element.
    pub fn attributes(self, attributes: AttributeSet) -> Self {
        self.tree.items[self.id.0].attributes = attributes;
        self
    }

    pub fn set_attribute(self, key: &str, value: Option<&str>) -> Self {
        self.tree.items[self.id.0].attributes.set(key, value);
        self
    }

    pub fn add_class(self, class: &str) -> Self {
        self.tree.items[self.id.0].attributes.add_class(class);
        self
    }

    /// Replace the anchor attributes. No effect on raw content.
    pub fn link_attributes(self, attributes: AttributeSet) -> Self {
        if let Some(link) = self.tree.items[self.id.0].content.as_link_mut() {
            *link.attributes_mut() = attributes;
        }
        self
    }

    /// Nest `children` under this item. See [`MenuTree::set_children`].
    pub fn children(self, children: ListId) -> Result<Self, MenuError> {
        self.tree.set_children(self.id, Some(children))?;
        Ok(self)
    }

    /// Append a regex matched (case-insensitively) against the current path.
    pub fn active_pattern(self, pattern: &str) -> Result<Self, MenuError> {
        let pattern = ActivePattern::regex(None, pattern)?;
        self.tree.items[self.id.0].set_active_pattern(pattern);
        Ok(self)
    }

    /// Set the regex stored under `name`, replacing a previous one with that name.
    pub fn named_active_pattern(self, name: &str, pattern: &str) -> Result<Self, MenuError> {
        let pattern = ActivePattern::regex(Some(name), pattern)?;
        self.tree.items[self.id.0].set_active_pattern(pattern);
        Ok(self)
    }

    /// Append a pattern matching `text` literally.
    pub fn active_literal(self, text: &str) -> Result<Self, MenuError> {
        let pattern = ActivePattern::literal(None, text)?;
        self.tree.items[self.id.0].set_active_pattern(pattern);
        Ok(self)
    }
}

impl ItemNode {
    fn set_active_pattern(&mut self, mut pattern: ActivePattern) {
        let existing = match pattern.key() {
            PatternKey::Named(name) => self
                .active_patterns
                .iter()
                .position(|p| p.key() == &PatternKey::Named(name.clone())),
            PatternKey::Index(_) => None,
        };
        match existing {
            Some(pos) => self.active_patterns[pos] = pattern,
            None => {
                if matches!(pattern.key(), PatternKey::Index(_)) {
                    pattern.set_index(self.active_patterns.len());
                }
                self.active_patterns.push(pattern);
            }
        }
    }
}

/// Build a standalone link with the tree's evaluated href. Used by breadcrumbs.
pub(crate) fn detached_link(link: &Link, href: String) -> ContentNode {
    ContentNode::Link(Link::new(href, link.label()).with_attributes(link.attributes().clone()))
}
