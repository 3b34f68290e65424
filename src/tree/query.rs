//! Read-mostly queries over a list and everything nested below it.
//!
//! Depth is counted from the list a query is called on: its own items sit at
//! depth 1, and the child list of an item at depth `d` sits at list depth `d`
//! with its items at `d + 1`.
//!
//! ```text
//! root                       (list, not part of list results)
//! ├── a                      item depth 1
//! │   └── [a's children]     list depth 1
//! │       └── b              item depth 2
//! └── c                      item depth 1
//! ```
//!
//! Breadcrumbs and hydration live here too since both are driven by walking
//! the tree; they are the only queries that create lists.

use super::{ItemId, ListId, ListMut, MenuTree, detached_link};
use crate::content::{ContentKind, ContentNode};
use crate::error::MenuError;
use crate::request::Location;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;

impl MenuTree {
    // ------------------------------------------------------------------------
    // Find by name
    // ------------------------------------------------------------------------

    /// Every list named in `names`, searching `list` and its descendants.
    ///
    /// Results are grouped by requested name, each group in depth-first order.
    /// A name matching several lists yields all of them.
    pub fn find(&self, list: ListId, names: &[&str]) -> Vec<ListId> {
        let lists = self.lists_preorder(list);
        let mut found = Vec::new();
        for name in names {
            found.extend(
                lists
                    .iter()
                    .copied()
                    .filter(|&l| self.lists[l.0].name.as_deref() == Some(*name)),
            );
        }
        found
    }

    /// First list named `name` in depth-first order, including `list` itself.
    pub fn find_item_list_by_name(&self, list: ListId, name: &str) -> Option<ListId> {
        self.lists_preorder(list)
            .into_iter()
            .find(|&l| self.lists[l.0].name.as_deref() == Some(name))
    }

    // ------------------------------------------------------------------------
    // Depth-indexed flattening
    // ------------------------------------------------------------------------

    pub fn items_with_depth(&self, list: ListId) -> BTreeMap<usize, Vec<ItemId>> {
        let mut depths = BTreeMap::new();
        self.collect_items(list, 1, &mut depths);
        depths
    }

    pub fn item_lists_with_depth(&self, list: ListId) -> BTreeMap<usize, Vec<ListId>> {
        let mut depths = BTreeMap::new();
        self.collect_lists(list, 1, &mut depths);
        depths
    }

    /// Every item below `list`, shallowest depth first.
    pub fn all_items(&self, list: ListId) -> Vec<ItemId> {
        self.items_with_depth(list).into_values().flatten().collect()
    }

    /// Every list nested below `list`, shallowest depth first. `list` itself is excluded.
    pub fn all_item_lists(&self, list: ListId) -> Vec<ListId> {
        self.item_lists_with_depth(list).into_values().flatten().collect()
    }

    pub fn all_item_lists_including_self(&self, list: ListId) -> Vec<ListId> {
        let mut lists = vec![list];
        lists.extend(self.all_item_lists(list));
        lists
    }

    pub fn items_at_depth(&self, list: ListId, depth: usize) -> Result<Vec<ItemId>, MenuError> {
        self.items_at_depth_range(list, depth, depth)
    }

    /// Items whose depth lies in `from..=to`.
    pub fn items_at_depth_range(
        &self,
        list: ListId,
        from: usize,
        to: usize,
    ) -> Result<Vec<ItemId>, MenuError> {
        check_depth_range(from, to)?;
        Ok(self
            .items_with_depth(list)
            .range(from..=to)
            .flat_map(|(_, items)| items.iter().copied())
            .collect())
    }

    pub fn item_lists_at_depth(&self, list: ListId, depth: usize) -> Result<Vec<ListId>, MenuError> {
        self.item_lists_at_depth_range(list, depth, depth)
    }

    pub fn item_lists_at_depth_range(
        &self,
        list: ListId,
        from: usize,
        to: usize,
    ) -> Result<Vec<ListId>, MenuError> {
        check_depth_range(from, to)?;
        Ok(self
            .item_lists_with_depth(list)
            .range(from..=to)
            .flat_map(|(_, lists)| lists.iter().copied())
            .collect())
    }

    pub fn items_by_content_type(&self, list: ListId, kind: ContentKind) -> Vec<ItemId> {
        self.all_items(list)
            .into_iter()
            .filter(|&item| self.items[item.0].content.kind() == kind)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Item lookups
    // ------------------------------------------------------------------------

    /// First link whose raw (unprefixed) URL is `url`.
    pub fn find_item_by_url(&self, list: ListId, url: &str) -> Option<ItemId> {
        self.items_preorder(list).into_iter().find(|&item| {
            self.items[item.0]
                .content
                .as_link()
                .is_some_and(|link| link.url() == url)
        })
    }

    /// First item whose own element carries `key="value"`.
    pub fn find_item_by_attribute(&self, list: ListId, key: &str, value: &str) -> Option<ItemId> {
        self.items_preorder(list)
            .into_iter()
            .find(|&item| self.items[item.0].attributes.get(key) == Some(value))
    }

    /// Every active item below `list`, in depth-first order.
    pub fn active_items(&self, list: ListId, location: &Location) -> Vec<ItemId> {
        self.items_preorder(list)
            .into_iter()
            .filter(|&item| self.is_active(item, location))
            .collect()
    }

    pub fn find_active_item(&self, list: ListId, location: &Location) -> Option<ItemId> {
        self.items_preorder(list)
            .into_iter()
            .find(|&item| self.is_active(item, location))
    }

    // ------------------------------------------------------------------------
    // Breadcrumbs
    // ------------------------------------------------------------------------

    /// Breadcrumbs for the first active item below `list`.
    pub fn breadcrumbs(&mut self, list: ListId, location: &Location) -> ListId {
        self.breadcrumbs_with(list, location, |_, active| active.first().copied())
    }

    /// Breadcrumbs for the active item picked by `choose` among every active item.
    ///
    /// The trail runs from the item in `list` down to the chosen item. Links
    /// keep the href they had in the menu, and the configured separator (if
    /// any) is placed between entries as raw markup. The returned list is
    /// standalone and empty when nothing is active.
    pub fn breadcrumbs_with(
        &mut self,
        list: ListId,
        location: &Location,
        choose: impl FnOnce(&MenuTree, &[ItemId]) -> Option<ItemId>,
    ) -> ListId {
        let active = self.active_items(list, location);
        let chosen = choose(self, &active);

        let mut trail = Vec::new();
        let mut current = chosen;
        while let Some(item) = current {
            let node = &self.items[item.0];
            trail.push(match &node.content {
                ContentNode::Link(link) => detached_link(link, self.evaluated_url(item)),
                raw => raw.clone(),
            });
            current = if node.list == list {
                None
            } else {
                self.lists[node.list.0].parent_item
            };
        }
        trail.reverse();
        tracing::debug!("Breadcrumb trail of {} entries for {:?}", trail.len(), location.path);

        let separator = self.config.item_list.breadcrumb_separator.clone();
        let crumbs = self
            .create_list(None)
            .prefix("")
            .prefix_parents(false)
            .prefix_handler(false)
            .id();
        for (index, content) in trail.into_iter().enumerate() {
            if index > 0 {
                if let Some(separator) = &separator {
                    self.append_plain_item(crumbs, ContentNode::raw(separator.clone()));
                }
            }
            self.append_plain_item(crumbs, content);
        }
        crumbs
    }

    // ------------------------------------------------------------------------
    // Hydrate
    // ------------------------------------------------------------------------

    /// Build a nested menu from flat records with parent pointers.
    ///
    /// Records whose parent is `root` are handed to `decorator` with `list`;
    /// the decorator is expected to add one item per record. Records whose
    /// parent is a given record are then handed over with that item's child
    /// list, created on demand. A record reachable from itself is rejected
    /// before anything is added, so a failed hydrate leaves the tree as it was.
    pub fn hydrate<R, K>(
        &mut self,
        list: ListId,
        resolver: impl FnOnce() -> Vec<R>,
        mut decorator: impl FnMut(ListMut<'_>, &R),
        id_of: impl Fn(&R) -> K,
        parent_of: impl Fn(&R) -> K,
        root: K,
    ) -> Result<(), MenuError>
    where
        K: PartialEq + Clone + Debug,
    {
        let records = resolver();
        tracing::debug!("Hydrating list {} from {} records", list, records.len());
        check_record_loops(&records, &id_of, &parent_of, &root, &mut vec![root.clone()])?;
        self.hydrate_level(
            list,
            &records,
            &mut decorator,
            &id_of,
            &parent_of,
            &root,
        )
    }

    /// [`MenuTree::hydrate`] over JSON objects, keyed by field names.
    ///
    /// A record missing a field is treated as having `null` there.
    pub fn hydrate_json(
        &mut self,
        list: ListId,
        records: &[Value],
        id_field: &str,
        parent_field: &str,
        root: Value,
        decorator: impl FnMut(ListMut<'_>, &Value),
    ) -> Result<(), MenuError> {
        self.hydrate(
            list,
            || records.to_vec(),
            decorator,
            |record| record.get(id_field).cloned().unwrap_or(Value::Null),
            |record| record.get(parent_field).cloned().unwrap_or(Value::Null),
            root,
        )
    }

    fn hydrate_level<R, K>(
        &mut self,
        list: ListId,
        records: &[R],
        decorator: &mut dyn FnMut(ListMut<'_>, &R),
        id_of: &dyn Fn(&R) -> K,
        parent_of: &dyn Fn(&R) -> K,
        parent: &K,
    ) -> Result<(), MenuError>
    where
        K: PartialEq + Clone + Debug,
    {
        for record in records.iter().filter(|r| parent_of(r) == *parent) {
            let before = self.lists[list.0].items.len();
            decorator(self.list_mut(list), record);
            if self.lists[list.0].items.len() == before {
                continue;
            }
            let Some(&item) = self.lists[list.0].items.last() else {
                continue;
            };

            let id = id_of(record);
            if !records.iter().any(|r| parent_of(r) == id) {
                continue;
            }

            let children = match self.items[item.0].children {
                Some(children) => children,
                None => {
                    let children = self.create_list(None).id();
                    self.set_children(item, Some(children))?;
                    children
                }
            };
            self.hydrate_level(children, records, decorator, id_of, parent_of, &id)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Walks
    // ------------------------------------------------------------------------

    fn collect_items(&self, list: ListId, depth: usize, out: &mut BTreeMap<usize, Vec<ItemId>>) {
        for &item in &self.lists[list.0].items {
            out.entry(depth).or_default().push(item);
            if let Some(children) = self.items[item.0].children {
                self.collect_items(children, depth + 1, out);
            }
        }
    }

    fn collect_lists(&self, list: ListId, depth: usize, out: &mut BTreeMap<usize, Vec<ListId>>) {
        for &item in &self.lists[list.0].items {
            if let Some(children) = self.items[item.0].children {
                out.entry(depth).or_default().push(children);
                self.collect_lists(children, depth + 1, out);
            }
        }
    }

    /// `list` followed by every nested list, depth-first.
    fn lists_preorder(&self, list: ListId) -> Vec<ListId> {
        let mut out = vec![list];
        for &item in &self.lists[list.0].items {
            if let Some(children) = self.items[item.0].children {
                out.extend(self.lists_preorder(children));
            }
        }
        out
    }

    /// Every item below `list`, each followed by its descendants.
    pub(crate) fn items_preorder(&self, list: ListId) -> Vec<ItemId> {
        let mut out = Vec::new();
        for &item in &self.lists[list.0].items {
            out.push(item);
            if let Some(children) = self.items[item.0].children {
                out.extend(self.items_preorder(children));
            }
        }
        out
    }
}

fn check_depth_range(from: usize, to: usize) -> Result<(), MenuError> {
    if from == 0 {
        return Err(MenuError::InvalidArgument(
            "depths start at 1 (the list's own items)".into(),
        ));
    }
    if from > to {
        return Err(MenuError::InvalidArgument(format!(
            "depth range {from}..={to} is empty"
        )));
    }
    Ok(())
}

/// Walk the record hierarchy below `parent`, failing on the first record
/// that is its own ancestor. `path` holds the ids from the root down.
fn check_record_loops<R, K>(
    records: &[R],
    id_of: &dyn Fn(&R) -> K,
    parent_of: &dyn Fn(&R) -> K,
    parent: &K,
    path: &mut Vec<K>,
) -> Result<(), MenuError>
where
    K: PartialEq + Clone + Debug,
{
    for record in records.iter().filter(|r| parent_of(r) == *parent) {
        let id = id_of(record);
        if path.contains(&id) {
            return Err(MenuError::InvalidArgument(format!(
                "record {id:?} is its own ancestor"
            )));
        }
        path.push(id.clone());
        check_record_loops(records, id_of, parent_of, &id, path)?;
        path.pop();
    }
    Ok(())
}
