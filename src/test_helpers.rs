//! Shared test utilities for the simple-menu test suite.
//!
//! Provides a fixture menu, lookup helpers that panic with a clear message on
//! miss, and a shape assertion for whole trees.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (root, tree) = sample_tree();
//! let widgets = item_by_url(&tree, root, "widgets");
//! assert_eq!(label(&tree, widgets), "Widgets");
//!
//! assert_menu_shape(&tree, root, &[
//!     ("Home", &[]),
//!     ("Products", &["Widgets", "Gadgets"]),
//!     ("About", &[]),
//! ]);
//! ```

use crate::content::ContentNode;
use crate::registry::Menu;
use crate::tree::{ItemId, ListId, MenuTree};

// =========================================================================
// Fixtures
// =========================================================================

/// Build the sample menu into `list`:
///
/// ```text
/// main
/// ├── Home          home
/// ├── Products      products
/// │   ├── Widgets   products/widgets      (list "products", prefix_parents)
/// │   │   └── Blue widgets   products/widgets/blue
/// │   └── Gadgets   products/gadgets
/// └── About         about
/// ```
fn build_sample(tree: &mut MenuTree, list: ListId) {
    tree.list_mut(list)
        .add("home", "Home")
        .add_with("products", "Products", |products| {
            products
                .name(Some("products"))
                .prefix_parents(true)
                .add_with("widgets", "Widgets", |widgets| {
                    widgets.add("blue", "Blue widgets");
                })
                .add("gadgets", "Gadgets");
        })
        .add("about", "About");
}

/// A standalone tree holding the sample menu. Returns its root list.
pub fn sample_tree() -> (ListId, MenuTree) {
    let mut tree = MenuTree::default();
    let root = tree.create_list(Some("main")).id();
    build_sample(&mut tree, root);
    (root, tree)
}

/// A registry with the sample menu registered as `main`.
pub fn sample_menu() -> (Menu, ListId) {
    let mut menu = Menu::default();
    let root = menu.handler(&["main"]).lists()[0];
    build_sample(menu.tree_mut(), root);
    (menu, root)
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find an item by its raw URL anywhere below `list`. Panics if not found.
pub fn item_by_url(tree: &MenuTree, list: ListId, url: &str) -> ItemId {
    tree.find_item_by_url(list, url).unwrap_or_else(|| {
        let urls: Vec<&str> = tree
            .items_preorder(list)
            .into_iter()
            .filter_map(|i| tree.item(i).content().as_link().map(|l| l.url()))
            .collect();
        panic!("item with url '{url}' not found. Available: {urls:?}")
    })
}

/// Label of a link, or the markup of raw content.
pub fn label(tree: &MenuTree, item: ItemId) -> &str {
    match tree.item(item).content() {
        ContentNode::Link(link) => link.label(),
        ContentNode::Raw(raw) => raw.markup(),
    }
}

/// Labels of `items`, in order.
pub fn labels<'a>(tree: &'a MenuTree, items: &[ItemId]) -> Vec<&'a str> {
    items.iter().map(|&item| label(tree, item)).collect()
}

// =========================================================================
// Shape assertions
// =========================================================================

/// Assert the labels of `list`'s items and of their direct children.
///
/// Each entry is `(label, children)`. Use `&[]` for items without children.
pub fn assert_menu_shape(tree: &MenuTree, list: ListId, expected: &[(&str, &[&str])]) {
    let items = tree.list(list).items();
    let expected_labels: Vec<&str> = expected.iter().map(|(l, _)| *l).collect();
    assert_eq!(labels(tree, items), expected_labels, "top-level labels mismatch");

    for (&item, (title, children)) in items.iter().zip(expected) {
        let actual: Vec<&str> = tree
            .item(item)
            .children()
            .map(|c| labels(tree, tree.list(c).items()))
            .unwrap_or_default();
        assert_eq!(actual, children.to_vec(), "children of '{title}' mismatch");
    }
}
