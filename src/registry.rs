//! Registry of named menus.
//!
//! A [`Menu`] owns one [`MenuTree`] and maps names to the root lists built in
//! it. Asking a handler for a name creates the list on first use, so
//! templates can refer to `"main"` or `"footer"` without any setup step:
//!
//! ```rust
//! use simple_menu::{Location, Menu, MenuConfig};
//!
//! let mut menu = Menu::new(MenuConfig::default());
//! let main = menu.handler(&["main"]).lists()[0];
//! menu.tree_mut().list_mut(main).add("home", "Home");
//!
//! let html = menu.render(&["main"], &Location::from_path("home")).unwrap();
//! assert!(html.into_string().contains(r#"class="active""#));
//! ```
//!
//! The registry is an ordinary value. Keep one per request or per
//! application context; nothing here is global.

use crate::attributes::AttributeSet;
use crate::config::{self, MenuConfig};
use crate::error::MenuError;
use crate::handler::{MenuHandler, Operation, Response, Target};
use crate::request::{Location, RequestContext};
use crate::tree::{ListId, ListMut, MenuTree, checked_element};
use maud::Markup;
use std::path::Path;

/// Name used when a caller does not pick one.
pub const DEFAULT_MENU: &str = "";

#[derive(Debug, Clone)]
pub struct Menu {
    tree: MenuTree,
    names: Vec<(String, ListId)>,
}

impl Default for Menu {
    fn default() -> Self {
        Self::new(MenuConfig::default())
    }
}

impl Menu {
    pub fn new(config: MenuConfig) -> Self {
        tracing::debug!("Creating menu registry (max_depth = {})", config.max_depth);
        Self {
            tree: MenuTree::new(config),
            names: Vec::new(),
        }
    }

    /// Create a registry configured from `menu.toml` in `dir`, or stock defaults.
    pub fn from_config_dir(dir: &Path) -> Result<Self, MenuError> {
        Ok(Self::new(config::load_config(dir)?))
    }

    pub fn tree(&self) -> &MenuTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut MenuTree {
        &mut self.tree
    }

    pub fn config(&self) -> &MenuConfig {
        self.tree.config()
    }

    // ------------------------------------------------------------------------
    // Handlers
    // ------------------------------------------------------------------------

    /// Handler over the lists registered under `names`, creating missing ones.
    pub fn handler(&mut self, names: &[&str]) -> MenuHandler {
        let lists = names
            .iter()
            .map(|name| match self.lookup(name) {
                Some(list) => list,
                None => self.register_new(name),
            })
            .collect::<Vec<_>>();
        MenuHandler::from_lists(lists)
    }

    /// Like [`Menu::handler`], with `attributes` and `element` applied to lists created here.
    pub fn handler_with(
        &mut self,
        names: &[&str],
        attributes: AttributeSet,
        element: Option<&str>,
    ) -> Result<MenuHandler, MenuError> {
        let element = element.map(checked_element).transpose()?;
        let mut lists = Vec::with_capacity(names.len());
        for name in names {
            let list = match self.lookup(name) {
                Some(list) => list,
                None => {
                    let list = self.register_new(name);
                    self.tree
                        .list_mut(list)
                        .attributes(attributes.clone())
                        .element(element.as_deref())?;
                    list
                }
            };
            lists.push(list);
        }
        Ok(MenuHandler::from_lists(lists))
    }

    /// Handler over the unnamed default menu.
    pub fn default_handler(&mut self) -> MenuHandler {
        self.handler(&[DEFAULT_MENU])
    }

    /// Handler over every registered list, in registration order.
    pub fn all(&self) -> MenuHandler {
        MenuHandler::from_lists(self.names.iter().map(|(_, list)| *list))
    }

    // ------------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------------

    /// A standalone list for sub-menus. It is not registered under any name.
    pub fn items(&mut self, name: Option<&str>) -> ListMut<'_> {
        self.tree.create_list(name)
    }

    /// Like [`Menu::items`], with attributes and element set up front.
    pub fn items_with(
        &mut self,
        name: Option<&str>,
        attributes: AttributeSet,
        element: Option<&str>,
    ) -> Result<ListMut<'_>, MenuError> {
        self.tree
            .create_list(name)
            .attributes(attributes)
            .element(element)
    }

    /// The list registered under `name`. Never creates one.
    pub fn item_list(&self, name: &str) -> Result<ListId, MenuError> {
        self.lookup(name)
            .ok_or_else(|| MenuError::UnregisteredName(name.to_string()))
    }

    pub fn item_list_mut(&mut self, name: &str) -> Result<ListMut<'_>, MenuError> {
        let list = self.item_list(name)?;
        Ok(self.tree.list_mut(list))
    }

    /// Register `list` under `name`, replacing any list registered there before.
    pub fn set_item_list(&mut self, name: &str, list: ListId) {
        match self.names.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = list,
            None => self.names.push((name.to_string(), list)),
        }
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.names.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Forget every name and drop every list.
    pub fn reset(&mut self) {
        tracing::debug!("Resetting menu registry ({} names)", self.names.len());
        self.names.clear();
        self.tree.clear();
    }

    // ------------------------------------------------------------------------
    // Find
    // ------------------------------------------------------------------------

    /// Every list named in `names` below the handler's targets.
    ///
    /// Fails with [`MenuError::NotFound`] naming every name that matched
    /// nothing; the registry is left untouched in that case. On success the
    /// found lists are registered under their names and returned as a handler.
    pub fn find(&mut self, handler: &MenuHandler, names: &[&str]) -> Result<MenuHandler, MenuError> {
        let mut roots: Vec<ListId> = Vec::new();
        for &target in handler.targets() {
            match target {
                Target::List(list) => {
                    self.tree.check_list(list)?;
                    roots.push(list);
                }
                Target::Item(item) => {
                    self.tree.check_item(item)?;
                    roots.extend(self.tree.item(item).children());
                }
            }
        }

        let mut found = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            let matches: Vec<ListId> = roots
                .iter()
                .flat_map(|&root| self.tree.find(root, &[*name]))
                .collect();
            if matches.is_empty() {
                missing.push(name.to_string());
            }
            found.extend(matches);
        }
        tracing::debug!(
            "find {:?}: {} lists found, {} names missing",
            names,
            found.len(),
            missing.len()
        );
        if !missing.is_empty() {
            return Err(MenuError::NotFound { names: missing });
        }

        for &list in &found {
            if let Some(name) = self.tree.list(list).name().map(String::from) {
                self.set_item_list(&name, list);
            }
        }
        Ok(MenuHandler::from_lists(found))
    }

    // ------------------------------------------------------------------------
    // Dispatch and render
    // ------------------------------------------------------------------------

    pub fn dispatch(&mut self, handler: &MenuHandler, operation: Operation) -> Result<Response, MenuError> {
        handler.dispatch(&mut self.tree, operation)
    }

    /// Render the menus registered under `names`, creating missing (empty) ones.
    pub fn render(&mut self, names: &[&str], location: &Location) -> Result<Markup, MenuError> {
        let handler = self.handler(names);
        handler.render(&mut self.tree, location)
    }

    /// Render against a live request, captured once for the whole pass.
    pub fn render_request(
        &mut self,
        names: &[&str],
        request: &dyn RequestContext,
    ) -> Result<Markup, MenuError> {
        self.render(names, &Location::capture(request))
    }

    /// Breadcrumbs for the menu registered under `name`.
    pub fn breadcrumbs(&mut self, name: &str, location: &Location) -> Result<ListId, MenuError> {
        let list = self.item_list(name)?;
        Ok(self.tree.breadcrumbs(list, location))
    }

    fn lookup(&self, name: &str) -> Option<ListId> {
        self.names
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, list)| *list)
    }

    fn register_new(&mut self, name: &str) -> ListId {
        let list = self.tree.create_list(Some(name).filter(|n| !n.is_empty())).id();
        tracing::debug!("Registering menu {:?} as list {}", name, list);
        self.names.push((name.to_string(), list));
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn handler_creates_on_first_use_and_reuses() {
        let mut menu = Menu::default();
        let first = menu.handler(&["main", "footer"]);
        let again = menu.handler(&["footer", "main"]);
        assert_eq!(first.lists().len(), 2);
        assert_eq!(again.lists(), vec![first.lists()[1], first.lists()[0]]);
        assert_eq!(menu.names(), vec!["main", "footer"]);
        assert_eq!(menu.tree().list(first.lists()[0]).name(), Some("main"));
    }

    #[test]
    fn default_menu_is_unnamed() {
        let mut menu = Menu::default();
        let handler = menu.default_handler();
        assert!(menu.contains(DEFAULT_MENU));
        assert_eq!(menu.tree().list(handler.lists()[0]).name(), None);
    }

    #[test]
    fn handler_with_only_configures_new_lists() {
        let mut menu = Menu::default();
        menu.handler(&["main"]);
        let handler = menu
            .handler_with(&["main", "side"], AttributeSet::from([("class", "nav")]), Some("ol"))
            .unwrap();
        let lists = handler.lists();
        let (main, side) = (lists[0], lists[1]);
        assert!(menu.tree().list(main).attributes().is_empty());
        assert_eq!(menu.tree().list(main).element(), Some("ul"));
        assert_eq!(menu.tree().list(side).attributes().get("class"), Some("nav"));
        assert_eq!(menu.tree().list(side).element(), Some("ol"));
    }

    #[test]
    fn handler_with_invalid_element_registers_nothing() {
        let mut menu = Menu::default();
        let result = menu.handler_with(
            &["side"],
            AttributeSet::from([("class", "nav")]),
            Some("ul class=x"),
        );
        assert!(matches!(result, Err(MenuError::InvalidArgument(_))));
        assert!(!menu.contains("side"));
        assert_eq!(menu.tree().list_count(), 0);
    }

    #[test]
    fn items_are_not_registered() {
        let mut menu = Menu::default();
        let list = menu.items(Some("sub")).add("a", "A").id();
        assert!(!menu.contains("sub"));
        assert_eq!(menu.tree().list(list).items().len(), 1);
    }

    #[test]
    fn item_list_never_creates() {
        let mut menu = Menu::default();
        assert!(matches!(menu.item_list("ghost"), Err(MenuError::UnregisteredName(_))));
        menu.handler(&["real"]);
        assert!(menu.item_list("real").is_ok());
        assert!(!menu.contains("ghost"));
    }

    #[test]
    fn set_item_list_replaces() {
        let mut menu = Menu::default();
        menu.handler(&["main"]);
        let replacement = menu.items(None).add("x", "X").id();
        menu.set_item_list("main", replacement);
        assert_eq!(menu.item_list("main").unwrap(), replacement);
        assert_eq!(menu.names(), vec!["main"]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut menu = Menu::default();
        let main = menu.handler(&["main"]).lists()[0];
        menu.tree_mut().list_mut(main).add("a", "A");
        menu.reset();
        assert!(menu.names().is_empty());
        assert_eq!(menu.tree().list_count(), 0);
        assert_eq!(menu.tree().item_count(), 0);
    }

    #[test]
    fn handler_from_before_reset_is_rejected() {
        let mut menu = Menu::default();
        let stale = menu.handler(&["main"]);
        menu.tree_mut().list_mut(stale.lists()[0]).add("a", "A");
        menu.reset();
        let footer = menu.handler(&["footer"]);
        menu.tree_mut().list_mut(footer.lists()[0]).add("legal", "Legal");

        let result = stale.render(menu.tree_mut(), &Location::default());
        assert!(matches!(result, Err(MenuError::StaleHandle(_))));
        assert!(matches!(
            menu.dispatch(&stale, Operation::AddClass("x".into())),
            Err(MenuError::StaleHandle(_))
        ));
        assert!(matches!(menu.find(&stale, &["main"]), Err(MenuError::StaleHandle(_))));
        assert!(menu.tree().list(footer.lists()[0]).attributes().is_empty());
        assert_ne!(stale.lists()[0], footer.lists()[0]);
    }

    #[test]
    fn all_spans_every_registered_list() {
        let mut menu = Menu::default();
        menu.handler(&["a", "b", "c"]);
        assert_eq!(menu.all().len(), 3);
    }

    // =========================================================================
    // find
    // =========================================================================

    #[test]
    fn find_registers_nested_lists() {
        let mut menu = Menu::default();
        let main = menu.handler(&["main"]);
        let root = main.lists()[0];
        menu.tree_mut().list_mut(root).add_with("docs", "Docs", |c| {
            c.name(Some("docs-menu")).add("intro", "Intro");
        });
        let found = menu.find(&main, &["docs-menu"]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(menu.item_list("docs-menu").unwrap(), found.lists()[0]);
    }

    #[test]
    fn find_missing_names_fails_without_side_effects() {
        let mut menu = Menu::default();
        let main = menu.handler(&["main"]);
        let root = main.lists()[0];
        menu.tree_mut().list_mut(root).add_with("docs", "Docs", |c| {
            c.name(Some("docs-menu"));
        });
        let err = menu.find(&main, &["docs-menu", "missing", "gone"]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing"));
        assert!(message.contains("gone"));
        assert!(!message.contains("docs-menu"));
        assert!(!menu.contains("docs-menu"));
        assert_eq!(menu.item_list("main").unwrap(), root);
    }

    // =========================================================================
    // Render and config
    // =========================================================================

    #[test]
    fn render_marks_active_item() {
        let mut menu = Menu::default();
        let main = menu.handler(&["main"]).lists()[0];
        menu.tree_mut().list_mut(main).add("shop/cart", "Cart").add("shop", "Shop");
        let html = menu
            .render(&["main"], &Location::from_url("https://example.com/shop/cart?x=1"))
            .unwrap()
            .into_string();
        assert!(html.contains(r#"<li class="active"><a href="shop/cart">Cart</a></li>"#));
        assert!(html.contains(r#"<li><a href="shop">Shop</a></li>"#));
    }

    #[test]
    fn render_request_captures_location() {
        let mut menu = Menu::default();
        let main = menu.handler(&["main"]).lists()[0];
        menu.tree_mut().list_mut(main).add("about", "About");
        let html = menu
            .render_request(&["main"], &Location::from_path("/about/"))
            .unwrap()
            .into_string();
        assert!(html.contains("active"));
    }

    #[test]
    fn breadcrumbs_by_name() {
        let (mut menu, _) = sample_menu();
        let crumbs = menu
            .breadcrumbs("main", &Location::from_path("products/gadgets"))
            .unwrap();
        assert_eq!(labels(menu.tree(), menu.tree().list(crumbs).items()), vec!["Products", "Gadgets"]);
        assert!(menu.breadcrumbs("ghost", &Location::default()).is_err());
    }

    #[test]
    fn from_config_dir_uses_menu_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("menu.toml"), "[item_list]\nelement = \"ol\"\n").unwrap();
        let mut menu = Menu::from_config_dir(tmp.path()).unwrap();
        let html = menu.render(&["main"], &Location::default()).unwrap().into_string();
        assert_eq!(html, "<ol></ol>");
    }

    #[test]
    fn from_config_dir_rejects_invalid_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("menu.toml"), "[item]\nactive_class = \"\"\n").unwrap();
        assert!(matches!(Menu::from_config_dir(tmp.path()), Err(MenuError::Config(_))));
    }
}
