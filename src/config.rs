//! Menu configuration.
//!
//! Handles loading, validating, and merging `menu.toml` files. Stock defaults
//! are overridden by whatever keys a user file provides; everything else keeps
//! its default.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! max_depth = 0                 # Deepest list level rendered (0 = no limit)
//!
//! [item]
//! element = "li"                # Element wrapping each item ("" = none)
//! active_class = "active"       # Added to the item matching the request
//! active_child_class = "active-child"
//!
//! [item_list]
//! element = "ul"                # Element wrapping each list ("" = none)
//! # prefix = "admin"            # Prepended to every link in new lists
//! prefix_parents = false        # Prepend ancestor item URLs
//! prefix_handler = false        # Prepend the root list's name
//! # breadcrumb_separator = "/"  # Raw markup placed between breadcrumbs
//!
//! [link]
//! special_prefixes = ["#", "javascript:"]
//! ```
//!
//! Elements are applied when a list or item is created. The prefix options
//! and `max_depth` are fallbacks: they take effect for a list only when
//! neither it nor any list above it sets its own value.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up by [`load_config`].
pub const CONFIG_FILE: &str = "menu.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Menu configuration loaded from `menu.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MenuConfig {
    /// Deepest render depth allowed when no list sets its own limit. `0` means no limit.
    pub max_depth: usize,
    /// Defaults for new items.
    pub item: ItemConfig,
    /// Defaults for new item lists.
    pub item_list: ItemListConfig,
    /// Link behaviour.
    pub link: LinkConfig,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            max_depth: 0,
            item: ItemConfig::default(),
            item_list: ItemListConfig::default(),
            link: LinkConfig::default(),
        }
    }
}

impl MenuConfig {
    /// Validate config values are usable as markup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_element("item.element", &self.item.element)?;
        validate_element("item_list.element", &self.item_list.element)?;
        validate_class("item.active_class", &self.item.active_class)?;
        validate_class("item.active_child_class", &self.item.active_child_class)?;
        if self.link.special_prefixes.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::Validation(
                "link.special_prefixes must not contain empty strings".into(),
            ));
        }
        Ok(())
    }

    /// The render depth limit, or `None` when unlimited.
    pub fn depth_limit(&self) -> Option<usize> {
        (self.max_depth != 0).then_some(self.max_depth)
    }
}

/// Item defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ItemConfig {
    /// Element wrapping each item. Empty for no wrapping element.
    pub element: String,
    /// Class added to an item whose link matches the current request.
    pub active_class: String,
    /// Class added to an item with an active descendant.
    pub active_child_class: String,
}

impl Default for ItemConfig {
    fn default() -> Self {
        Self {
            element: "li".to_string(),
            active_class: "active".to_string(),
            active_child_class: "active-child".to_string(),
        }
    }
}

/// Item list defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ItemListConfig {
    /// Element wrapping each list. Empty for no wrapping element.
    pub element: String,
    /// Segment prepended to every link URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Prepend the URLs of ancestor items.
    pub prefix_parents: bool,
    /// Prepend the name of the root list.
    pub prefix_handler: bool,
    /// Raw markup inserted between breadcrumb entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breadcrumb_separator: Option<String>,
}

impl Default for ItemListConfig {
    fn default() -> Self {
        Self {
            element: "ul".to_string(),
            prefix: None,
            prefix_parents: false,
            prefix_handler: false,
            breadcrumb_separator: None,
        }
    }
}

/// Link behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkConfig {
    /// URLs starting with any of these are never prefixed nor matched as active.
    /// Compared case-insensitively.
    pub special_prefixes: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            special_prefixes: vec!["#".to_string(), "javascript:".to_string()],
        }
    }
}

/// Convert a configured element name to the optional form the tree stores.
pub fn element_or_none(element: &str) -> Option<String> {
    (!element.is_empty()).then(|| element.to_string())
}

/// Check that `element` is a plain tag name (or empty, meaning none).
pub fn is_valid_element(element: &str) -> bool {
    element
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
        && !element.starts_with('-')
}

fn validate_element(key: &str, element: &str) -> Result<(), ConfigError> {
    if is_valid_element(element) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{key} must be a tag name, got {element:?}"
        )))
    }
}

fn validate_class(key: &str, class: &str) -> Result<(), ConfigError> {
    if class.is_empty() || class.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "{key} must be a single non-empty class name"
        )));
    }
    Ok(())
}

// =============================================================================
// Loading: stock defaults, then the application's menu.toml on top
// =============================================================================

/// [`MenuConfig::default`] as a TOML table, the bottom layer every
/// application `menu.toml` is merged onto.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(MenuConfig::default()).expect("default config must serialize")
}

/// Lay `overlay` over `base`. Sections such as `[item]` merge per key, so a
/// `menu.toml` that only sets `item.active_class` keeps the stock `item.element`.
/// Any other value in `overlay` wins outright.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    let toml::Value::Table(overlay_table) = overlay else {
        return overlay;
    };
    let toml::Value::Table(mut merged) = base else {
        return toml::Value::Table(overlay_table);
    };
    for (key, value) in overlay_table {
        let value = match merged.remove(&key) {
            Some(existing) => merge_toml(existing, value),
            None => value,
        };
        merged.insert(key, value);
    }
    toml::Value::Table(merged)
}

/// The application's `menu.toml` in `dir`, parsed but not yet checked
/// against [`MenuConfig`]. `None` when the application ships no menu config.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let file = dir.join(CONFIG_FILE);
    if !file.exists() {
        return Ok(None);
    }
    Ok(Some(toml::from_str(&fs::read_to_string(&file)?)?))
}

/// Apply the application's layer (if any) to `base` and turn the result into
/// a validated [`MenuConfig`]. Keys the menu does not know are rejected here.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MenuConfig, ConfigError> {
    let layered = match overlay {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: MenuConfig = layered.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Menu settings for an application rooted at `dir`: stock defaults with
/// its `menu.toml`, when present, layered on top.
pub fn load_config(dir: &Path) -> Result<MenuConfig, ConfigError> {
    resolve_config(stock_defaults_value(), load_raw_config(dir)?)
}

/// Returns a fully-commented stock `menu.toml` with all keys and explanations.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Menu Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Deepest list level rendered. Lists nested deeper produce no markup at all.
# 0 means no limit.
max_depth = 0

# ---------------------------------------------------------------------------
# Items
# ---------------------------------------------------------------------------
[item]
# Element wrapping each item. Use "" to render items without a wrapper.
element = "li"

# Class added to the item whose link matches the current request.
active_class = "active"

# Class added to items that contain the active item somewhere below them.
active_child_class = "active-child"

# ---------------------------------------------------------------------------
# Item lists
# ---------------------------------------------------------------------------
[item_list]
# Element wrapping each list. Use "" to render lists without a wrapper.
element = "ul"

# Segment prepended to every link URL of new lists.
# prefix = "admin"

# Prepend the URLs of the items a list is nested under.
prefix_parents = false

# Prepend the name of the list at the very top of the tree.
prefix_handler = false

# Raw markup inserted between breadcrumb entries.
# breadcrumb_separator = "/"

# ---------------------------------------------------------------------------
# Links
# ---------------------------------------------------------------------------
[link]
# URLs starting with one of these are rendered as-is: never prefixed and
# never compared against the current request.
special_prefixes = ["#", "javascript:"]
"##
}
