//! # Simple Menu
//!
//! Hierarchical navigation menus for server-rendered sites. Callers build
//! nested lists of links and raw markup, and the crate works out which entry
//! is active for the current request and renders the whole tree to
//! `<ul>/<li>/<a>` markup.
//!
//! # Architecture: Build, Resolve, Render
//!
//! ```text
//! 1. Build     Menu / MenuTree     add, raw, attach, prefix, nest lists
//! 2. Resolve   Location            evaluated URLs, active and active-child state
//! 3. Render    Markup              recursive <ul>/<li>/<a>, depth-limited
//! ```
//!
//! Building mutates the tree. Resolving and rendering are pure functions of
//! the tree plus a [`Location`] snapshot taken once per render, so every item
//! in one pass is compared against the same request.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`tree`] | Arena of lists and items, builders, URL prefixing, active state, queries, breadcrumbs, hydration |
//! | [`render`] | Recursive rendering with depth limits and active classes |
//! | [`registry`] | [`Menu`]: named root lists created on first use |
//! | [`handler`] | [`MenuHandler`]: one operation fanned out over several lists or items |
//! | [`attributes`] | Ordered HTML attribute sets with class merging |
//! | [`content`] | Link and raw-markup payloads |
//! | [`request`] | The current request as seen by active-state resolution |
//! | [`config`] | `menu.toml` loading, validation, and merging |
//! | [`outline`] | Plain-text outlines of menus for debugging |
//! | [`error`] | Error type shared by every fallible operation |
//!
//! # Design Decisions
//!
//! ## Handles Instead of References
//!
//! Items own their child lists and lists keep a back-pointer to their parent
//! item for URL prefixing. Rather than shared pointers, every list and item
//! lives in one arena and refers to the others by index. The tree can be
//! serialized as is, and nesting a list inside its own subtree is rejected
//! when it is attempted instead of overflowing the stack at render time.
//!
//! ## Options Inherit Downward
//!
//! A list's prefix options and depth limit apply to every list nested below
//! it that does not set its own, with the config as the last fallback. One
//! `prefix_parents(true)` on a root list therefore prefixes the whole tree.
//!
//! ## Typed Fan-Out
//!
//! A [`MenuHandler`] runs one [`handler::Operation`] over several targets.
//! How per-target results combine is a property of the operation (mutate,
//! flatten, first match, concatenate, group by depth), so the whole policy
//! table is checked at compile time.
//!
//! ## Maud Markup
//!
//! Rendering returns [`maud::Markup`], so menus drop straight into Maud
//! templates. Labels and attribute values are escaped; raw content is not.

pub mod attributes;
pub mod config;
pub mod content;
pub mod error;
pub mod handler;
pub mod outline;
pub mod registry;
pub mod render;
pub mod request;
pub mod tree;

pub use attributes::AttributeSet;
pub use config::MenuConfig;
pub use content::{ContentKind, ContentNode, Link, Raw};
pub use error::MenuError;
pub use handler::{MenuHandler, Operation, Response, Target};
pub use registry::{DEFAULT_MENU, Menu};
pub use request::{Location, RequestContext};
pub use tree::{ItemId, ListId, MenuTree, NewItem};

#[cfg(test)]
pub(crate) mod test_helpers;
