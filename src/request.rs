//! The current request, as seen by active-state resolution.
//!
//! The host application implements [`RequestContext`] over whatever request
//! type its framework provides. Rendering captures a [`Location`] snapshot
//! once per call and passes it down the whole tree, so every item is compared
//! against the same values even if the host's request object is mutable.

use serde::Serialize;

/// Read-only view of the request a menu is rendered for.
pub trait RequestContext {
    /// Path component only, e.g. `shop/cart`.
    fn current_path(&self) -> String;
    /// Full URL including scheme, host, and query string.
    fn current_url(&self) -> String;
    /// Full URL without the query string.
    fn current_bare_url(&self) -> String;
}

/// Snapshot of a request used for one render or query pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    /// Path with leading and trailing slashes trimmed.
    pub path: String,
    pub url: String,
    pub bare_url: String,
}

impl Location {
    /// Build a location from a path alone, deriving nothing else.
    ///
    /// Handy for tests and for hosts that only know the path.
    pub fn from_path(path: &str) -> Self {
        Self {
            path: trim_slashes(path).to_string(),
            url: String::new(),
            bare_url: String::new(),
        }
    }

    /// Parse a full URL such as `https://example.com/shop/cart?page=2`.
    pub fn from_url(url: &str) -> Self {
        let bare = url.split(['?', '#']).next().unwrap_or(url);
        let after_scheme = bare.split_once("://").map_or(bare, |(_, rest)| rest);
        let path = after_scheme.find('/').map_or("", |pos| &after_scheme[pos..]);
        Self {
            path: trim_slashes(path).to_string(),
            url: url.to_string(),
            bare_url: bare.to_string(),
        }
    }

    pub fn capture(request: &dyn RequestContext) -> Self {
        Self {
            path: trim_slashes(&request.current_path()).to_string(),
            url: request.current_url(),
            bare_url: request.current_bare_url(),
        }
    }
}

impl RequestContext for Location {
    fn current_path(&self) -> String {
        self.path.clone()
    }

    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn current_bare_url(&self) -> String {
        self.bare_url.clone()
    }
}

pub fn trim_slashes(value: &str) -> &str {
    value.trim_matches('/')
}
