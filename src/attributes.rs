//! Ordered HTML attribute sets.
//!
//! Every element the renderer produces (lists, items, anchors) carries an
//! [`AttributeSet`]. Keys keep their insertion order so rendered markup is
//! stable across runs, which keeps snapshot-style assertions in tests simple.
//!
//! ## Class Handling
//!
//! `class` is the one key with merge semantics. Adding a class appends a
//! whitespace-delimited token unless an identical token is already there:
//!
//! ```text
//! class="nav"  + add_class("active")  →  class="nav active"
//! class="nav active" + add_class("active") →  class="nav active"
//! ```
//!
//! ## Boolean Attributes
//!
//! An attribute whose value mirrors its key renders bare (`required`, not
//! `required="required"`). [`AttributeSet::set_flag`] stores exactly that.

use maud::Escaper;
use serde::Serialize;
use std::fmt::Write;

const CLASS: &str = "class";

/// An ordered mapping of attribute names to values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeSet {
    entries: Vec<(String, String)>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value in place.
    ///
    /// `None` removes the key entirely.
    pub fn set(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => match self.position(key) {
                Some(pos) => self.entries[pos].1 = value.to_string(),
                None => self.entries.push((key.to_string(), value.to_string())),
            },
            None => self.remove(key),
        }
        self
    }

    /// Store a boolean attribute that renders as a bare name.
    pub fn set_flag(&mut self, key: &str) -> &mut Self {
        self.set(key, Some(key))
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key).map(|pos| self.entries[pos].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Tokens of the `class` attribute, in order.
    pub fn classes(&self) -> Vec<&str> {
        self.get(CLASS)
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Add one or more space-separated class tokens, skipping any already present.
    ///
    /// Matching is exact and case-sensitive per token, so `nav` does not block
    /// `navbar` and vice versa.
    pub fn add_class(&mut self, value: &str) -> &mut Self {
        let mut tokens: Vec<String> = self.classes().into_iter().map(String::from).collect();
        for token in value.split_whitespace() {
            if !tokens.iter().any(|t| t == token) {
                tokens.push(token.to_string());
            }
        }
        if !tokens.is_empty() {
            self.set(CLASS, Some(&tokens.join(" ")));
        }
        self
    }

    /// Merge `other` into `self`.
    ///
    /// Class tokens are unioned (no duplicates); every other key takes the
    /// value from `other`.
    pub fn merge(&mut self, other: &AttributeSet) -> &mut Self {
        for (key, value) in other.iter() {
            if key == CLASS {
                self.add_class(value);
            } else {
                self.set(key, Some(value));
            }
        }
        self
    }

    /// Render as ` key="value" key2="value2"`, with a leading space when non-empty.
    ///
    /// Values are HTML-escaped. Keys whose value equals the key render bare.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.iter() {
            out.push(' ');
            out.push_str(key);
            if key == value {
                continue;
            }
            out.push_str("=\"");
            write!(Escaper::new(&mut out), "{value}").expect("writing to a String cannot fail");
            out.push('"');
        }
        out
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.set(k.as_ref(), Some(v.as_ref()));
        }
        set
    }
}

impl<const N: usize> From<[(&str, &str); N]> for AttributeSet {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let mut attrs = AttributeSet::from([("id", "main"), ("role", "nav")]);
        attrs.set("id", Some("side"));
        assert_eq!(attrs.serialize(), r#" id="side" role="nav""#);
    }

    #[test]
    fn set_none_removes_key() {
        let mut attrs = AttributeSet::from([("id", "main"), ("role", "nav")]);
        attrs.set("id", None);
        assert!(!attrs.contains_key("id"));
        assert_eq!(attrs.serialize(), r#" role="nav""#);
    }

    #[test]
    fn empty_set_serializes_to_empty_string() {
        assert_eq!(AttributeSet::new().serialize(), "");
    }

    #[test]
    fn flag_renders_bare() {
        let mut attrs = AttributeSet::new();
        attrs.set("type", Some("checkbox")).set_flag("required");
        assert_eq!(attrs.serialize(), r#" type="checkbox" required"#);
    }

    #[test]
    fn values_are_escaped() {
        let attrs = AttributeSet::from([("title", r#"Tom & "Jerry" <3"#)]);
        assert_eq!(
            attrs.serialize(),
            r#" title="Tom &amp; &quot;Jerry&quot; &lt;3""#
        );
    }

    // =========================================================================
    // Class handling
    // =========================================================================

    #[test]
    fn add_class_sets_when_absent() {
        let mut attrs = AttributeSet::new();
        attrs.add_class("active");
        assert_eq!(attrs.get("class"), Some("active"));
    }

    #[test]
    fn add_class_is_idempotent() {
        let mut once = AttributeSet::from([("class", "nav")]);
        once.add_class("active");
        let mut twice = once.clone();
        twice.add_class("active");
        assert_eq!(once, twice);
        assert_eq!(twice.classes(), vec!["nav", "active"]);
    }

    #[test]
    fn add_class_matches_whole_tokens_only() {
        let mut attrs = AttributeSet::from([("class", "navbar")]);
        attrs.add_class("nav");
        assert_eq!(attrs.classes(), vec!["navbar", "nav"]);
    }

    #[test]
    fn add_class_is_case_sensitive() {
        let mut attrs = AttributeSet::from([("class", "Active")]);
        attrs.add_class("active");
        assert_eq!(attrs.classes(), vec!["Active", "active"]);
    }

    #[test]
    fn add_class_accepts_several_tokens() {
        let mut attrs = AttributeSet::from([("class", "a")]);
        attrs.add_class("b a  c");
        assert_eq!(attrs.get("class"), Some("a b c"));
    }

    #[test]
    fn merge_unions_classes_and_overrides_others() {
        let mut base = AttributeSet::from([("class", "nav main"), ("id", "one")]);
        let other = AttributeSet::from([("class", "main extra"), ("id", "two"), ("lang", "en")]);
        base.merge(&other);
        assert_eq!(base.get("class"), Some("nav main extra"));
        assert_eq!(base.get("id"), Some("two"));
        assert_eq!(base.get("lang"), Some("en"));
    }

    #[test]
    fn preserves_insertion_order() {
        let attrs: AttributeSet = vec![("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();
        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }
}
