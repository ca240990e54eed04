//! Dotted key paths.
//!
//! Stored ids stay plain strings (`alice.theme.color`); `KeyPath` is the
//! parsed form used wherever the store composes or splits them.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, Result};

/// The only namespace separator.
pub const SEPARATOR: char = '.';

/// A validated dotted key: one or more non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath {
    raw: String,
}

impl KeyPath {
    /// Parse a dotted key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if the key is empty or has an empty segment
    /// (leading, trailing or doubled separator).
    pub fn parse(key: &str) -> Result<Self> {
        if key.is_empty() {
            return Err(ConfigError::invalid_key(key, "key cannot be empty"));
        }
        if key.split(SEPARATOR).any(str::is_empty) {
            return Err(ConfigError::invalid_key(key, "empty segment"));
        }
        Ok(Self {
            raw: key.to_string(),
        })
    }

    /// Append a (possibly dotted) child key.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if `child` is not itself a valid key.
    pub fn join(&self, child: &str) -> Result<Self> {
        let child = Self::parse(child)?;
        Ok(Self {
            raw: format!("{}{SEPARATOR}{}", self.raw, child.raw),
        })
    }

    /// Key scoped to a user: `{username}.{key}`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKey` if either part is invalid.
    pub fn user_scoped(username: &str, key: &str) -> Result<Self> {
        Self::parse(username)?.join(key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split(SEPARATOR)
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Last segment.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.raw
            .rsplit_once(SEPARATOR)
            .map_or(self.raw.as_str(), |(_, leaf)| leaf)
    }

    /// Everything before the last segment, if there is more than one.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.raw.rsplit_once(SEPARATOR).map(|(parent, _)| Self {
            raw: parent.to_string(),
        })
    }

    /// Prefix matching every key inside this group: `"{self}."`.
    #[must_use]
    pub fn group_prefix(&self) -> String {
        format!("{}{SEPARATOR}", self.raw)
    }

    /// Leaf key of `id` relative to this group.
    ///
    /// Strips `len(group) + 1` characters; `None` if `id` is not inside the
    /// group.
    #[must_use]
    pub fn strip_group<'a>(&self, id: &'a str) -> Option<&'a str> {
        id.strip_prefix(self.raw.as_str())
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .filter(|leaf| !leaf.is_empty())
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.raw
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for KeyPath {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for KeyPath {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_valid() {
        let key = KeyPath::parse("alice.theme.color").unwrap();
        assert_eq!(key.depth(), 3);
        assert_eq!(key.leaf(), "color");
        assert_eq!(key.parent().unwrap().as_str(), "alice.theme");
        assert_eq!(
            key.segments().collect::<Vec<_>>(),
            vec!["alice", "theme", "color"]
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            KeyPath::parse(""),
            Err(ConfigError::InvalidKey { .. })
        ));
        for bad in [".theme", "theme.", "theme..color", "."] {
            assert!(KeyPath::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_single_segment_has_no_parent() {
        let key = KeyPath::parse("theme").unwrap();
        assert_eq!(key.leaf(), "theme");
        assert!(key.parent().is_none());
    }

    #[test]
    fn test_user_scoped_and_join() {
        let key = KeyPath::user_scoped("bob", "theme.color").unwrap();
        assert_eq!(key.as_str(), "bob.theme.color");
        assert!(KeyPath::user_scoped("", "theme").is_err());

        let app = KeyPath::parse("app").unwrap();
        assert_eq!(app.join("a").unwrap().as_str(), "app.a");
        assert!(app.join("").is_err());
    }

    #[test]
    fn test_strip_group() {
        let group = KeyPath::parse("theme").unwrap();
        assert_eq!(group.group_prefix(), "theme.");
        assert_eq!(group.strip_group("theme.color"), Some("color"));
        assert_eq!(group.strip_group("theme.font.size"), Some("font.size"));
        assert_eq!(group.strip_group("themes.color"), None);
        assert_eq!(group.strip_group("theme"), None);
    }

    proptest! {
        #[test]
        fn prop_parse_roundtrips_segments(segs in prop::collection::vec("[a-z0-9_]{1,8}", 1..5)) {
            let raw = segs.join(".");
            let key = KeyPath::parse(&raw).unwrap();
            prop_assert_eq!(key.as_str(), raw.as_str());
            prop_assert_eq!(key.depth(), segs.len());
            prop_assert_eq!(key.leaf(), segs.last().unwrap().as_str());
        }

        #[test]
        fn prop_strip_group_inverts_join(group in "[a-z]{1,6}", leaf in "[a-z]{1,6}") {
            let g = KeyPath::parse(&group).unwrap();
            let full = g.join(&leaf).unwrap();
            prop_assert_eq!(g.strip_group(full.as_str()), Some(leaf.as_str()));
        }
    }
}
