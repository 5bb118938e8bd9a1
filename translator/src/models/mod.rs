//! Domain models shared across the pipeline.
//!
//! - [`Mapping`] - Source-unit to target-unit substitution table

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Mapping
// =============================================================================

/// A character substitution table.
///
/// Keys and values are non-empty strings; keys are unique and the last
/// insert for a duplicate key wins. Built once by the loader and then only
/// read, so it can be shared across concurrent transformations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mapping {
    entries: HashMap<String, String>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair, ignoring it when either side is empty.
    ///
    /// Returns `true` if the pair was stored.
    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) -> bool {
        let source = source.into();
        let target = target.into();
        if source.is_empty() || target.is_empty() {
            return false;
        }
        self.entries.insert(source, target);
        true
    }

    /// Look up the replacement for a single unit.
    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(String::as_str)
    }

    /// Look up the replacement for a single character.
    pub fn get_char(&self, c: char) -> Option<&str> {
        let mut buf = [0u8; 4];
        self.get(c.encode_utf8(&mut buf))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(source, target)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys that are not exactly one character long.
    ///
    /// Such keys can never match during substitution, which works one
    /// character at a time.
    pub fn multi_char_keys(&self) -> usize {
        self.entries
            .keys()
            .filter(|k| k.chars().nth(1).is_some())
            .count()
    }
}

impl<S, T> FromIterator<(S, T)> for Mapping
where
    S: Into<String>,
    T: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (source, target) in iter {
            mapping.insert(source, target);
        }
        mapping
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sides_are_rejected() {
        let mut mapping = Mapping::new();
        assert!(!mapping.insert("", "X"));
        assert!(!mapping.insert("Y", ""));
        assert!(mapping.insert("Z", "W"));
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get("Z"), Some("W"));
    }

    #[test]
    fn test_last_write_wins() {
        let mapping: Mapping = [("あ", "ア"), ("あ", "ぁ")].into_iter().collect();
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.get_char('あ'), Some("ぁ"));
    }

    #[test]
    fn test_multi_char_keys() {
        let mapping: Mapping = [("a", "b"), ("ab", "c"), ("漢", "字")].into_iter().collect();
        assert_eq!(mapping.multi_char_keys(), 1);
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mapping: Mapping = [("A", "B")].into_iter().collect();
        let json = serde_json::to_value(&mapping).unwrap();
        assert_eq!(json, serde_json::json!({ "A": "B" }));
    }
}
