//! # Verified Link Set
//!
//! The ordered, de-duplicated list of forward links that passed
//! verification for one source. Position `i` in this set is index `"i"` in
//! the certificate's link-digest extension, so insertion order is part of
//! the attested evidence.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::ForwardLink;

/// Ordered, de-duplicated forward links.
///
/// # Invariants
///
/// - Order is the order of first insertion.
/// - No two entries share the same normalized URL; re-inserting a URL is a
///   no-op even when the provenance differs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VerifiedLinkSet {
    links: Vec<ForwardLink>,
    #[serde(skip)]
    seen: HashSet<String>,
}

impl VerifiedLinkSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a link unless its normalized URL is already present.
    ///
    /// Returns `true` if the link was added.
    pub fn insert(&mut self, link: ForwardLink) -> bool {
        if !self.seen.insert(link.as_str().to_string()) {
            return false;
        }
        self.links.push(link);
        true
    }

    /// True if a link with the same normalized URL is present.
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Number of links in the set.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// True when no link has been verified.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Iterate links in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ForwardLink> {
        self.links.iter()
    }

    /// The links as a slice, in insertion order.
    pub fn as_slice(&self) -> &[ForwardLink] {
        &self.links
    }
}

impl FromIterator<ForwardLink> for VerifiedLinkSet {
    fn from_iter<I: IntoIterator<Item = ForwardLink>>(iter: I) -> Self {
        let mut set = Self::new();
        for link in iter {
            set.insert(link);
        }
        set
    }
}

impl<'a> IntoIterator for &'a VerifiedLinkSet {
    type Item = &'a ForwardLink;
    type IntoIter = std::slice::Iter<'a, ForwardLink>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

impl<'de> Deserialize<'de> for VerifiedLinkSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let links = Vec::<ForwardLink>::deserialize(deserializer)?;
        Ok(links.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Provenance;

    fn link(url: &str) -> ForwardLink {
        ForwardLink::new(url, Provenance::SearchDiscovered).unwrap()
    }

    #[test]
    fn test_preserves_insertion_order() {
        let mut set = VerifiedLinkSet::new();
        set.insert(link("https://b.example/y"));
        set.insert(link("https://a.example/x"));
        let urls: Vec<_> = set.iter().map(|l| l.as_str()).collect();
        assert_eq!(urls, vec!["https://b.example/y", "https://a.example/x"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut set = VerifiedLinkSet::new();
        assert!(set.insert(link("https://a.example/x")));
        assert!(!set.insert(link("https://a.example/x#other")));
        assert!(!set.insert(
            ForwardLink::new("https://a.example/x", Provenance::Declared).unwrap()
        ));
        assert_eq!(set.len(), 1);
        assert!(set.contains("https://a.example/x"));
        assert_eq!(set.as_slice()[0].provenance(), Provenance::SearchDiscovered);
    }

    #[test]
    fn test_empty_set() {
        let set = VerifiedLinkSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_serde_roundtrip_dedups() {
        let json = r#"[
            {"url":"https://a.example/x","provenance":"declared"},
            {"url":"https://a.example/x","provenance":"search"},
            {"url":"https://b.example/y","provenance":"crawled"}
        ]"#;
        let set: VerifiedLinkSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        let back = serde_json::to_value(&set).unwrap();
        assert_eq!(back.as_array().unwrap().len(), 2);
    }
}
