use std::collections::HashSet;

/// URLs already scheduled (or deliberately abandoned) during one search.
///
/// Insert-only. A URL is checked here before it is fetched or embedded, so it
/// can reach the frontier at most once.
#[derive(Debug, Default)]
pub struct DiscoverySet {
    urls: HashSet<String>,
}

impl DiscoverySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Returns true if the URL was not already present.
    pub fn add(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Links not yet discovered, in their original order, without repeats.
    pub fn undiscovered<'a>(&self, links: &'a [String]) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        links
            .iter()
            .map(String::as_str)
            .filter(|url| !self.contains(url) && seen.insert(*url))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut set = DiscoverySet::new();
        assert!(set.is_empty());
        assert!(set.add("a"));
        assert!(!set.add("a"));
        assert_eq!(set.len(), 1);
        assert!(set.contains("a"));
        assert!(!set.contains("b"));
    }

    #[test]
    fn test_undiscovered_keeps_order_and_drops_known() {
        let mut set = DiscoverySet::new();
        set.add("b");
        let links: Vec<String> = ["c", "b", "a", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(set.undiscovered(&links), vec!["c", "a", "d"]);
    }
}
