#![forbid(unsafe_code)]

use crate::domain::ResourceUrl;
use rustc_hash::FxHashSet;

/// Urls that were already preloaded during this session.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    done: FxHashSet<ResourceUrl>,
}

impl ResourceRegistry {
    pub fn has(&self, url: &str) -> bool {
        self.done.contains(url)
    }

    /// Returns `false` when the url was already recorded.
    pub fn mark_done(&mut self, url: ResourceUrl) -> bool {
        self.done.insert(url)
    }

    pub fn clear(&mut self) {
        self.done.clear();
    }

    pub fn len(&self) -> usize {
        self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.done.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn clear_on_empty_registry_is_noop() {
        let mut registry = ResourceRegistry::default();
        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.has("/a.js"));
    }

    proptest! {
        #[test]
        fn registry_counts_unique_urls(urls in prop::collection::vec("/[a-e]{1,2}\\.js", 0..40)) {
            let mut registry = ResourceRegistry::default();
            for url in &urls {
                registry.mark_done(ResourceUrl::new(url));
            }
            let unique: HashSet<_> = urls.iter().collect();
            prop_assert_eq!(registry.len(), unique.len());
            for url in &urls {
                prop_assert!(registry.has(url));
            }
        }
    }
}
