#![forbid(unsafe_code)]

use slotmap::new_key_type;
use std::sync::Arc;
use std::{borrow, fmt};

new_key_type! { pub struct QueueId; }

/// Resource locator; the dedup key of the registry.
///
/// Cloning shares the underlying string, so the same url can sit in the
/// queue, the registry and an in-flight batch without copies.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceUrl(Arc<str>);

impl ResourceUrl {
    pub fn new(url: impl AsRef<str>) -> Self {
        Self(Arc::from(url.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl borrow::Borrow<str> for ResourceUrl {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceUrl {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for ResourceUrl {
    fn from(url: String) -> Self {
        Self(Arc::from(url))
    }
}

impl fmt::Debug for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceUrl").field(&&*self.0).finish()
    }
}

impl fmt::Display for ResourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
