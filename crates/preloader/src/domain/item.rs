#![forbid(unsafe_code)]

use super::ResourceUrl;
use config::{Priority, ResourceKind, ResourceSpec};

/// A single preload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreloadItem {
    pub url: ResourceUrl,
    pub kind: ResourceKind,
    pub priority: Priority,
}

impl PreloadItem {
    pub fn new(url: impl Into<ResourceUrl>, kind: ResourceKind, priority: Priority) -> Self {
        Self {
            url: url.into(),
            kind,
            priority,
        }
    }

    pub fn script(url: impl Into<ResourceUrl>, priority: Priority) -> Self {
        Self::new(url, ResourceKind::Script, priority)
    }

    pub fn style(url: impl Into<ResourceUrl>, priority: Priority) -> Self {
        Self::new(url, ResourceKind::Style, priority)
    }
}

impl From<&ResourceSpec> for PreloadItem {
    fn from(spec: &ResourceSpec) -> Self {
        Self::new(spec.url.as_str(), spec.kind, spec.priority)
    }
}
