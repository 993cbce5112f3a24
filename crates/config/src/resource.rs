#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// How the hint consumer should treat a preloaded resource.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Script,
    Style,
    Image,
    /// Fonts are always fetched in CORS mode, so their hints carry a
    /// `crossorigin` marker.
    Font,
}

impl ResourceKind {
    /// Value of the `as` attribute on a preload link.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Script => "script",
            ResourceKind::Style => "style",
            ResourceKind::Image => "image",
            ResourceKind::Font => "font",
        }
    }

    pub fn crossorigin(self) -> bool {
        matches!(self, ResourceKind::Font)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue priority of a preload request.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Buckets in processing order.
    pub const ORDERED: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Sort rank, larger runs first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource entry as written in the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceSpec {
    pub url: String,
    pub kind: ResourceKind,
    pub priority: Priority,
}

impl ResourceSpec {
    pub fn new(url: impl Into<String>, kind: ResourceKind, priority: Priority) -> Self {
        Self {
            url: url.into(),
            kind,
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_follows_processing_order() {
        let ranks: Vec<_> = Priority::ORDERED.iter().map(|p| p.rank()).collect();
        assert_eq!(ranks, vec![3, 2, 1]);
    }

    #[test]
    fn only_fonts_are_crossorigin() {
        assert!(ResourceKind::Font.crossorigin());
        assert!(!ResourceKind::Script.crossorigin());
        assert!(!ResourceKind::Style.crossorigin());
        assert!(!ResourceKind::Image.crossorigin());
    }
}
