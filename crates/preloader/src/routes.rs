#![forbid(unsafe_code)]

use crate::domain::PreloadItem;
use config::Config;
use rustc_hash::FxHashMap;

/// Static route knowledge: what to warm at start and per route.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    critical: Vec<PreloadItem>,
    routes: FxHashMap<String, Vec<PreloadItem>>,
}

impl RouteTable {
    pub fn new(config: &Config) -> Self {
        Self {
            critical: config.critical.iter().map(PreloadItem::from).collect(),
            routes: config
                .routes
                .iter()
                .map(|(name, bundle)| {
                    (
                        name.clone(),
                        bundle.resources.iter().map(PreloadItem::from).collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn critical(&self) -> &[PreloadItem] {
        &self.critical
    }

    pub fn route(&self, name: &str) -> Option<&[PreloadItem]> {
        self.routes.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}
