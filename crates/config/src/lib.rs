#![forbid(unsafe_code)]

mod behavior;
mod error;
mod hints;
mod persistence;
mod resource;
mod routes;
mod scheduler;

pub use behavior::Behavior;
pub use error::Error;
pub use hints::{Hints, Preconnect};
pub use persistence::Persistence;
pub use resource::{Priority, ResourceKind, ResourceSpec};
pub use routes::{RouteBundle, default_critical, default_routes};
pub use scheduler::Scheduler;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub scheduler: Scheduler,
    pub behavior: Behavior,
    pub hints: Hints,
    pub persistence: Persistence,
    pub critical: Vec<ResourceSpec>,
    pub routes: BTreeMap<String, RouteBundle>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheduler: Scheduler::default(),
            behavior: Behavior::default(),
            hints: Hints::default(),
            persistence: Persistence::default(),
            critical: default_critical(),
            routes: default_routes(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. Missing fields are filled with defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Config = toml_edit::de::from_str(&text)?;
        config.apply_defaults();
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let toml = toml_edit::ser::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from multiple TOML files. Later files override earlier ones.
    pub fn load_multiple<T, U>(paths: U) -> Result<Self, Error>
    where
        T: AsRef<Path>,
        U: IntoIterator<Item = T>,
    {
        let mut merged = toml_edit::DocumentMut::new();
        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                continue;
            }
            let text = std::fs::read_to_string(path)?;
            let doc: toml_edit::DocumentMut = text.parse()?;
            merge_document(&mut merged, doc);
        }
        let mut config: Config = toml_edit::de::from_str(&merged.to_string())?;
        config.apply_defaults();
        Ok(config)
    }

    fn apply_defaults(&mut self) {
        self.scheduler.batch_size = self.scheduler.effective_batch_size();
        let mut seen = std::collections::HashSet::new();
        self.hints.dns_prefetch.retain(|origin| seen.insert(origin.clone()));
    }
}

fn merge_document(target: &mut toml_edit::DocumentMut, source: toml_edit::DocumentMut) {
    for (key, item) in source.iter() {
        merge_item(
            target.entry(key).or_insert(toml_edit::Item::None),
            item.clone(),
        );
    }
}

fn merge_item(target: &mut toml_edit::Item, source: toml_edit::Item) {
    use toml_edit::Item;
    match (target, source) {
        (Item::Table(target_table), Item::Table(source_table)) => {
            for (key, item) in source_table.iter() {
                merge_item(target_table.entry(key).or_insert(Item::None), item.clone());
            }
        }
        (Item::ArrayOfTables(target_array), Item::ArrayOfTables(source_array)) => {
            for table in source_array.iter() {
                target_array.push(table.clone());
            }
        }
        (target_item, source_item) => {
            *target_item = source_item;
        }
    }
}
