use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Behavior {
    /// Number of most recent interactions kept in the behavior log.
    pub capacity: usize,

    /// Key under which the behavior log is persisted in the key-value store.
    pub storage_key: String,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            capacity: 50,
            storage_key: "preload-behavior".to_owned(),
        }
    }
}
