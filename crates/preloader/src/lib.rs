#![forbid(unsafe_code)]

pub mod behavior;
pub mod clock;
pub mod document;
pub mod domain;
pub mod error;
pub mod hint;
pub mod routes;
pub mod scheduler;
pub mod storage;
pub mod stores;

pub use behavior::{BehaviorAnalyzer, BehaviorLog, Intent, MarkerAnalyzer};
pub use document::{HeadDocument, HeadWriter, HintElement, LinkRel};
pub use hint::{
    BootstrapReport, HintBootstrap, LinkHinter, NoopHinter, ResourceHinter, StaticDirHinter,
};
pub use routes::RouteTable;
pub use scheduler::{PassReport, PreloadScheduler, Services};
pub use storage::{KeyValueStore, MemoryStore, NoopStore, SqliteStore};

pub use clock::{Clock, SystemClock};
pub use domain::{PreloadItem, PreloadStats, Priority, QueueId, ResourceKind, ResourceUrl};
pub use error::Error;
