#![forbid(unsafe_code)]

mod ids;
mod item;
mod stats;

pub use config::{Priority, ResourceKind};
pub use ids::{QueueId, ResourceUrl};
pub use item::PreloadItem;
pub use stats::PreloadStats;
