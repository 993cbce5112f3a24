#![forbid(unsafe_code)]

mod queue;
mod registry;

pub use queue::{Bucket, PreloadQueue};
pub use registry::ResourceRegistry;
