#![forbid(unsafe_code)]

mod analyzer;
mod log;

pub use analyzer::{BehaviorAnalyzer, Intent, MarkerAnalyzer};
pub use log::BehaviorLog;
