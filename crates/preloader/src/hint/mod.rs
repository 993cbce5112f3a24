#![deny(unsafe_code)]

mod bootstrap;
mod hinter;

pub use bootstrap::{BootstrapReport, HintBootstrap};
pub use hinter::{LinkHinter, NoopHinter, ResourceHinter, StaticDirHinter};
