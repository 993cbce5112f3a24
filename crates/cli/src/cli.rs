use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::{Path, PathBuf};

/// preloader: priority-ordered resource warming
///
/// preloader warms the script, style, image and font bundles an application
/// is about to need. Critical resources go first, route bundles follow when
/// asked for, and a rolling log of interactions predicts which bundles to
/// warm next.
#[derive(Debug, Parser, Clone)]
#[command(about, long_about, version)]
pub struct Cli {
    /// Path to configuration file.
    ///
    /// If not provided, the default locations are checked. They are
    /// `/etc/preloader/config.toml` and `/etc/preloader/config.d/*.toml`,
    /// where the latter being a glob pattern. If they don't exist, the default
    /// configuration is used.
    #[arg(short, long, value_parser = validate_file)]
    pub config: Option<PathBuf>,

    /// Serve resources from this directory and warm them into memory.
    ///
    /// Without it, preloads are emitted as `<link rel="preload">` elements.
    #[arg(long, value_parser = validate_dir)]
    pub static_root: Option<PathBuf>,

    /// SQLite file holding the behavior log across runs.
    ///
    /// Overrides `persistence.state_path` from the configuration.
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Skip the critical resources normally warmed at startup.
    #[arg(long)]
    pub no_critical: bool,

    /// Route bundles to warm, in order.
    #[arg(short, long = "route", value_name = "NAME")]
    pub routes: Vec<String>,

    /// Interactions to record before finishing.
    #[arg(short, long = "interaction", value_name = "NAME")]
    pub interactions: Vec<String>,

    /// Read interaction names from stdin, one per line, until EOF or Ctrl-C.
    #[arg(long)]
    pub stdin: bool,

    /// Print the resulting document head to stdout.
    #[arg(long)]
    pub print_head: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

/// Check if the file exists.
#[inline(always)]
fn validate_file(file: &str) -> Result<PathBuf, String> {
    let path = Path::new(file);
    if path.is_file() {
        Ok(path.to_owned())
    } else {
        Err(format!("File not found: {:?}", path))
    }
}

/// Check if the directory exists.
#[inline(always)]
fn validate_dir(dir: &str) -> Result<PathBuf, String> {
    let path = Path::new(dir);
    if path.is_dir() {
        Ok(path.to_owned())
    } else {
        Err(format!("Directory not found: {:?}", path))
    }
}
