//! Configuration for the delve route finder.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line. Every section falls back to its defaults field by field, so
//! files written by older or newer versions still load.

mod cli;
mod config;
mod error;

pub use cli::{CliArgs, parse_position};
pub use config::{Config, DebugConfig, SearchConfig, SearchMode, WorldConfig, default_config_dir};
pub use error::ConfigError;
