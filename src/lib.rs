pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

pub use adapters::{LocalStorage, RedmineClient};
pub use config::{BackupConfig, DecodePolicies, DecodePolicy, ServiceConfig};
pub use core::{backup::BackupEngine, report::BackupReport};
pub use utils::error::{BackupError, Result};
