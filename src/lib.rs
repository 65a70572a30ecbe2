pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use adapters::{FsProfileCatalogue, SystemProcessRunner};
pub use config::{toml_config::TomlConfig, SliceSettings};
pub use core::{orchestrator::SlicingOrchestrator, packager::SliceResponse};
pub use utils::error::{Result, SliceError};
