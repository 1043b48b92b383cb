pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::toml_config::TomlConfig;
pub use self::core::{update_flow::HttpUpdateFlow, updater::UpdateEngine};
pub use domain::model::{ApplyMode, UpdateOutcome};
pub use utils::error::{Result, UpdaterError};
