pub mod toml_config;

use crate::core::cdn::{
    DEFAULT_BRANCH_API, DEFAULT_CDN_TEMPLATE, DEFAULT_MANIFEST_FILE, DEFAULT_MANIFEST_KEY,
};
use crate::core::{ApplyMode, ConfigProvider};
use crate::domain::ports::ResourceBlobSettings;
use crate::utils::error::{Result, UpdaterError};
use crate::utils::validation::{self, Validate};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CACHE_DIR: &str = "./cache";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub fn default_install_command() -> Vec<String> {
    ["pm", "install", "-r", "{package}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// 沒有另外指定時，動態模組位於 `<cache_dir>/dyn/current.apk`
pub fn default_module_slot(cache_dir: &Path) -> PathBuf {
    cache_dir.join("dyn").join("current.apk")
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "stub-updater")]
#[command(about = "Fetch the latest release manifest, download the app package and install it")]
pub struct CliConfig {
    /// Load settings from a TOML file instead of flags
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Branch metadata endpoint that reports the latest commit
    #[arg(long, default_value = DEFAULT_BRANCH_API)]
    pub branch_api: String,

    /// CDN URL template with {sha} and {file} placeholders
    #[arg(long, default_value = DEFAULT_CDN_TEMPLATE)]
    pub cdn_template: String,

    #[arg(long, default_value = DEFAULT_MANIFEST_FILE)]
    pub manifest_file: String,

    /// Manifest entry whose `link` points at the package
    #[arg(long, default_value = DEFAULT_MANIFEST_KEY)]
    pub manifest_key: String,

    #[arg(long, default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// How to apply the package (defaults to the build-time choice)
    #[arg(long, value_enum)]
    pub apply_mode: Option<ApplyMode>,

    /// Installer command, {package} is replaced by the downloaded file
    #[arg(long, value_delimiter = ' ', default_values_t = default_install_command())]
    pub install_command: Vec<String>,

    /// Module file replaced in dynamic-load mode
    #[arg(long)]
    pub module_slot: Option<PathBuf>,

    /// Encrypted, gzipped resource blob to unpack before updating
    #[arg(long)]
    pub resource_blob: Option<PathBuf>,

    #[arg(long)]
    pub resource_key: Option<String>,

    #[arg(long)]
    pub resource_iv: Option<String>,

    /// Accept the upgrade without asking
    #[arg(short, long)]
    pub yes: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn branch_api_url(&self) -> &str {
        &self.branch_api
    }

    fn cdn_template(&self) -> &str {
        &self.cdn_template
    }

    fn manifest_file(&self) -> &str {
        &self.manifest_file
    }

    fn manifest_key(&self) -> &str {
        &self.manifest_key
    }

    fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn apply_mode(&self) -> ApplyMode {
        self.apply_mode.unwrap_or_default()
    }

    fn install_command(&self) -> &[String] {
        &self.install_command
    }

    fn module_slot(&self) -> PathBuf {
        self.module_slot
            .clone()
            .unwrap_or_else(|| default_module_slot(&self.cache_dir))
    }

    fn resource_blob(&self) -> Option<ResourceBlobSettings> {
        Some(ResourceBlobSettings {
            path: self.resource_blob.clone()?,
            key_hex: self.resource_key.clone()?,
            iv_hex: self.resource_iv.clone()?,
        })
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("branch_api", &self.branch_api)?;
        validation::validate_cdn_template("cdn_template", &self.cdn_template)?;
        validation::validate_non_empty_string("manifest_file", &self.manifest_file)?;
        validation::validate_non_empty_string("manifest_key", &self.manifest_key)?;
        validation::validate_path("cache_dir", &self.cache_dir.to_string_lossy())?;
        validation::validate_positive_number("timeout_secs", self.timeout_secs, 1)?;

        if self.apply_mode() == ApplyMode::Install {
            validation::validate_install_command("install_command", &self.install_command)?;
        }

        if self.resource_blob.is_some() && self.resource_blob().is_none() {
            return Err(UpdaterError::MissingConfigError {
                field: "resource_key/resource_iv".to_string(),
            });
        }

        Ok(())
    }
}
