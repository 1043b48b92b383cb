use crate::config::{
    default_install_command, default_module_slot, DEFAULT_CACHE_DIR, DEFAULT_TIMEOUT_SECS,
};
use crate::core::cdn::{
    DEFAULT_BRANCH_API, DEFAULT_CDN_TEMPLATE, DEFAULT_MANIFEST_FILE, DEFAULT_MANIFEST_KEY,
};
use crate::core::{ApplyMode, ConfigProvider};
use crate::domain::ports::ResourceBlobSettings;
use crate::utils::error::{Result, UpdaterError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub apply: ApplyConfig,
    pub resources: Option<ResourcesConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_branch_api")]
    pub branch_api: String,
    #[serde(default = "default_cdn_template")]
    pub cdn_template: String,
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    #[serde(default = "default_manifest_key")]
    pub manifest_key: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyConfig {
    pub mode: Option<ApplyMode>,
    pub install_command: Option<Vec<String>>,
    pub module_slot: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcesConfig {
    pub path: PathBuf,
    pub key: String,
    pub iv: String,
}

fn default_branch_api() -> String {
    DEFAULT_BRANCH_API.to_string()
}

fn default_cdn_template() -> String {
    DEFAULT_CDN_TEMPLATE.to_string()
}

fn default_manifest_file() -> String {
    DEFAULT_MANIFEST_FILE.to_string()
}

fn default_manifest_key() -> String {
    DEFAULT_MANIFEST_KEY.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            branch_api: default_branch_api(),
            cdn_template: default_cdn_template(),
            manifest_file: default_manifest_file(),
            manifest_key: default_manifest_key(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| UpdaterError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RESOURCE_KEY})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| UpdaterError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 命令列的 `--apply-mode` 優先於檔案設定
    pub fn override_apply_mode(&mut self, mode: Option<ApplyMode>) {
        if let Some(mode) = mode {
            tracing::info!("🔧 Apply mode overridden to: {}", mode);
            self.apply.mode = Some(mode);
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn branch_api_url(&self) -> &str {
        &self.source.branch_api
    }

    fn cdn_template(&self) -> &str {
        &self.source.cdn_template
    }

    fn manifest_file(&self) -> &str {
        &self.source.manifest_file
    }

    fn manifest_key(&self) -> &str {
        &self.source.manifest_key
    }

    fn cache_dir(&self) -> &Path {
        &self.download.cache_dir
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.source.timeout_seconds)
    }

    fn apply_mode(&self) -> ApplyMode {
        self.apply.mode.unwrap_or_default()
    }

    fn install_command(&self) -> &[String] {
        self.apply.install_command.as_deref().unwrap_or(&[])
    }

    fn module_slot(&self) -> PathBuf {
        self.apply
            .module_slot
            .clone()
            .unwrap_or_else(|| default_module_slot(&self.download.cache_dir))
    }

    fn resource_blob(&self) -> Option<ResourceBlobSettings> {
        self.resources.as_ref().map(|r| ResourceBlobSettings {
            path: r.path.clone(),
            key_hex: r.key.clone(),
            iv_hex: r.iv.clone(),
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("source.branch_api", &self.source.branch_api)?;
        validation::validate_cdn_template("source.cdn_template", &self.source.cdn_template)?;
        validation::validate_non_empty_string("source.manifest_file", &self.source.manifest_file)?;
        validation::validate_non_empty_string("source.manifest_key", &self.source.manifest_key)?;
        validation::validate_positive_number(
            "source.timeout_seconds",
            self.source.timeout_seconds,
            1,
        )?;
        validation::validate_path(
            "download.cache_dir",
            &self.download.cache_dir.to_string_lossy(),
        )?;

        if self.apply_mode() == ApplyMode::Install {
            validation::validate_install_command("apply.install_command", self.install_command())?;
        }

        if let Some(resources) = &self.resources {
            validation::validate_path("resources.path", &resources.path.to_string_lossy())?;
            for (field, value) in [("resources.key", &resources.key), ("resources.iv", &resources.iv)] {
                if value.contains("${") {
                    return Err(UpdaterError::ConfigValidationError {
                        field: field.to_string(),
                        message: format!("Unresolved environment variable in '{}'", value),
                    });
                }
            }
        }

        Ok(())
    }
}

impl TomlConfig {
    /// 未設定 install_command 時補上預設值
    pub fn with_defaults(mut self) -> Self {
        if self.apply.install_command.is_none() {
            self.apply.install_command = Some(default_install_command());
        }
        self
    }
}
