use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 分支最新的 commit 識別碼，用來釘住要抓取的 manifest 版本
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSha(pub String);

impl CommitSha {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitSha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// manifest 中描述目前發行版的項目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub link: String,
    pub version: Option<String>,
    pub version_code: Option<String>,
    pub note: Option<String>,
}

/// 已解析完成、等待使用者確認的更新
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
    pub sha: CommitSha,
    pub release: ReleaseInfo,
    pub download_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum ApplyMode {
    /// 交給系統套件安裝程式
    #[cfg_attr(not(feature = "dynamic-load"), default)]
    Install,
    /// 替換動態載入模組的檔案，下次啟動時生效
    #[cfg_attr(feature = "dynamic-load", default)]
    DynamicLoad,
}

impl fmt::Display for ApplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyMode::Install => f.write_str("install"),
            ApplyMode::DynamicLoad => f.write_str("dynamic-load"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Declined,
    Installed { package: PathBuf },
    Staged { slot: PathBuf },
}
