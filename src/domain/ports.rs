use crate::domain::model::{ApplyMode, CommitSha, UpdateOutcome, UpdatePlan};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    fn branch_api_url(&self) -> &str;
    fn cdn_template(&self) -> &str;
    fn manifest_file(&self) -> &str;
    fn manifest_key(&self) -> &str;
    fn cache_dir(&self) -> &Path;
    fn request_timeout(&self) -> Duration;
    fn apply_mode(&self) -> ApplyMode;
    fn install_command(&self) -> &[String];
    fn module_slot(&self) -> PathBuf;
    fn resource_blob(&self) -> Option<ResourceBlobSettings>;

    /// 套件下載的固定快取路徑
    fn package_path(&self) -> PathBuf {
        self.cache_dir().join("manager.apk")
    }
}

/// 加密資源檔的位置與金鑰（十六進位字串）
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ResourceBlobSettings {
    pub path: PathBuf,
    pub key_hex: String,
    pub iv_hex: String,
}

#[async_trait]
pub trait UpdateFlow: Send + Sync {
    async fn is_online(&self) -> bool;
    async fn resolve_commit(&self) -> Result<CommitSha>;
    async fn fetch_plan(&self, sha: CommitSha) -> Result<UpdatePlan>;
    async fn download(&self, plan: &UpdatePlan) -> Result<PathBuf>;
    async fn apply(&self, package: &Path) -> Result<UpdateOutcome>;
}

/// 詢問使用者是否升級。終端互動會阻塞，實作需自行移出 async 執行緒
#[async_trait]
pub trait Prompt: Send + Sync {
    async fn confirm(&self, plan: &UpdatePlan) -> Result<bool>;
}

#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, package: &Path) -> Result<UpdateOutcome>;
}
