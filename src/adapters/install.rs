use crate::domain::model::{ApplyMode, UpdateOutcome};
use crate::domain::ports::{ConfigProvider, Installer};
use crate::utils::error::{Result, UpdaterError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// 呼叫外部安裝程式，例如 `pm install -r {package}`
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    command: Vec<String>,
}

impl CommandInstaller {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    fn render_args(&self, package: &Path) -> Vec<String> {
        let package = package.to_string_lossy();
        self.command
            .iter()
            .skip(1)
            .map(|arg| arg.replace("{package}", &package))
            .collect()
    }
}

#[async_trait]
impl Installer for CommandInstaller {
    async fn install(&self, package: &Path) -> Result<UpdateOutcome> {
        let program = self
            .command
            .first()
            .ok_or_else(|| UpdaterError::MissingConfigError {
                field: "install_command".to_string(),
            })?;
        let args = self.render_args(package);

        tracing::info!("📦 Running installer: {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(&args)
            .output()
            .await
            .map_err(|e| UpdaterError::InstallError {
                message: format!("Failed to start '{}': {}", program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(UpdaterError::InstallError {
                message: format!("'{}' exited with {}: {}", program, output.status, stderr.trim()),
            });
        }

        tracing::debug!(
            "Installer output: {}",
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(UpdateOutcome::Installed {
            package: package.to_path_buf(),
        })
    }
}

/// 將下載好的套件換入動態載入的模組位置
#[derive(Debug, Clone)]
pub struct ModuleSlotInstaller {
    slot: PathBuf,
}

impl ModuleSlotInstaller {
    pub fn new(slot: PathBuf) -> Self {
        Self { slot }
    }
}

#[async_trait]
impl Installer for ModuleSlotInstaller {
    async fn install(&self, package: &Path) -> Result<UpdateOutcome> {
        if let Some(parent) = self.slot.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // 先複製到同目錄的暫存檔，再以 rename 原子地取代舊模組
        let staging = self.slot.with_extension("apk.tmp");
        tokio::fs::copy(package, &staging).await?;
        if let Err(e) = tokio::fs::rename(&staging, &self.slot).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        tracing::info!("🔁 Module slot updated: {}", self.slot.display());
        Ok(UpdateOutcome::Staged {
            slot: self.slot.clone(),
        })
    }
}

/// 依套用模式選擇安裝方式
pub fn installer_for<C: ConfigProvider>(config: &C) -> Box<dyn Installer> {
    match config.apply_mode() {
        ApplyMode::Install => Box::new(CommandInstaller::new(config.install_command().to_vec())),
        ApplyMode::DynamicLoad => Box::new(ModuleSlotInstaller::new(config.module_slot())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_args_substitutes_package() {
        let installer = CommandInstaller::new(vec![
            "pm".to_string(),
            "install".to_string(),
            "-r".to_string(),
            "{package}".to_string(),
        ]);
        let args = installer.render_args(Path::new("/cache/manager.apk"));
        assert_eq!(args, vec!["install", "-r", "/cache/manager.apk"]);
    }

    #[tokio::test]
    async fn test_module_slot_replaces_existing_module() {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("manager.apk");
        std::fs::write(&package, b"new module").unwrap();

        let slot = dir.path().join("dyn").join("current.apk");
        std::fs::create_dir_all(slot.parent().unwrap()).unwrap();
        std::fs::write(&slot, b"old module").unwrap();

        let outcome = ModuleSlotInstaller::new(slot.clone())
            .install(&package)
            .await
            .unwrap();

        assert_eq!(outcome, UpdateOutcome::Staged { slot: slot.clone() });
        assert_eq!(std::fs::read(&slot).unwrap(), b"new module");
        assert!(!slot.with_extension("apk.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_installer_program_fails() {
        let installer = CommandInstaller::new(vec![
            "definitely-not-an-installer-binary".to_string(),
            "{package}".to_string(),
        ]);
        let err = installer.install(Path::new("/tmp/x.apk")).await.unwrap_err();
        assert!(matches!(err, UpdaterError::InstallError { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_installer_reports_exit_status() {
        let ok = CommandInstaller::new(vec!["true".to_string(), "{package}".to_string()]);
        let outcome = ok.install(Path::new("/tmp/x.apk")).await.unwrap();
        assert_eq!(
            outcome,
            UpdateOutcome::Installed {
                package: PathBuf::from("/tmp/x.apk")
            }
        );

        let failing = CommandInstaller::new(vec!["false".to_string(), "{package}".to_string()]);
        assert!(matches!(
            failing.install(Path::new("/tmp/x.apk")).await,
            Err(UpdaterError::InstallError { .. })
        ));
    }
}
