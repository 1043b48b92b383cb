use crate::domain::model::UpdatePlan;
use crate::domain::ports::Prompt;
use crate::utils::error::{Result, UpdaterError};
use async_trait::async_trait;

pub const APP_NAME: &str = "Magisk";

/// 組出升級提示訊息
pub fn upgrade_message(plan: &UpdatePlan) -> String {
    let mut message = format!("Upgrade to full {} to finish the setup.", APP_NAME);
    match (&plan.release.version, &plan.release.version_code) {
        (Some(version), Some(code)) => message.push_str(&format!(" New version: {} ({})", version, code)),
        (Some(version), None) => message.push_str(&format!(" New version: {}", version)),
        _ => {}
    }
    message.push_str(" Download and install?");
    message
}

/// `--yes`：不詢問，直接接受
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

#[async_trait]
impl Prompt for AutoConfirm {
    async fn confirm(&self, plan: &UpdatePlan) -> Result<bool> {
        tracing::info!("Auto-accepting upgrade from {}", plan.download_url);
        Ok(true)
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

#[cfg(feature = "cli")]
#[async_trait]
impl Prompt for TerminalPrompt {
    async fn confirm(&self, plan: &UpdatePlan) -> Result<bool> {
        let message = upgrade_message(plan);
        ask_blocking(move || {
            dialoguer::Confirm::new()
                .with_prompt(message)
                .default(false)
                .interact()
        })
        .await
    }
}

/// 終端輸入會阻塞，放到 blocking 執行緒執行，避免卡住 runtime 的 worker
pub async fn ask_blocking<F, E>(ask: F) -> Result<bool>
where
    F: FnOnce() -> std::result::Result<bool, E> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    tokio::task::spawn_blocking(ask)
        .await
        .map_err(|e| UpdaterError::PromptError {
            message: e.to_string(),
        })?
        .map_err(|e| UpdaterError::PromptError {
            message: e.to_string(),
        })
}
