use crate::core::{Prompt, UpdateFlow, UpdateOutcome};
use crate::utils::error::{Result, UpdaterError};

pub struct UpdateEngine<F: UpdateFlow, P: Prompt> {
    flow: F,
    prompt: P,
    endpoint: String,
}

impl<F: UpdateFlow, P: Prompt> UpdateEngine<F, P> {
    /// `endpoint` 只用於離線時的錯誤訊息
    pub fn new(flow: F, prompt: P, endpoint: impl Into<String>) -> Self {
        Self {
            flow,
            prompt,
            endpoint: endpoint.into(),
        }
    }

    pub async fn run(&self) -> Result<UpdateOutcome> {
        tracing::info!("Checking network connectivity...");
        if !self.flow.is_online().await {
            return Err(UpdaterError::NoInternetError {
                endpoint: self.endpoint.clone(),
            });
        }

        // 取得分支最新 commit
        tracing::info!("Resolving latest commit...");
        let sha = self.flow.resolve_commit().await?;

        // 讀取 manifest
        tracing::info!("Fetching release manifest for {}...", sha);
        let plan = self.flow.fetch_plan(sha).await?;
        tracing::info!(
            "Release {} available at {}",
            plan.release.version.as_deref().unwrap_or("(unknown version)"),
            plan.download_url
        );

        if !self.prompt.confirm(&plan).await? {
            tracing::info!("Upgrade declined");
            return Ok(UpdateOutcome::Declined);
        }

        let package = self.flow.download(&plan).await?;

        tracing::info!("Applying package...");
        self.flow.apply(&package).await
    }
}
