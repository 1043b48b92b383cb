use reqwest::Client;
use std::time::Duration;

/// 以 HEAD 請求探測端點是否可達。
///
/// 只要伺服器有回應（即使是 4xx/5xx）就視為有網路；
/// 只有連線層級的錯誤（DNS、連線被拒、逾時）才算離線。
pub async fn check_network_status(client: &Client, endpoint: &str, timeout: Duration) -> bool {
    match client.head(endpoint).timeout(timeout).send().await {
        Ok(response) => {
            tracing::debug!("Connectivity probe {} -> {}", endpoint, response.status());
            true
        }
        Err(e) => {
            tracing::debug!("Connectivity probe {} failed: {}", endpoint, e);
            false
        }
    }
}
