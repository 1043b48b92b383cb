use clap::Parser;
use stub_updater::adapters::prompt::{AutoConfirm, TerminalPrompt};
use stub_updater::core::resources::load_resources;
use stub_updater::core::{ConfigProvider, Prompt};
use stub_updater::utils::{logger, validation::Validate};
use stub_updater::{CliConfig, HttpUpdateFlow, TomlConfig, UpdateEngine, UpdateOutcome};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting stub-updater");

    let exit_code = match cli.config.clone() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path.display());
            let mut config = match TomlConfig::from_file(&path) {
                Ok(config) => config.with_defaults(),
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path.display(), e);
                    std::process::exit(1);
                }
            };
            config.override_apply_mode(cli.apply_mode);
            run(config, cli.yes).await
        }
        None => {
            let yes = cli.yes;
            run(cli, yes).await
        }
    };

    std::process::exit(exit_code);
}

async fn run<C: ConfigProvider + Validate + 'static>(config: C, assume_yes: bool) -> i32 {
    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        return 1;
    }

    // 資源檔解密失敗不影響更新流程
    if let Some(settings) = config.resource_blob() {
        match load_resources(&settings, config.cache_dir()).await {
            Ok(path) => tracing::info!("Resources unpacked to {}", path.display()),
            Err(e) => tracing::warn!("Failed to unpack resources: {}", e),
        }
    }

    tracing::info!("Apply mode: {}", config.apply_mode());
    let endpoint = config.branch_api_url().to_string();
    let flow = match HttpUpdateFlow::new(config) {
        Ok(flow) => flow,
        Err(e) => return report_failure(&e),
    };

    let result = if assume_yes {
        execute(flow, AutoConfirm, endpoint).await
    } else {
        execute(flow, TerminalPrompt, endpoint).await
    };

    match result {
        Ok(UpdateOutcome::Declined) => {
            println!("Upgrade cancelled");
            0
        }
        Ok(UpdateOutcome::Installed { package }) => {
            tracing::info!("✅ Package installed from {}", package.display());
            println!("✅ Installed {}", package.display());
            0
        }
        Ok(UpdateOutcome::Staged { slot }) => {
            tracing::info!("✅ Module staged at {}", slot.display());
            println!("✅ Update staged, relaunch the app to finish the upgrade");
            0
        }
        Err(e) => report_failure(&e),
    }
}

async fn execute<C: ConfigProvider + 'static, P: Prompt>(
    flow: HttpUpdateFlow<C>,
    prompt: P,
    endpoint: String,
) -> stub_updater::Result<UpdateOutcome> {
    UpdateEngine::new(flow, prompt, endpoint).run().await
}

fn report_failure(e: &stub_updater::UpdaterError) -> i32 {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Update failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());

    // 根據錯誤嚴重程度決定退出碼
    e.severity().exit_code()
}
