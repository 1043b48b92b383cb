use crate::adapters::install::installer_for;
use crate::core::cdn::{render_cdn_url, resolve_package_url};
use crate::core::manifest::{parse_commit_sha, parse_release};
use crate::core::{CommitSha, ConfigProvider, Installer, UpdateFlow, UpdateOutcome, UpdatePlan};
use crate::utils::error::{Result, UpdaterError};
use crate::utils::network::check_network_status;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct HttpUpdateFlow<C: ConfigProvider> {
    config: C,
    client: Client,
    installer: Box<dyn Installer>,
}

impl<C: ConfigProvider> HttpUpdateFlow<C> {
    pub fn new(config: C) -> Result<Self> {
        let installer = installer_for(&config);
        Self::with_installer(config, installer)
    }

    pub fn with_installer(config: C, installer: Box<dyn Installer>) -> Result<Self> {
        // GitHub API 沒有 User-Agent 會直接回 403
        // 下載沒有總時限，但伺服器停止送資料超過 read_timeout 就中止
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.request_timeout())
            .read_timeout(config.request_timeout())
            .build()?;
        Ok(Self {
            config,
            client,
            installer,
        })
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        tracing::debug!("Making API request to: {}", url);
        let response = self
            .client
            .get(url)
            .timeout(self.config.request_timeout())
            .send()
            .await?;

        tracing::debug!("API response status: {}", response.status());
        if !response.status().is_success() {
            return Err(UpdaterError::HttpStatusError {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn download_to(&self, url: &str, target: &Path) -> Result<u64> {
        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(UpdaterError::HttpStatusError {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let total = response.content_length();
        if total.is_none() {
            tracing::warn!("No Content-Length header, download progress is unavailable");
        }

        let mut file = tokio::fs::File::create(target).await?;
        let mut written: u64 = 0;
        let mut last_decile = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;

            if let Some(total) = total.filter(|t| *t > 0) {
                let decile = written * 10 / total;
                if decile > last_decile {
                    last_decile = decile;
                    tracing::debug!("Downloaded {}% ({}/{} bytes)", decile * 10, written, total);
                }
            }
        }
        file.flush().await?;
        file.sync_all().await?;

        Ok(written)
    }
}

/// 確認下載的檔案是可讀的 APK（ZIP 且含 AndroidManifest.xml）
pub fn verify_package(path: &Path) -> Result<()> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(std::io::BufReader::new(file))?;
    if archive.by_name("AndroidManifest.xml").is_err() {
        return Err(UpdaterError::PackageError {
            message: format!("{} has no AndroidManifest.xml", path.display()),
        });
    }
    Ok(())
}

#[async_trait::async_trait]
impl<C: ConfigProvider> UpdateFlow for HttpUpdateFlow<C> {
    async fn is_online(&self) -> bool {
        check_network_status(
            &self.client,
            self.config.branch_api_url(),
            self.config.request_timeout(),
        )
        .await
    }

    async fn resolve_commit(&self) -> Result<CommitSha> {
        let json = self.get_json(self.config.branch_api_url()).await?;
        let sha = parse_commit_sha(&json)?;
        tracing::debug!("Branch head is at {}", sha);
        Ok(sha)
    }

    async fn fetch_plan(&self, sha: CommitSha) -> Result<UpdatePlan> {
        let template = self.config.cdn_template();
        let manifest_url = render_cdn_url(template, sha.as_str(), self.config.manifest_file());
        let json = self.get_json(&manifest_url).await?;

        let release = parse_release(&json, self.config.manifest_key())?;
        let download_url = resolve_package_url(template, sha.as_str(), &release.link);

        Ok(UpdatePlan {
            sha,
            release,
            download_url,
        })
    }

    async fn download(&self, plan: &UpdatePlan) -> Result<PathBuf> {
        let target = self.config.package_path();
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // 下載到 .part，完成後才改名，避免留下半個套件
        let partial = target.with_extension("apk.part");
        tracing::info!("⬇️  Downloading {}", plan.download_url);
        let bytes = match self.download_to(&plan.download_url, &partial).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, &target).await?;

        tracing::info!("Downloaded {} bytes to {}", bytes, target.display());
        Ok(target)
    }

    async fn apply(&self, package: &Path) -> Result<UpdateOutcome> {
        verify_package(package)?;
        self.installer.install(package).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::model::ApplyMode;
    use crate::domain::ports::ResourceBlobSettings;
    use httpmock::prelude::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    pub(crate) struct MockConfig {
        pub branch_api: String,
        pub cdn_template: String,
        pub cache_dir: PathBuf,
        pub install_command: Vec<String>,
        pub timeout: Duration,
    }

    impl MockConfig {
        pub fn new(server: &MockServer, cache_dir: &Path) -> Self {
            Self {
                branch_api: server.url("/repos/owner/files/branches/alpha"),
                cdn_template: server.url("/cdn/{sha}/{file}"),
                cache_dir: cache_dir.to_path_buf(),
                install_command: vec!["true".to_string(), "{package}".to_string()],
                timeout: Duration::from_secs(5),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn branch_api_url(&self) -> &str {
            &self.branch_api
        }

        fn cdn_template(&self) -> &str {
            &self.cdn_template
        }

        fn manifest_file(&self) -> &str {
            "alpha.json"
        }

        fn manifest_key(&self) -> &str {
            "magisk"
        }

        fn cache_dir(&self) -> &Path {
            &self.cache_dir
        }

        fn request_timeout(&self) -> Duration {
            self.timeout
        }

        fn apply_mode(&self) -> ApplyMode {
            ApplyMode::Install
        }

        fn install_command(&self) -> &[String] {
            &self.install_command
        }

        fn module_slot(&self) -> PathBuf {
            self.cache_dir.join("dyn").join("current.apk")
        }

        fn resource_blob(&self) -> Option<ResourceBlobSettings> {
            None
        }
    }

    /// 記錄被安裝的套件路徑，不執行任何外部程式
    #[derive(Clone, Default)]
    pub(crate) struct RecordingInstaller {
        pub installed: Arc<Mutex<Vec<PathBuf>>>,
    }

    #[async_trait::async_trait]
    impl Installer for RecordingInstaller {
        async fn install(&self, package: &Path) -> Result<UpdateOutcome> {
            self.installed.lock().unwrap().push(package.to_path_buf());
            Ok(UpdateOutcome::Installed {
                package: package.to_path_buf(),
            })
        }
    }

    pub(crate) fn fake_apk() -> Vec<u8> {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        zip.start_file::<_, ()>("AndroidManifest.xml", zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(b"<manifest/>").unwrap();
        zip.start_file::<_, ()>("classes.dex", zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(b"dex\n035").unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn flow(server: &MockServer, cache: &Path) -> HttpUpdateFlow<MockConfig> {
        HttpUpdateFlow::with_installer(
            MockConfig::new(server, cache),
            Box::new(RecordingInstaller::default()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_commit_reads_branch_head() {
        let server = MockServer::start();
        let branch = server.mock(|when, then| {
            when.method(GET).path("/repos/owner/files/branches/alpha");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"name": "alpha", "commit": {"sha": "abc123"}}));
        });

        let dir = tempfile::tempdir().unwrap();
        let sha = flow(&server, dir.path()).resolve_commit().await.unwrap();

        branch.assert();
        assert_eq!(sha.as_str(), "abc123");
    }

    #[tokio::test]
    async fn test_fetch_plan_templates_manifest_and_link() {
        let server = MockServer::start();
        let manifest = server.mock(|when, then| {
            when.method(GET).path("/cdn/abc123/alpha.json");
            then.status(200).json_body(serde_json::json!({
                "magisk": {"version": "27.0", "versionCode": "27001", "link": "app-release.apk"}
            }));
        });

        let dir = tempfile::tempdir().unwrap();
        let plan = flow(&server, dir.path())
            .fetch_plan(CommitSha("abc123".to_string()))
            .await
            .unwrap();

        manifest.assert();
        assert_eq!(plan.download_url, server.url("/cdn/abc123/app-release.apk"));
        assert_eq!(plan.release.version.as_deref(), Some("27.0"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/repos/owner/files/branches/alpha");
            then.status(403).body("rate limited");
        });

        let dir = tempfile::tempdir().unwrap();
        let err = flow(&server, dir.path()).resolve_commit().await.unwrap_err();
        assert!(matches!(err, UpdaterError::HttpStatusError { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_malformed_json_is_reported() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/cdn/abc123/alpha.json");
            then.status(200).body("<html>not json</html>");
        });

        let dir = tempfile::tempdir().unwrap();
        let err = flow(&server, dir.path())
            .fetch_plan(CommitSha("abc123".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, UpdaterError::JsonError(_)));
    }

    #[tokio::test]
    async fn test_download_writes_fixed_cache_path() {
        let server = MockServer::start();
        let apk = fake_apk();
        let download = server.mock(|when, then| {
            when.method(GET).path("/cdn/abc123/app-release.apk");
            then.status(200).body(apk.clone());
        });

        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        let flow = flow(&server, &cache);
        let plan = UpdatePlan {
            sha: CommitSha("abc123".to_string()),
            release: crate::domain::model::ReleaseInfo {
                link: "app-release.apk".to_string(),
                version: None,
                version_code: None,
                note: None,
            },
            download_url: server.url("/cdn/abc123/app-release.apk"),
        };

        let path = flow.download(&plan).await.unwrap();

        download.assert();
        assert_eq!(path, cache.join("manager.apk"));
        assert_eq!(std::fs::read(&path).unwrap(), apk);
        assert!(!cache.join("manager.apk.part").exists());
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_partial_file() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/cdn/abc123/app-release.apk");
            then.status(404);
        });

        let dir = tempfile::tempdir().unwrap();
        let flow = flow(&server, dir.path());
        let plan = UpdatePlan {
            sha: CommitSha("abc123".to_string()),
            release: crate::domain::model::ReleaseInfo {
                link: "app-release.apk".to_string(),
                version: None,
                version_code: None,
                note: None,
            },
            download_url: server.url("/cdn/abc123/app-release.apk"),
        };

        assert!(flow.download(&plan).await.is_err());
        assert!(!dir.path().join("manager.apk").exists());
        assert!(!dir.path().join("manager.apk.part").exists());
    }

    #[tokio::test]
    async fn test_stalled_download_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/cdn/abc123/app-release.apk");
            then.status(200)
                .delay(Duration::from_secs(3))
                .body(fake_apk());
        });

        let dir = tempfile::tempdir().unwrap();
        let mut config = MockConfig::new(&server, dir.path());
        config.timeout = Duration::from_secs(1);
        let flow =
            HttpUpdateFlow::with_installer(config, Box::new(RecordingInstaller::default())).unwrap();
        let plan = UpdatePlan {
            sha: CommitSha("abc123".to_string()),
            release: crate::domain::model::ReleaseInfo {
                link: "app-release.apk".to_string(),
                version: None,
                version_code: None,
                note: None,
            },
            download_url: server.url("/cdn/abc123/app-release.apk"),
        };

        let started = std::time::Instant::now();
        let err = flow.download(&plan).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(matches!(err, UpdaterError::HttpError(ref e) if e.is_timeout()));
        assert!(!dir.path().join("manager.apk").exists());
        assert!(!dir.path().join("manager.apk.part").exists());
    }

    #[test]
    fn test_verify_package() {
        let dir = tempfile::tempdir().unwrap();

        let good = dir.path().join("good.apk");
        std::fs::write(&good, fake_apk()).unwrap();
        assert!(verify_package(&good).is_ok());

        let not_zip = dir.path().join("bad.apk");
        std::fs::write(&not_zip, b"<html>404</html>").unwrap();
        assert!(matches!(
            verify_package(&not_zip),
            Err(UpdaterError::PackageArchiveError(_))
        ));

        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        zip.start_file::<_, ()>("readme.txt", zip::write::FileOptions::default())
            .unwrap();
        zip.write_all(b"hi").unwrap();
        let no_manifest = dir.path().join("plain.zip");
        std::fs::write(&no_manifest, zip.finish().unwrap().into_inner()).unwrap();
        assert!(matches!(
            verify_package(&no_manifest),
            Err(UpdaterError::PackageError { .. })
        ));
    }
}
