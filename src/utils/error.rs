use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("No internet connection: {endpoint} is unreachable")]
    NoInternetError { endpoint: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatusError { url: String, status: u16 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Manifest is missing field '{field}'")]
    ManifestFieldError { field: String },

    #[error("Package archive is invalid: {0}")]
    PackageArchiveError(#[from] zip::result::ZipError),

    #[error("Package is invalid: {message}")]
    PackageError { message: String },

    #[error("Resource decryption failed: {message}")]
    DecryptError { message: String },

    #[error("Installation failed: {message}")]
    InstallError { message: String },

    #[error("Prompt failed: {message}")]
    PromptError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Manifest,
    Package,
    Install,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// 失敗一律回傳非零退出碼
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl UpdaterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            UpdaterError::NoInternetError { .. }
            | UpdaterError::HttpError(_)
            | UpdaterError::HttpStatusError { .. } => ErrorCategory::Network,
            UpdaterError::JsonError(_) | UpdaterError::ManifestFieldError { .. } => {
                ErrorCategory::Manifest
            }
            UpdaterError::PackageArchiveError(_)
            | UpdaterError::PackageError { .. }
            | UpdaterError::DecryptError { .. } => ErrorCategory::Package,
            UpdaterError::InstallError { .. } => ErrorCategory::Install,
            UpdaterError::ConfigError { .. }
            | UpdaterError::ConfigValidationError { .. }
            | UpdaterError::InvalidConfigValueError { .. }
            | UpdaterError::MissingConfigError { .. } => ErrorCategory::Configuration,
            UpdaterError::IoError(_) | UpdaterError::PromptError { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Manifest | ErrorCategory::Package | ErrorCategory::Install => {
                ErrorSeverity::High
            }
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            UpdaterError::NoInternetError { .. } => "Check the network connection and try again",
            UpdaterError::HttpError(_) | UpdaterError::HttpStatusError { .. } => {
                "The update server may be unavailable; try again later"
            }
            UpdaterError::JsonError(_) | UpdaterError::ManifestFieldError { .. } => {
                "The release manifest has an unexpected format; check --manifest-key and the CDN template"
            }
            UpdaterError::PackageArchiveError(_) | UpdaterError::PackageError { .. } => {
                "Delete the cached package and download it again"
            }
            UpdaterError::DecryptError { .. } => "Check the resource key and IV",
            UpdaterError::InstallError { .. } => {
                "Check that the installer command exists and has permission to install packages"
            }
            UpdaterError::PromptError { .. } => "Run with --yes when no terminal is attached",
            UpdaterError::ConfigError { .. }
            | UpdaterError::ConfigValidationError { .. }
            | UpdaterError::InvalidConfigValueError { .. }
            | UpdaterError::MissingConfigError { .. } => "Fix the configuration and run again",
            UpdaterError::IoError(_) => "Check disk space and permissions of the cache directory",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            UpdaterError::NoInternetError { .. } => {
                "Please connect to the Internet to download the app".to_string()
            }
            UpdaterError::HttpError(_) | UpdaterError::HttpStatusError { .. } => {
                format!("Could not reach the update server ({})", self)
            }
            UpdaterError::JsonError(_) | UpdaterError::ManifestFieldError { .. } => {
                format!("Could not read the release manifest ({})", self)
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpdaterError>;
