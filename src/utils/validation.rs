use crate::utils::error::{Result, UpdaterError};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(UpdaterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(UpdaterError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(UpdaterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// CDN 模板必須同時帶有 `{sha}` 與 `{file}`，填入後也必須是合法網址
pub fn validate_cdn_template(field_name: &str, template: &str) -> Result<()> {
    for placeholder in ["{sha}", "{file}"] {
        if !template.contains(placeholder) {
            return Err(UpdaterError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: template.to_string(),
                reason: format!("Template must contain the {} placeholder", placeholder),
            });
        }
    }

    let sample = template.replace("{sha}", "0").replace("{file}", "x");
    validate_url(field_name, &sample).map_err(|_| UpdaterError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: template.to_string(),
        reason: "Template does not expand to an http(s) URL".to_string(),
    })
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(UpdaterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(UpdaterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(UpdaterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(UpdaterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 安裝命令不可為空，且至少一個參數要引用 `{package}`
pub fn validate_install_command(field_name: &str, command: &[String]) -> Result<()> {
    let Some(program) = command.first() else {
        return Err(UpdaterError::MissingConfigError {
            field: field_name.to_string(),
        });
    };
    validate_non_empty_string(field_name, program)?;

    if !command.iter().any(|arg| arg.contains("{package}")) {
        return Err(UpdaterError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: command.join(" "),
            reason: "Command must reference the {package} placeholder".to_string(),
        });
    }
    Ok(())
}
