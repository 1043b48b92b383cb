use crate::domain::model::{CommitSha, ReleaseInfo};
use crate::utils::error::{Result, UpdaterError};
use serde_json::Value;

/// 從分支 API 回應中取出 `commit.sha`
pub fn parse_commit_sha(json: &Value) -> Result<CommitSha> {
    let sha = required_str(json, &["commit", "sha"])?;
    // commit 會被拼進 CDN 路徑，只接受十六進位字元
    if sha.is_empty() || !sha.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(UpdaterError::ManifestFieldError {
            field: "commit.sha".to_string(),
        });
    }
    Ok(CommitSha(sha.to_string()))
}

/// 從 manifest 中取出 `<key>.link` 以及可選的版本資訊
pub fn parse_release(json: &Value, key: &str) -> Result<ReleaseInfo> {
    let link = required_str(json, &[key, "link"])?;
    if link.trim().is_empty() {
        return Err(UpdaterError::ManifestFieldError {
            field: format!("{}.link", key),
        });
    }

    let entry = &json[key];
    Ok(ReleaseInfo {
        link: link.to_string(),
        version: optional_text(entry, "version"),
        version_code: optional_text(entry, "versionCode"),
        note: optional_text(entry, "note"),
    })
}

fn required_str<'a>(json: &'a Value, path: &[&str]) -> Result<&'a str> {
    let mut current = json;
    for segment in path {
        current = current
            .get(segment)
            .ok_or_else(|| UpdaterError::ManifestFieldError {
                field: path.join("."),
            })?;
    }
    current.as_str().ok_or_else(|| UpdaterError::ManifestFieldError {
        field: path.join("."),
    })
}

// versionCode 在不同的 manifest 裡有時是字串、有時是數字
fn optional_text(entry: &Value, field: &str) -> Option<String> {
    match entry.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
