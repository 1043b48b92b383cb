use regex::{Captures, Regex};
use std::sync::LazyLock;
use url::Url;

pub const DEFAULT_BRANCH_API: &str =
    "https://api.github.com/repos/vvb2060/magisk_files/branches/alpha";
pub const DEFAULT_CDN_TEMPLATE: &str = "https://cdn.jsdelivr.net/gh/vvb2060/magisk_files@{sha}/{file}";
pub const DEFAULT_MANIFEST_FILE: &str = "alpha.json";
pub const DEFAULT_MANIFEST_KEY: &str = "magisk";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(sha|file)\}").expect("placeholder pattern is valid"));

/// 將 commit 與檔名填入 CDN 模板。
///
/// 單次替換：填入的值即使含有 `{file}` 也不會被再次展開
pub fn render_cdn_url(template: &str, sha: &str, file: &str) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "sha" => sha.to_string(),
            _ => file.to_string(),
        })
        .into_owned()
}

/// manifest 裡的下載連結通常是相對於同一個 commit 的檔名，
/// 但若已是完整的 http(s) 網址則直接使用
pub fn resolve_package_url(template: &str, sha: &str, link: &str) -> String {
    match Url::parse(link) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => link.to_string(),
        _ => render_cdn_url(template, sha, link.trim_start_matches('/')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_default_template() {
        let url = render_cdn_url(DEFAULT_CDN_TEMPLATE, "4f2a9c1", "alpha.json");
        assert_eq!(
            url,
            "https://cdn.jsdelivr.net/gh/vvb2060/magisk_files@4f2a9c1/alpha.json"
        );
    }

    #[test]
    fn test_render_path_style_template() {
        let url = render_cdn_url("https://cdn.example.com/{sha}/{file}", "abc123", "app-release.apk");
        assert_eq!(url, "https://cdn.example.com/abc123/app-release.apk");
    }

    #[test]
    fn test_substituted_values_are_not_expanded_again() {
        let url = render_cdn_url("https://cdn.example.com/{sha}/{file}", "{file}", "alpha.json");
        assert_eq!(url, "https://cdn.example.com/{file}/alpha.json");

        let url = render_cdn_url("https://cdn.example.com/{sha}/{file}", "abc123", "{sha}.apk");
        assert_eq!(url, "https://cdn.example.com/abc123/{sha}.apk");
    }

    #[test]
    fn test_relative_link_is_templated() {
        let url = resolve_package_url(DEFAULT_CDN_TEMPLATE, "abc123", "app-release.apk");
        assert_eq!(
            url,
            "https://cdn.jsdelivr.net/gh/vvb2060/magisk_files@abc123/app-release.apk"
        );

        let url = resolve_package_url(DEFAULT_CDN_TEMPLATE, "abc123", "/app-release.apk");
        assert!(url.ends_with("@abc123/app-release.apk"));
    }

    #[test]
    fn test_absolute_link_is_kept() {
        let link = "https://github.com/owner/repo/releases/download/v1/app.apk";
        assert_eq!(resolve_package_url(DEFAULT_CDN_TEMPLATE, "abc123", link), link);
    }
}
