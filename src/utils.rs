//! 通用工具函数
//!
//! 日志初始化、输入校验和URL拼接

use tracing::warn;
use url::Url;

use crate::api_constants::is_supported_language;
use crate::error::Result;

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 验证根页面URL：必须是 http/https 绝对地址
pub fn validate_root_url(input: &str) -> Result<Url> {
    let url = Url::parse(input)
        .map_err(|e| crate::mirror_error!(input_validation, input, e))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(crate::mirror_error!(
            input_validation,
            input,
            "URL必须以http://或https://开头"
        ));
    }

    Ok(url)
}

/// 检查目标语言，不在支持列表中只给出警告
pub fn check_target_language(lang: &str) -> Result<()> {
    if lang.trim().is_empty() {
        return Err(crate::mirror_error!(config, "lang", "目标语言不能为空"));
    }

    if !is_supported_language(lang) {
        warn!("⚠️  目标语言 '{}' 不在已知列表中，将直接交给翻译服务", lang);
    }

    Ok(())
}

/// 拼接站点URL与路径片段，接缝处只保留一个 `/`
///
/// ```rust
/// use mirror_translate::utils::join_page_url;
///
/// assert_eq!(join_page_url("https://site.com", "about"), "https://site.com/about");
/// assert_eq!(join_page_url("https://site.com/", "/about"), "https://site.com/about");
/// ```
pub fn join_page_url(base_url: &str, fragment: &str) -> String {
    match (base_url.ends_with('/'), fragment.starts_with('/')) {
        (true, true) => format!("{}{}", base_url, &fragment[1..]),
        (false, false) if !fragment.is_empty() && !fragment.starts_with(['?', '#']) => {
            format!("{}/{}", base_url, fragment)
        }
        _ => format!("{}{}", base_url, fragment),
    }
}
