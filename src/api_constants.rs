/// 翻译API与镜像流程配置常量
///
/// 该文件定义了翻译服务、页面渲染和镜像输出相关的常量配置，方便统一管理和维护

/// 默认翻译API配置
pub mod api_config {
    /// 默认翻译API地址（DeepLX兼容接口）
    pub const DEFAULT_API_URL: &str = "http://localhost:1188/translate";

    /// 请求体中的源语言（自动检测）
    pub const SOURCE_LANG_AUTO: &str = "auto";
}

/// 翻译服务配置
pub mod service_config {
    /// 默认目标语言
    pub const DEFAULT_TARGET_LANG: &str = "zh";

    /// 支持的语言代码
    pub const SUPPORTED_LANGUAGES: &[&str] = &[
        "zh", "en", "ja", "ko", "fr", "de", "es", "it", "pt", "ru",
        "ar", "hi", "th", "vi", "id", "ms", "tl", "nl", "sv", "da",
        "no", "fi", "pl", "cs", "sk", "hu", "ro", "bg", "hr", "sr",
        "sl", "et", "lv", "lt", "mt", "ga", "cy", "is", "mk", "sq"
    ];

    /// 默认批处理大小
    pub const DEFAULT_BATCH_SIZE: usize = 25;

    /// 请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
}

/// 页面渲染配置
pub mod crawler_config {
    /// 默认渲染超时时间（秒）
    pub const DEFAULT_RENDER_TIMEOUT: u64 = 30;

    /// 导航完成后等待脚本执行的时间（毫秒）
    pub const DEFAULT_SETTLE_MS: u64 = 500;

    /// 默认渲染尝试次数（1 = 不重试）
    pub const DEFAULT_RENDER_ATTEMPTS: u32 = 1;

    /// 重试延迟基数（毫秒）
    pub const RETRY_DELAY_BASE_MS: u64 = 2000;

    /// 静态抓取默认User-Agent
    pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; MirrorTranslate/0.1.0)";
}

/// 镜像输出配置
pub mod mirror_config {
    /// 根页面的中间文件名（不含扩展名）
    pub const INTERMEDIATE_STEM: &str = "__mirror_root";

    /// 最终根页面默认文件名（不含扩展名）
    pub const DEFAULT_FINAL_STEM: &str = "index";

    /// 输出文件扩展名
    pub const HTML_EXTENSION: &str = ".html";

    /// 默认模式下判定为外部链接的子串
    pub const EXTERNAL_MARKERS: &[&str] = &["https", "http", "mailto"];
}

/// 实用工具函数
/// 获取API URL，未指定或为空时使用默认地址
pub fn get_api_url(custom_api: Option<&str>) -> &str {
    match custom_api {
        Some(custom) if !custom.is_empty() => custom,
        _ => api_config::DEFAULT_API_URL,
    }
}

/// 验证API URL是否有效
pub fn is_valid_api_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// 验证语言代码是否支持
pub fn is_supported_language(lang: &str) -> bool {
    service_config::SUPPORTED_LANGUAGES.contains(&lang)
}

/// 获取批处理大小，至少为1
pub fn get_batch_size(custom_size: Option<usize>) -> usize {
    custom_size
        .unwrap_or(service_config::DEFAULT_BATCH_SIZE)
        .max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_selection() {
        assert_eq!(get_api_url(None), api_config::DEFAULT_API_URL);
        assert_eq!(get_api_url(Some("")), api_config::DEFAULT_API_URL);
        assert_eq!(get_api_url(Some("http://custom.api")), "http://custom.api");
    }

    #[test]
    fn test_language_validation() {
        assert!(is_supported_language("zh"));
        assert!(is_supported_language("fr"));
        assert!(!is_supported_language("xx"));
    }

    #[test]
    fn test_batch_size_selection() {
        assert_eq!(get_batch_size(None), service_config::DEFAULT_BATCH_SIZE);
        assert_eq!(get_batch_size(Some(50)), 50);
        assert_eq!(get_batch_size(Some(0)), 1);
    }

    #[test]
    fn test_api_url_validation() {
        assert!(is_valid_api_url("https://example.com"));
        assert!(is_valid_api_url("http://localhost:8080"));
        assert!(!is_valid_api_url("ftp://example.com"));
        assert!(!is_valid_api_url("invalid-url"));
    }
}
