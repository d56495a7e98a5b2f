//! 配置管理模块
//!
//! 提供CLI参数解析、镜像流程配置和渲染配置

// 标准库导入
use std::path::{Path, PathBuf};
use std::time::Duration;

// 第三方crate导入
use clap::{Parser, ValueEnum};

// 本地模块导入
use crate::api_constants::{api_config, crawler_config, mirror_config, service_config};
use crate::links::LinkFilter;

/// 文件名冲突处理策略
///
/// 两个不同的路径片段在 `/` 替换为 `_` 后可能得到同一个文件名（如 `/a/b` 与 `/a_b`）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CollisionPolicy {
    /// 保留先写入的文件，跳过后来的页面并给出警告
    #[default]
    Skip,
    /// 后来的页面覆盖先写入的文件，并给出警告
    Overwrite,
    /// 立即中止整个运行
    Error,
}

/// 渲染后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RendererKind {
    /// 无头Chrome，执行JavaScript后取DOM
    #[default]
    Chrome,
    /// 不执行JavaScript的静态抓取
    Static,
}

/// 镜像流程配置
///
/// 支持Builder模式进行链式配置。
///
/// # Examples
///
/// ```rust
/// use mirror_translate::config::{CollisionPolicy, MirrorConfig};
///
/// let config = MirrorConfig::new()
///     .with_output_dir("mirror")
///     .with_collision_policy(CollisionPolicy::Error)
///     .reattach_scripts(false);
/// assert_eq!(config.output_dir().to_str(), Some("mirror"));
/// ```
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// 输出目录
    output_dir: PathBuf,
    /// 根页面中间文件名
    intermediate_stem: String,
    /// 外部链接判定方式
    link_filter: LinkFilter,
    /// 文件名冲突策略
    collision_policy: CollisionPolicy,
    /// 是否把外部脚本重新挂到 head
    reattach_scripts: bool,
}

impl MirrorConfig {
    /// 创建新的配置实例
    ///
    /// 默认值：输出到当前目录、子串式链接过滤、冲突时跳过、重新挂载脚本。
    pub fn new() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            intermediate_stem: mirror_config::INTERMEDIATE_STEM.to_string(),
            link_filter: LinkFilter::default(),
            collision_policy: CollisionPolicy::default(),
            reattach_scripts: true,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn intermediate_stem(&self) -> &str {
        &self.intermediate_stem
    }

    pub fn link_filter(&self) -> LinkFilter {
        self.link_filter
    }

    pub fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy
    }

    pub fn is_reattach_scripts(&self) -> bool {
        self.reattach_scripts
    }

    /// 设置输出目录
    pub fn with_output_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// 设置中间文件名
    pub fn with_intermediate_stem(mut self, stem: &str) -> Self {
        self.intermediate_stem = stem.to_string();
        self
    }

    pub fn with_link_filter(mut self, filter: LinkFilter) -> Self {
        self.link_filter = filter;
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    pub fn reattach_scripts(mut self, enable: bool) -> Self {
        self.reattach_scripts = enable;
        self
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 渲染配置
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// 单页超时
    pub timeout: Duration,
    /// 导航完成后的等待时间
    pub settle: Duration,
    /// 总尝试次数（1 = 不重试）
    pub attempts: u32,
    /// 自定义User-Agent
    pub user_agent: Option<String>,
    /// Chrome可执行文件路径（为空时自动查找）
    pub chrome_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crawler_config::DEFAULT_RENDER_TIMEOUT),
            settle: Duration::from_millis(crawler_config::DEFAULT_SETTLE_MS),
            attempts: crawler_config::DEFAULT_RENDER_ATTEMPTS,
            user_agent: None,
            chrome_path: None,
        }
    }
}

/// CLI参数结构
#[derive(Parser, Debug)]
#[command(author, version, about = "单层网页镜像翻译工具 - 渲染根页面及其站内链接并生成可离线浏览的译文镜像", long_about = None)]
pub struct Cli {
    /// 根页面URL（同时作为站点前缀）
    #[arg(short, long, value_name = "URL")]
    pub url: String,

    /// 最终根页面文件名（不含 .html）
    #[arg(short, long, default_value = mirror_config::DEFAULT_FINAL_STEM)]
    pub output: String,

    /// 目标语言代码 (如: zh, en, ja, fr)
    #[arg(short, long, default_value = service_config::DEFAULT_TARGET_LANG)]
    pub lang: String,

    /// 翻译API地址
    #[arg(short, long, default_value = api_config::DEFAULT_API_URL)]
    pub api: String,

    /// 每个翻译请求包含的文本条数
    #[arg(long, default_value_t = service_config::DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// 输出目录
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// 渲染后端
    #[arg(long, value_enum, default_value_t = RendererKind::Chrome)]
    pub renderer: RendererKind,

    /// Chrome可执行文件路径
    #[arg(long, value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// 单页渲染超时时间（秒）
    #[arg(long, default_value_t = crawler_config::DEFAULT_RENDER_TIMEOUT)]
    pub render_timeout: u64,

    /// 导航完成后等待脚本执行的时间（毫秒）
    #[arg(long, default_value_t = crawler_config::DEFAULT_SETTLE_MS)]
    pub settle_ms: u64,

    /// 单页渲染尝试次数（1 = 失败即中止）
    #[arg(long, default_value_t = crawler_config::DEFAULT_RENDER_ATTEMPTS)]
    pub render_attempts: u32,

    /// 自定义User-Agent字符串
    #[arg(long)]
    pub user_agent: Option<String>,

    /// 文件名冲突处理策略
    #[arg(long, value_enum, default_value_t = CollisionPolicy::Skip)]
    pub collision: CollisionPolicy,

    /// 按URL协议判断外部链接（默认按子串 http/https/mailto 判断）
    #[arg(long)]
    pub scheme_aware_links: bool,

    /// 不把外部脚本重新挂到 head
    #[arg(long)]
    pub no_reattach_scripts: bool,

    /// 详细输出模式
    #[arg(short, long)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long)]
    pub quiet: bool,

    /// 显示运行统计
    #[arg(long)]
    pub stats: bool,
}

impl Cli {
    /// 生成镜像流程配置
    pub fn mirror_config(&self) -> MirrorConfig {
        let filter = if self.scheme_aware_links {
            LinkFilter::Scheme
        } else {
            LinkFilter::Substring
        };

        MirrorConfig::new()
            .with_output_dir(&self.output_dir)
            .with_link_filter(filter)
            .with_collision_policy(self.collision)
            .reattach_scripts(!self.no_reattach_scripts)
    }

    /// 生成渲染配置
    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            timeout: Duration::from_secs(self.render_timeout),
            settle: Duration::from_millis(self.settle_ms),
            attempts: self.render_attempts.max(1),
            user_agent: self.user_agent.clone(),
            chrome_path: self.chrome_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_config_defaults() {
        let config = MirrorConfig::default();

        assert_eq!(config.output_dir(), Path::new("."));
        assert_eq!(config.intermediate_stem(), mirror_config::INTERMEDIATE_STEM);
        assert_eq!(config.link_filter(), LinkFilter::Substring);
        assert_eq!(config.collision_policy(), CollisionPolicy::Skip);
        assert!(config.is_reattach_scripts());
    }

    #[test]
    fn test_cli_defaults_map_to_configs() {
        let cli = Cli::parse_from(["mirror-translate", "--url", "https://site.com"]);

        assert_eq!(cli.output, "index");
        assert_eq!(cli.lang, "zh");
        assert_eq!(cli.renderer, RendererKind::Chrome);

        let render = cli.render_config();
        assert_eq!(render.attempts, 1);
        assert_eq!(render.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_cli_flags_map_to_configs() {
        let cli = Cli::parse_from([
            "mirror-translate",
            "-u",
            "https://site.com",
            "-l",
            "fr",
            "--collision",
            "error",
            "--renderer",
            "static",
            "--scheme-aware-links",
            "--no-reattach-scripts",
            "--render-attempts",
            "0",
            "--output-dir",
            "out",
        ]);

        let config = cli.mirror_config();
        assert_eq!(config.collision_policy(), CollisionPolicy::Error);
        assert_eq!(config.link_filter(), LinkFilter::Scheme);
        assert!(!config.is_reattach_scripts());
        assert_eq!(config.output_dir(), Path::new("out"));
        assert_eq!(cli.renderer, RendererKind::Static);
        assert_eq!(cli.render_config().attempts, 1);
    }

    #[test]
    fn test_api_and_batch_size_come_from_single_flags() {
        let cli = Cli::parse_from([
            "mirror-translate",
            "-u",
            "https://site.com",
            "--api",
            "http://translate.internal/api",
            "--batch-size",
            "40",
        ]);

        assert_eq!(cli.api, "http://translate.internal/api");
        assert_eq!(cli.batch_size, 40);

        for removed in ["--local-api", "--large-batch"] {
            let parsed = Cli::try_parse_from(["mirror-translate", "-u", "https://site.com", removed]);
            assert!(parsed.is_err(), "{} 不应再被接受", removed);
        }
    }
}
