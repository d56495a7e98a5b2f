use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use mirror_translate::api_constants::{get_api_url, get_batch_size, is_valid_api_url};
use mirror_translate::config::{Cli, RendererKind};
use mirror_translate::renderer::{ChromeRenderer, PageRenderer, StaticRenderer};
use mirror_translate::stats::{format_duration, print_crawl_stats};
use mirror_translate::translator::HttpTranslator;
use mirror_translate::utils::{check_target_language, init_logging, validate_root_url};
use mirror_translate::SiteMirror;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    // 验证输入
    validate_root_url(&cli.url).context("根页面URL无效")?;
    check_target_language(&cli.lang)?;

    let api_url = get_api_url(Some(&cli.api)).to_string();
    if !is_valid_api_url(&api_url) {
        anyhow::bail!("翻译API地址无效: {}", api_url);
    }

    if !cli.quiet {
        info!("🚀 启动单层镜像翻译");
        info!("🌐 根页面: {}", cli.url);
        info!("📂 输出目录: {}", cli.output_dir.display());
        info!("🈯 目标语言: {}", cli.lang);
    }

    let render_config = cli.render_config();
    let result = match cli.renderer {
        RendererKind::Chrome => {
            run_mirror(ChromeRenderer::new(render_config), &cli, &api_url).await
        }
        RendererKind::Static => {
            run_mirror(StaticRenderer::new(render_config), &cli, &api_url).await
        }
    };

    if let Err(e) = result {
        error!("❌ 镜像失败: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 使用指定渲染器执行一次完整镜像
async fn run_mirror<R: PageRenderer>(renderer: R, cli: &Cli, api_url: &str) -> Result<()> {
    let batch_size = get_batch_size(Some(cli.batch_size));
    let translator = HttpTranslator::new(api_url, batch_size).context("创建翻译客户端失败")?;

    let mirror = SiteMirror::new(renderer, translator, cli.mirror_config());
    let report = mirror
        .mirror_site(&cli.url, &cli.output, &cli.lang)
        .await
        .with_context(|| format!("镜像 {} 失败", cli.url))?;

    if !cli.quiet {
        info!(
            "✅ 完成！最终页面: {}，总耗时: {}",
            report.final_page.display(),
            format_duration(report.stats.total_time)
        );
        for path in &report.linked_pages {
            info!("   └─ {}", path.display());
        }
        if !report.skipped_links.is_empty() {
            info!("⚠️  因文件名冲突跳过: {:?}", report.skipped_links);
        }
    }

    if cli.stats || cli.verbose {
        print_crawl_stats(&report.stats);
    }

    Ok(())
}
