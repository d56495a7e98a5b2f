//! 运行统计

use std::time::Duration;

use chrono::{DateTime, Local};

/// 一次镜像运行的统计
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub started_at: DateTime<Local>,
    pub pages_rendered: usize,
    pub texts_translated: usize,
    pub links_found: usize,
    pub links_skipped: usize,
    pub render_time: Duration,
    pub translate_time: Duration,
    pub total_time: Duration,
    pub output_bytes: u64,
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self {
            started_at: Local::now(),
            pages_rendered: 0,
            texts_translated: 0,
            links_found: 0,
            links_skipped: 0,
            render_time: Duration::ZERO,
            translate_time: Duration::ZERO,
            total_time: Duration::ZERO,
            output_bytes: 0,
        }
    }
}

/// 打印运行统计
pub fn print_crawl_stats(stats: &CrawlStats) {
    println!("\n📊 镜像统计报告:");
    println!("═══════════════════════════════════════");
    println!("🕐 开始时间: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S"));

    // 时间分解
    println!("\n⏱️  时间分解:");
    println!("   页面渲染: {}", format_duration(stats.render_time));
    println!("   文本翻译: {}", format_duration(stats.translate_time));
    println!("   总耗时: {}", format_duration(stats.total_time));

    // 页面统计
    println!("\n📄 页面统计:");
    println!("   渲染页面: {} 个", stats.pages_rendered);
    println!("   站内链接: {} 个", stats.links_found);
    println!("   跳过链接: {} 个", stats.links_skipped);
    println!("   翻译文本节点: {} 个", stats.texts_translated);

    println!(
        "\n💾 输出大小: {} 字节 ({:.1} KB)",
        stats.output_bytes,
        stats.output_bytes as f64 / 1024.0
    );

    if stats.pages_rendered > 0 {
        let per_page = stats.total_time / stats.pages_rendered as u32;
        println!("🚀 平均每页: {}", format_duration(per_page));
    }
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}
