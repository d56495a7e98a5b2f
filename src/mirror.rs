//! 单层镜像流程
//!
//! 三个阶段严格顺序执行，不回退：
//! 1. Root：渲染并翻译根页面，以中间文件名保存
//! 2. FanOut：读回根页面，提取站内链接，逐个渲染、翻译、保存
//! 3. Finalize：把根页面的站内链接改写为本地文件名，删除中间文件
//!
//! 只深入一层：被链接页面自身的链接既不跟随也不改写。任何一步出错都会终止整个运行。

// 标准库导入
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

// 第三方crate导入
use tracing::{debug, info, warn};

// 本地模块导入
use crate::config::{CollisionPolicy, MirrorConfig};
use crate::dom::Document;
use crate::error::{MirrorError, Result};
use crate::html_processor::{extract_script_sources, reattach_script_sources};
use crate::links::{extract_links, rewrite_saved_page};
use crate::persister::{load_document, sanitized_filename, save_document};
use crate::renderer::PageRenderer;
use crate::stats::CrawlStats;
use crate::translator::{translate_document, Translator};
use crate::utils::join_page_url;

/// 占用保留文件名的根页面
const ROOT_OWNER: &str = "<root>";

/// 镜像流程所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Root,
    FanOut,
    Finalize,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlPhase::Root => write!(f, "根页面"),
            CrawlPhase::FanOut => write!(f, "站内链接"),
            CrawlPhase::Finalize => write!(f, "链接重写"),
        }
    }
}

/// 一次镜像运行的结果
#[derive(Debug)]
pub struct MirrorReport {
    /// 最终根页面
    pub final_page: PathBuf,
    /// 按抓取顺序保存的被链接页面
    pub linked_pages: Vec<PathBuf>,
    /// 因文件名冲突被跳过的路径片段
    pub skipped_links: Vec<String>,
    pub stats: CrawlStats,
}

/// 路径片段的文件名认领结果
#[derive(Debug, PartialEq)]
enum Claim {
    New,
    /// 同一个片段再次出现
    Duplicate,
    /// 不同片段映射到已被占用的文件名
    Collision { existing: String },
}

/// 记录每个本地文件名由哪个路径片段占用
#[derive(Debug, Default)]
struct FilenameRegistry {
    owners: HashMap<String, String>,
}

impl FilenameRegistry {
    fn reserve(&mut self, stem: &str) {
        self.owners
            .insert(sanitized_filename(stem), ROOT_OWNER.to_string());
    }

    fn claim(&mut self, fragment: &str) -> Claim {
        let filename = sanitized_filename(fragment);
        match self.owners.get(&filename) {
            Some(owner) if owner == fragment => Claim::Duplicate,
            Some(owner) => Claim::Collision {
                existing: owner.clone(),
            },
            None => {
                self.owners.insert(filename, fragment.to_string());
                Claim::New
            }
        }
    }

    fn reassign(&mut self, fragment: &str) {
        self.owners
            .insert(sanitized_filename(fragment), fragment.to_string());
    }

    /// 片段对应的本地文件当前是否属于它自己
    fn owns(&self, fragment: &str) -> bool {
        self.owners
            .get(&sanitized_filename(fragment))
            .is_some_and(|owner| owner == fragment)
    }
}

/// 单层站点镜像器
pub struct SiteMirror<R, T> {
    renderer: R,
    translator: T,
    config: MirrorConfig,
}

impl<R: PageRenderer, T: Translator> SiteMirror<R, T> {
    pub fn new(renderer: R, translator: T, config: MirrorConfig) -> Self {
        Self {
            renderer,
            translator,
            config,
        }
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// 渲染、翻译并保存单个页面，返回写入的文件路径
    ///
    /// `dst_stem` 为原始路径片段，文件名在保存时才做 `/` → `_` 替换。
    pub async fn scrape_translate_page(
        &self,
        src: &str,
        dst_stem: &str,
        target_lang: &str,
        stats: &mut CrawlStats,
    ) -> Result<PathBuf> {
        let render_start = Instant::now();
        let html = self.renderer.render(src).await?;
        stats.render_time += render_start.elapsed();
        stats.pages_rendered += 1;

        let mut doc = Document::parse_html(&html)?;

        if self.config.is_reattach_scripts() {
            let sources = extract_script_sources(&doc);
            let added = reattach_script_sources(&mut doc, &sources);
            if added > 0 {
                debug!("📎 重新挂载 {} 个外部脚本", added);
            }
        }

        let translate_start = Instant::now();
        let applied = translate_document(&mut doc, &self.translator, target_lang).await?;
        stats.translate_time += translate_start.elapsed();
        stats.texts_translated += applied;

        save_document(&doc, self.config.output_dir(), dst_stem)
    }

    /// 镜像根页面及其一层站内链接
    ///
    /// `website_url` 既是根页面地址，也是剥离站内链接时使用的站点前缀。
    pub async fn mirror_site(
        &self,
        website_url: &str,
        final_page: &str,
        target_lang: &str,
    ) -> Result<MirrorReport> {
        let run_start = Instant::now();
        let mut stats = CrawlStats::default();
        let dir = self.config.output_dir();
        let intermediate = self.config.intermediate_stem();
        let filter = self.config.link_filter();

        fs::create_dir_all(dir)
            .map_err(|e| crate::mirror_error!(file_op, dir.display(), "创建目录", e))?;

        let mut registry = FilenameRegistry::default();
        registry.reserve(intermediate);
        registry.reserve(final_page);

        // 阶段一：根页面
        info!("🌐 [{}] 渲染并翻译: {}", CrawlPhase::Root, website_url);
        self.scrape_translate_page(website_url, intermediate, target_lang, &mut stats)
            .await?;

        // 阶段二：一层站内链接
        let root_doc = load_document(dir, intermediate)?;
        let links = extract_links(&root_doc, website_url, filter);
        stats.links_found = links.len();
        info!("🔍 [{}] 发现 {} 个站内链接", CrawlPhase::FanOut, links.len());

        let mut linked_pages = Vec::new();
        let mut skipped_links = Vec::new();

        for (index, link) in links.iter().enumerate() {
            match registry.claim(link) {
                Claim::New => {}
                Claim::Duplicate => {
                    debug!("重复链接，已抓取过: {}", link);
                    continue;
                }
                Claim::Collision { existing } => match self.config.collision_policy() {
                    CollisionPolicy::Error => {
                        return Err(MirrorError::FilenameCollision {
                            filename: sanitized_filename(link),
                            existing,
                            incoming: link.clone(),
                        });
                    }
                    CollisionPolicy::Overwrite if existing != ROOT_OWNER => {
                        warn!(
                            "⚠️  文件名冲突: '{}' 将覆盖 '{}' ({})",
                            link,
                            existing,
                            sanitized_filename(link)
                        );
                        registry.reassign(link);
                    }
                    _ => {
                        warn!(
                            "⚠️  文件名冲突: '{}' 与 '{}' 同为 {}，跳过",
                            link,
                            existing,
                            sanitized_filename(link)
                        );
                        skipped_links.push(link.clone());
                        stats.links_skipped += 1;
                        continue;
                    }
                },
            }

            let src = join_page_url(website_url, link);
            info!("📄 [{}/{}] {}", index + 1, links.len(), src);

            let path = self
                .scrape_translate_page(&src, link, target_lang, &mut stats)
                .await?;
            if !linked_pages.contains(&path) {
                linked_pages.push(path);
            }
        }

        // 阶段三：改写根页面链接；本地文件不属于自己的片段保持原链接
        let mut unmapped: Vec<String> = Vec::new();
        for link in &links {
            if !registry.owns(link) && !unmapped.contains(link) {
                unmapped.push(link.clone());
            }
        }

        info!("🔗 [{}] 生成最终页面: {}", CrawlPhase::Finalize, final_page);
        let final_path = rewrite_saved_page(
            dir,
            intermediate,
            final_page,
            website_url,
            filter,
            &unmapped,
        )?;

        stats.output_bytes = std::iter::once(&final_path)
            .chain(linked_pages.iter())
            .filter_map(|path| fs::metadata(path).ok())
            .map(|meta| meta.len())
            .sum();
        stats.total_time = run_start.elapsed();

        info!(
            "✅ 镜像完成: {} + {} 个站内页面",
            final_path.display(),
            linked_pages.len()
        );

        Ok(MirrorReport {
            final_page: final_path,
            linked_pages,
            skipped_links,
            stats,
        })
    }
}
