//! 站内链接提取与重写
//!
//! 两个方向使用同一个判定：去掉站点前缀后，非空、不等于 `/`、且不是外部链接的 href
//! 才算站内链接。提取时返回这些路径片段，重写时把它们换成本地文件名。

// 标准库导入
use std::path::{Path, PathBuf};

// 第三方crate导入
use tracing::{debug, info};
use url::Url;

// 本地模块导入
use crate::api_constants::mirror_config::EXTERNAL_MARKERS;
use crate::dom::Document;
use crate::error::Result;
use crate::persister::{load_document, remove_page, sanitized_filename, save_document};

/// 外部链接判定方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkFilter {
    /// 片段中含有 "https"/"http"/"mailto" 子串即视为外部链接。
    ///
    /// 已知缺陷：像 `/http-status` 这样恰好含有这些子串的站内路径会被误判为外部链接。
    #[default]
    Substring,
    /// 只有带协议的绝对URL（`http:`、`mailto:`、`tel:` 等）或 `//host` 形式才算外部链接
    Scheme,
}

impl LinkFilter {
    /// 判断去掉站点前缀后的片段是否指向外部
    pub fn is_external(self, fragment: &str) -> bool {
        match self {
            LinkFilter::Substring => EXTERNAL_MARKERS
                .iter()
                .any(|marker| fragment.contains(marker)),
            LinkFilter::Scheme => fragment.starts_with("//") || Url::parse(fragment).is_ok(),
        }
    }
}

/// 去掉 href 开头的站点URL
pub fn strip_base<'a>(href: &'a str, base_url: &str) -> &'a str {
    if base_url.is_empty() {
        return href;
    }
    href.strip_prefix(base_url).unwrap_or(href)
}

/// 去掉站点前缀后的片段是否为可镜像的站内链接
pub fn is_same_site(fragment: &str, filter: LinkFilter) -> bool {
    !fragment.is_empty() && fragment != "/" && !filter.is_external(fragment)
}

/// 按文档顺序提取所有站内链接的路径片段
///
/// 没有 href 的锚点被跳过；重复链接保留。
pub fn extract_links(doc: &Document, base_url: &str, filter: LinkFilter) -> Vec<String> {
    doc.elements_by_name("a")
        .into_iter()
        .filter_map(|id| doc.attr(id, "href"))
        .map(|href| strip_base(href, base_url))
        .filter(|fragment| is_same_site(fragment, filter))
        .map(str::to_string)
        .collect()
}

/// 将站内链接的 href 改写为本地文件名，外部链接保持原样；返回改写的锚点数
///
/// `unmapped` 中的片段没有属于自己的本地文件（例如因文件名冲突被跳过），其 href 保持原样。
pub fn rewrite_anchors(
    doc: &mut Document,
    base_url: &str,
    filter: LinkFilter,
    unmapped: &[String],
) -> usize {
    let mut rewritten = 0;

    for id in doc.elements_by_name("a") {
        let local = match doc.attr(id, "href") {
            Some(href) => {
                let fragment = strip_base(href, base_url);
                if !is_same_site(fragment, filter) {
                    continue;
                }
                if unmapped.iter().any(|skipped| skipped == fragment) {
                    debug!("保留未镜像链接: {}", href);
                    continue;
                }
                sanitized_filename(fragment)
            }
            None => continue,
        };

        debug!("🔗 重写链接 -> {}", local);
        doc.set_attr(id, "href", &local);
        rewritten += 1;
    }

    rewritten
}

/// 读回已保存的页面，重写其链接后以 `dst_stem` 保存，并删除 `src_stem` 源文件
///
/// 源与目标同名时直接覆盖，不删除。
pub fn rewrite_saved_page(
    dir: &Path,
    src_stem: &str,
    dst_stem: &str,
    base_url: &str,
    filter: LinkFilter,
    unmapped: &[String],
) -> Result<PathBuf> {
    let mut doc = load_document(dir, src_stem)?;
    let rewritten = rewrite_anchors(&mut doc, base_url, filter, unmapped);
    let path = save_document(&doc, dir, dst_stem)?;

    if sanitized_filename(src_stem) != sanitized_filename(dst_stem) {
        remove_page(dir, src_stem)?;
    }

    info!("🔗 已重写 {} 个站内链接: {}", rewritten, path.display());
    Ok(path)
}
