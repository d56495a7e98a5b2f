//! 页面持久化模块
//!
//! 路径片段到本地文件名的映射只在这里定义：保存页面和重写链接必须使用同一个映射，
//! 否则镜像内的链接会断开。

// 标准库导入
use std::fs;
use std::path::{Path, PathBuf};

// 第三方crate导入
use tracing::debug;

// 本地模块导入
use crate::api_constants::mirror_config::HTML_EXTENSION;
use crate::dom::Document;
use crate::error::Result;

/// 将路径片段中的每个 `/` 替换为 `_`
///
/// 对已经处理过的名字再次调用不会产生变化。
pub fn sanitize_stem(fragment: &str) -> String {
    fragment.replace('/', "_")
}

/// 路径片段对应的本地文件名：`sanitize_stem(fragment) + ".html"`
///
/// ```rust
/// use mirror_translate::persister::sanitized_filename;
///
/// assert_eq!(sanitized_filename("/about/team"), "_about_team.html");
/// ```
pub fn sanitized_filename(fragment: &str) -> String {
    format!("{}{}", sanitize_stem(fragment), HTML_EXTENSION)
}

/// 页面在输出目录中的完整路径
pub fn page_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(sanitized_filename(stem))
}

/// 将文档序列化并写入 `dir/<sanitized>.html`，返回写入的路径
pub fn save_document(doc: &Document, dir: &Path, stem: &str) -> Result<PathBuf> {
    let html = doc.to_html()?;
    save_html(&html, dir, stem)
}

/// 写入已序列化的HTML
pub fn save_html(html: &str, dir: &Path, stem: &str) -> Result<PathBuf> {
    let path = page_path(dir, stem);

    fs::write(&path, html)
        .map_err(|e| crate::mirror_error!(file_op, path.display(), "写入", e))?;

    debug!("💾 已保存: {} ({} 字节)", path.display(), html.len());
    Ok(path)
}

/// 从磁盘读回已保存的页面
pub fn load_document(dir: &Path, stem: &str) -> Result<Document> {
    let path = page_path(dir, stem);

    let html = fs::read_to_string(&path)
        .map_err(|e| crate::mirror_error!(file_op, path.display(), "读取", e))?;

    Document::parse_html(&html)
}

/// 删除已保存的页面
pub fn remove_page(dir: &Path, stem: &str) -> Result<()> {
    let path = page_path(dir, stem);

    fs::remove_file(&path)
        .map_err(|e| crate::mirror_error!(file_op, path.display(), "删除", e))?;

    debug!("🗑️ 已删除: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitized_filename_replaces_every_slash() {
        assert_eq!(sanitized_filename("/about"), "_about.html");
        assert_eq!(sanitized_filename("/blog/2024/post"), "_blog_2024_post.html");
        assert_eq!(sanitized_filename("plain"), "plain.html");
    }

    #[test]
    fn test_sanitize_stem_is_idempotent() {
        for fragment in ["/about", "/a/b/c", "no-slash", "//double", "_already_done"] {
            let once = sanitize_stem(fragment);
            assert_eq!(sanitize_stem(&once), once);
            assert_eq!(sanitized_filename(fragment), format!("{}.html", once));
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let doc = Document::parse_html(r#"<p><a href="/x">x</a></p>"#).unwrap();

        let path = save_document(&doc, dir.path(), "/docs/intro").unwrap();
        assert_eq!(path, dir.path().join("_docs_intro.html"));
        assert!(path.exists());

        let loaded = load_document(dir.path(), "/docs/intro").unwrap();
        let a = loaded.find_first("a").unwrap();
        assert_eq!(loaded.attr(a, "href"), Some("/x"));

        remove_page(dir.path(), "/docs/intro").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_load_missing_page_reports_path() {
        let dir = TempDir::new().unwrap();
        let err = load_document(dir.path(), "missing").unwrap_err();

        assert!(err.to_string().contains("missing.html"));
    }
}
