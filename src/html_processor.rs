//! HTML处理模块
//!
//! 提供可翻译文本的收集、翻译结果回写以及外部脚本重新挂载功能

// 标准库导入
use std::collections::{HashMap, HashSet};

// 第三方crate导入
use tracing::debug;

// 本地模块导入
use crate::dom::{Document, NodeData, NodeId};

/// 文本永远不送去翻译的元素
pub const UNTRANSLATED_ELEMENTS: &[&str] = &["script", "style"];

/// 一个待翻译的文本节点
///
/// `core` 为去掉首尾空白后的文本，回写时保留原有的首尾空白。
#[derive(Debug, Clone, PartialEq)]
pub struct TextSlot {
    pub node: NodeId,
    pub leading: String,
    pub core: String,
    pub trailing: String,
}

/// 判断文本是否值得翻译：至少包含一个字母（含CJK等非ASCII文字）
pub fn has_translatable_content(text: &str) -> bool {
    text.chars().any(char::is_alphabetic)
}

/// 按文档顺序收集所有可翻译文本节点，跳过 script/style 子树
pub fn extract_translatable_texts(doc: &Document) -> Vec<TextSlot> {
    let mut slots = Vec::new();
    let mut stack: Vec<NodeId> = doc.node(doc.root()).children.iter().rev().copied().collect();

    while let Some(id) = stack.pop() {
        let node = doc.node(id);
        match &node.data {
            NodeData::Element { name, .. } => {
                if UNTRANSLATED_ELEMENTS.iter().any(|tag| *tag == &*name.local) {
                    continue;
                }
            }
            NodeData::Text { contents } => {
                if let Some(slot) = split_text(id, contents) {
                    slots.push(slot);
                }
            }
            _ => {}
        }
        stack.extend(node.children.iter().rev().copied());
    }

    slots
}

fn split_text(node: NodeId, contents: &str) -> Option<TextSlot> {
    let core = contents.trim();
    if core.is_empty() || !has_translatable_content(core) {
        return None;
    }

    let start = contents.len() - contents.trim_start().len();
    let end = start + core.len();

    Some(TextSlot {
        node,
        leading: contents[..start].to_string(),
        core: core.to_string(),
        trailing: contents[end..].to_string(),
    })
}

/// 去重后的待翻译文本，保持首次出现的顺序
pub fn unique_texts(slots: &[TextSlot]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut texts = Vec::new();
    for slot in slots {
        if seen.insert(slot.core.as_str()) {
            texts.push(slot.core.clone());
        }
    }
    texts
}

/// 将翻译结果应用到DOM
///
/// `originals[i]` 的译文为 `translations[i]`；空译文不回写。返回回写的节点数。
pub fn apply_translations_to_dom(
    doc: &mut Document,
    slots: &[TextSlot],
    originals: &[String],
    translations: &[String],
) -> usize {
    let translation_map: HashMap<&str, &str> = originals
        .iter()
        .zip(translations.iter())
        .filter(|(_, trans)| !trans.trim().is_empty())
        .map(|(orig, trans)| (orig.as_str(), trans.as_str()))
        .collect();

    let mut applied_count = 0;
    for slot in slots {
        match translation_map.get(slot.core.as_str()) {
            Some(translation) => {
                let replaced = format!("{}{}{}", slot.leading, translation.trim(), slot.trailing);
                doc.set_text(slot.node, &replaced);
                applied_count += 1;
            }
            None => debug!("未找到翻译: '{}'", slot.core),
        }
    }

    applied_count
}

/// 收集页面中所有外部脚本的 src，按文档顺序
pub fn extract_script_sources(doc: &Document) -> Vec<String> {
    doc.elements_by_name("script")
        .into_iter()
        .filter_map(|id| doc.attr(id, "src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .collect()
}

/// 将外部脚本重新挂载到 `<head>` 末尾
///
/// 已经位于 `<head>` 内的 src 不会重复添加。返回新增的 script 元素个数。
pub fn reattach_script_sources(doc: &mut Document, sources: &[String]) -> usize {
    let head = match doc.find_first("head") {
        Some(head) => head,
        None => return 0,
    };

    let mut present: Vec<String> = doc
        .descendants(head)
        .filter(|&id| doc.element_name(id) == Some("script"))
        .filter_map(|id| doc.attr(id, "src").map(str::to_string))
        .collect();

    let mut added = 0;
    for src in sources {
        if present.iter().any(|existing| existing == src) {
            continue;
        }
        doc.append_element(head, "script", &[("src", src.as_str())]);
        present.push(src.clone());
        added += 1;
    }

    added
}
