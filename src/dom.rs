//! 页面DOM模块
//!
//! 解析后的页面保存为索引竞技场（arena）：所有节点按 `NodeId` 存放在同一个 `Vec` 中，
//! 父子关系通过索引表示，不持有任何指针。
//!
//! 解析借助 html5ever + RcDom 完成，随后一次性转换为竞技场结构；序列化通过实现
//! html5ever 的 `Serialize` trait 复用其转义和原始文本（script/style）处理。
//! 转换、遍历、序列化全部使用显式栈，不做递归。

// 标准库导入
use std::io;

// 第三方crate导入
use html5ever::parse_document;
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

// 本地模块导入
use crate::error::Result;

/// HTML命名空间
const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// 节点在竞技场中的索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// 节点在竞技场中的位置
    pub fn index(self) -> usize {
        self.0
    }
}

/// 元素属性
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: QualName,
    pub value: String,
}

/// 节点内容
#[derive(Debug, Clone)]
pub enum NodeData {
    /// 文档根节点
    Document,
    Doctype { name: String },
    Text { contents: String },
    Comment { contents: String },
    Element { name: QualName, attrs: Vec<Attr> },
    ProcessingInstruction { target: String, contents: String },
}

/// 竞技场中的单个节点
#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

/// 竞技场形式的HTML文档
///
/// 下标 0 永远是文档根节点。
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// 创建只含根节点的空文档
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
        }
    }

    /// 解析HTML字符串
    pub fn parse_html(html: &str) -> Result<Self> {
        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| crate::mirror_error!(html_parse, format!("{:?}", e)))?;

        Ok(Self::from_rcdom(&dom))
    }

    /// 将RcDom树转换为竞技场
    fn from_rcdom(dom: &RcDom) -> Self {
        let mut doc = Self::new();
        let mut stack: Vec<(Handle, NodeId)> = Vec::new();
        let root = doc.root();

        for child in dom.document.children.borrow().iter().rev() {
            stack.push((child.clone(), root));
        }

        while let Some((handle, parent)) = stack.pop() {
            let mut template_contents = None;
            let data = match handle.data {
                // 嵌套文档节点只出现在template内容里，直接展开其子节点
                RcNodeData::Document => {
                    for child in handle.children.borrow().iter().rev() {
                        stack.push((child.clone(), parent));
                    }
                    continue;
                }
                RcNodeData::Doctype { ref name, .. } => NodeData::Doctype {
                    name: name.to_string(),
                },
                RcNodeData::Text { ref contents } => NodeData::Text {
                    contents: contents.borrow().to_string(),
                },
                RcNodeData::Comment { ref contents } => NodeData::Comment {
                    contents: contents.to_string(),
                },
                RcNodeData::Element {
                    ref name,
                    ref attrs,
                    template_contents: ref template,
                    ..
                } => {
                    template_contents = template.borrow().clone();
                    NodeData::Element {
                        name: name.clone(),
                        attrs: attrs
                            .borrow()
                            .iter()
                            .map(|attr| Attr {
                                name: attr.name.clone(),
                                value: attr.value.to_string(),
                            })
                            .collect(),
                    }
                }
                RcNodeData::ProcessingInstruction {
                    ref target,
                    ref contents,
                } => NodeData::ProcessingInstruction {
                    target: target.to_string(),
                    contents: contents.to_string(),
                },
            };

            let id = doc.append(parent, data);
            let source = template_contents.unwrap_or_else(|| handle.clone());
            for child in source.children.borrow().iter().rev() {
                stack.push((child.clone(), id));
            }
        }

        doc
    }

    /// 序列化为HTML字符串
    pub fn to_html(&self) -> Result<String> {
        let mut buffer = Vec::new();

        serialize(&mut buffer, self, SerializeOpts::default())
            .map_err(|e| crate::mirror_error!(html_parse, format!("HTML序列化失败: {}", e)))?;

        String::from_utf8(buffer)
            .map_err(|e| crate::mirror_error!(html_parse, format!("UTF-8转换失败: {}", e)))
    }

    /// 文档根节点
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// 节点总数（含根节点）
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// 在 `parent` 的子节点末尾追加新节点
    pub fn append(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            data,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// 创建HTML元素并追加到 `parent`
    pub fn append_element(
        &mut self,
        parent: NodeId,
        local: &str,
        attrs: &[(&str, &str)],
    ) -> NodeId {
        let name = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local));
        let attrs = attrs
            .iter()
            .map(|(attr_name, value)| Attr {
                name: attribute_name(attr_name),
                value: value.to_string(),
            })
            .collect();

        self.append(parent, NodeData::Element { name, attrs })
    }

    /// 元素的本地标签名；非元素返回 None
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        }
    }

    /// 读取元素属性
    pub fn attr(&self, id: NodeId, attr_name: &str) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|attr| &*attr.name.local == attr_name)
                .map(|attr| attr.value.as_str()),
            _ => None,
        }
    }

    /// 设置元素属性，不存在时追加；对非元素节点无效果
    pub fn set_attr(&mut self, id: NodeId, attr_name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.nodes[id.0].data {
            match attrs.iter_mut().find(|attr| &*attr.name.local == attr_name) {
                Some(attr) => attr.value = value.to_string(),
                None => attrs.push(Attr {
                    name: attribute_name(attr_name),
                    value: value.to_string(),
                }),
            }
        }
    }

    /// 文本节点内容
    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text { contents } => Some(contents.as_str()),
            _ => None,
        }
    }

    /// 替换文本节点内容；对非文本节点无效果
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let NodeData::Text { contents } = &mut self.nodes[id.0].data {
            contents.clear();
            contents.push_str(text);
        }
    }

    /// 以文档顺序（先序）遍历 `id` 的所有后代，不含 `id` 本身
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let stack = self.nodes[id.0].children.iter().rev().copied().collect();
        Descendants { doc: self, stack }
    }

    /// 按文档顺序返回所有指定标签名的元素
    pub fn elements_by_name(&self, local: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .filter(|&id| self.element_name(id) == Some(local))
            .collect()
    }

    /// 第一个指定标签名的元素
    pub fn find_first(&self, local: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .find(|&id| self.element_name(id) == Some(local))
    }

    /// 沿父链向上查找，判断节点是否位于任一指定标签内
    pub fn is_inside(&self, id: NodeId, names: &[&str]) -> bool {
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            if let Some(name) = self.element_name(parent) {
                if names.contains(&name) {
                    return true;
                }
            }
            current = self.nodes[parent.0].parent;
        }
        false
    }
}

/// 属性名（无命名空间）
fn attribute_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(local))
}

/// 先序遍历迭代器
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.nodes[id.0].children.iter().rev().copied());
        Some(id)
    }
}

enum SerializeOp {
    Open(NodeId),
    Close(QualName),
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let root = self.root();
        let mut ops = match traversal_scope {
            TraversalScope::IncludeNode => vec![SerializeOp::Open(root)],
            TraversalScope::ChildrenOnly(_) => self.nodes[root.0]
                .children
                .iter()
                .rev()
                .map(|&child| SerializeOp::Open(child))
                .collect(),
        };

        while let Some(op) = ops.pop() {
            match op {
                SerializeOp::Open(id) => {
                    let node = &self.nodes[id.0];
                    match &node.data {
                        NodeData::Element { name, attrs } => {
                            serializer.start_elem(
                                name.clone(),
                                attrs.iter().map(|attr| (&attr.name, attr.value.as_str())),
                            )?;
                            ops.push(SerializeOp::Close(name.clone()));
                            ops.extend(node.children.iter().rev().map(|&c| SerializeOp::Open(c)));
                        }
                        NodeData::Document => {
                            ops.extend(node.children.iter().rev().map(|&c| SerializeOp::Open(c)));
                        }
                        NodeData::Doctype { name } => serializer.write_doctype(name)?,
                        NodeData::Text { contents } => serializer.write_text(contents)?,
                        NodeData::Comment { contents } => serializer.write_comment(contents)?,
                        NodeData::ProcessingInstruction { target, contents } => {
                            serializer.write_processing_instruction(target, contents)?
                        }
                    }
                }
                SerializeOp::Close(name) => serializer.end_elem(name)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html><html><head><title>Hi</title></head><body><p id="a">One <b>two</b></p><a href="/x">x</a><!-- note --></body></html>"#;

    #[test]
    fn test_parse_and_serialize_round_trip_keeps_structure() {
        let doc = Document::parse_html(PAGE).unwrap();
        let html = doc.to_html().unwrap();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<p id="a">One <b>two</b></p>"#));
        assert!(html.contains(r#"<a href="/x">x</a>"#));
        assert!(html.contains("<!-- note -->"));
    }

    #[test]
    fn test_descendants_follow_document_order() {
        let doc = Document::parse_html(PAGE).unwrap();
        let names: Vec<&str> = doc
            .descendants(doc.root())
            .filter_map(|id| doc.element_name(id))
            .collect();

        assert_eq!(names, vec!["html", "head", "title", "body", "p", "b", "a"]);
    }

    #[test]
    fn test_parent_links_point_back() {
        let doc = Document::parse_html(PAGE).unwrap();
        let b = doc.find_first("b").unwrap();
        let p = doc.node(b).parent.unwrap();

        assert_eq!(doc.element_name(p), Some("p"));
        assert!(doc.node(p).children.contains(&b));
        assert!(doc.is_inside(b, &["body"]));
        assert!(!doc.is_inside(b, &["head"]));
    }

    #[test]
    fn test_attr_set_and_append_element() {
        let mut doc = Document::parse_html(PAGE).unwrap();
        let a = doc.find_first("a").unwrap();
        doc.set_attr(a, "href", "_x.html");
        doc.set_attr(a, "title", "X");

        let head = doc.find_first("head").unwrap();
        doc.append_element(head, "script", &[("src", "/app.js")]);

        let html = doc.to_html().unwrap();
        assert!(html.contains(r#"<a href="_x.html" title="X">x</a>"#));
        assert!(html.contains(r#"<script src="/app.js"></script></head>"#));
    }

    #[test]
    fn test_script_text_is_not_escaped() {
        let doc = Document::parse_html("<script>if (a < b && c) {}</script>").unwrap();
        let html = doc.to_html().unwrap();

        assert!(html.contains("if (a < b && c) {}"));
    }

    #[test]
    fn test_deeply_nested_page_does_not_overflow() {
        let depth = 2000;
        let html = format!("{}deep{}", "<div>".repeat(depth), "</div>".repeat(depth));
        let doc = Document::parse_html(&html).unwrap();

        assert!(doc.len() > depth);
        assert!(doc.to_html().unwrap().contains("deep"));
    }
}
