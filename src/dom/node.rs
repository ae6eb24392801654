//! 基础DOM节点操作

use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::error::{TranslatorError, TranslatorResult};

/// 节点标识
///
/// 以 `Rc` 指针地址区分节点；只要仍有句柄持有该节点，标识就保持稳定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(usize);

impl NodeKey {
    pub fn of(node: &Handle) -> Self {
        NodeKey(Rc::as_ptr(node) as usize)
    }
}

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> TranslatorResult<RcDom> {
    let s = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => {
            let (string, _, _) = encoding.decode(data);
            string.into_owned()
        }
        None => String::from_utf8_lossy(data).into_owned(),
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
        .map_err(|e| TranslatorError::ParseError(format!("HTML解析失败: {}", e)))
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    let matching_children = children.iter().find(|child| match child.data {
        NodeData::Element { ref name, .. } => &*name.local == node_name,
        _ => false,
    });
    matching_children.cloned()
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取文本节点内容
pub fn get_text(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

pub fn is_text(node: &Handle) -> bool {
    matches!(node.data, NodeData::Text { .. })
}

/// 获取父节点
///
/// `parent` 是 `Cell`，读取时取出后必须放回。
pub fn parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 获取最近的祖先元素（不含自身）
pub fn nearest_element(node: &Handle) -> Option<Handle> {
    let mut current = parent_node(node);
    while let Some(candidate) = current {
        if is_element(&candidate) {
            return Some(candidate);
        }
        current = parent_node(&candidate);
    }
    None
}

/// 获取所有祖先元素，由近及远（不含自身）
pub fn ancestor_elements(node: &Handle) -> Vec<Handle> {
    let mut ancestors = Vec::new();
    let mut current = parent_node(node);
    while let Some(candidate) = current {
        current = parent_node(&candidate);
        if is_element(&candidate) {
            ancestors.push(candidate);
        }
    }
    ancestors
}

/// 判断 `ancestor` 是否为 `node` 本身或其祖先
pub fn is_inclusive_ancestor(ancestor: &Handle, node: &Handle) -> bool {
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if Rc::ptr_eq(&candidate, ancestor) {
            return true;
        }
        current = parent_node(&candidate);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(dom: &RcDom) -> Handle {
        let html = get_child_node_by_name(&dom.document, "html").unwrap();
        get_child_node_by_name(&html, "body").unwrap()
    }

    #[test]
    fn test_parent_node_is_repeatable() {
        let dom = html_to_dom(b"<p>Hello</p>", "utf-8").unwrap();
        let p = body_of(&dom).children.borrow()[0].clone();
        let text = p.children.borrow()[0].clone();

        let first = parent_node(&text).unwrap();
        let second = parent_node(&text).unwrap();
        assert!(Rc::ptr_eq(&first, &p));
        assert!(Rc::ptr_eq(&second, &p));
    }

    #[test]
    fn test_nearest_element_and_ancestors() {
        let dom = html_to_dom(b"<div><span>Save</span></div>", "utf-8").unwrap();
        let div = body_of(&dom).children.borrow()[0].clone();
        let span = div.children.borrow()[0].clone();
        let text = span.children.borrow()[0].clone();

        assert_eq!(get_node_name(&nearest_element(&text).unwrap()), Some("span"));
        let names: Vec<String> = ancestor_elements(&text)
            .iter()
            .filter_map(|node| get_node_name(node).map(str::to_string))
            .collect();
        assert_eq!(names, vec!["span", "div", "body", "html"]);
        assert!(is_inclusive_ancestor(&div, &text));
        assert!(is_inclusive_ancestor(&text, &text));
        assert!(!is_inclusive_ancestor(&text, &div));
    }

    #[test]
    fn test_get_node_attr_and_text() {
        let dom = html_to_dom(b"<input placeholder=\"Search\">", "utf-8").unwrap();
        let input = body_of(&dom).children.borrow()[0].clone();
        assert_eq!(get_node_attr(&input, "placeholder").as_deref(), Some("Search"));
        assert_eq!(get_node_attr(&input, "title"), None);
        assert!(get_text(&input).is_none());
    }

    #[test]
    fn test_node_key_identity() {
        let dom = html_to_dom(b"<p>A</p><p>A</p>", "utf-8").unwrap();
        let body = body_of(&dom);
        let children = body.children.borrow();
        assert_eq!(NodeKey::of(&children[0]), NodeKey::of(&children[0].clone()));
        assert_ne!(NodeKey::of(&children[0]), NodeKey::of(&children[1]));
    }
}
