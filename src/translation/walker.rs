//! DOM遍历器
//!
//! 显式栈的深度优先遍历，按文档顺序收集可翻译的文本节点与带指定属性的元素。
//! 跳过规则通过 `SkipPredicate` 注入。

use std::collections::HashSet;

use markup5ever_rcdom::{Handle, NodeData};

use crate::dom::{ancestor_elements, get_node_attr, get_node_name};

/// 跳过规则
pub trait SkipPredicate {
    /// 是否跳过该元素内的全部文本
    fn skip_element(&self, tag: &str) -> bool;

    /// 是否跳过该文本
    fn skip_text(&self, text: &str) -> bool {
        text.trim().is_empty()
    }
}

impl<F> SkipPredicate for F
where
    F: Fn(&str) -> bool,
{
    fn skip_element(&self, tag: &str) -> bool {
        self(tag)
    }
}

/// 按标签名跳过
#[derive(Debug, Clone, Default)]
pub struct TagSkipList {
    tags: HashSet<String>,
}

impl TagSkipList {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tags: tags
                .into_iter()
                .map(|tag| tag.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }
}

impl SkipPredicate for TagSkipList {
    fn skip_element(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// 判断节点是否位于被跳过的元素之内（包括自身）
pub fn is_within_skipped(node: &Handle, predicate: &dyn SkipPredicate) -> bool {
    if let Some(name) = get_node_name(node) {
        if predicate.skip_element(name) {
            return true;
        }
    }

    ancestor_elements(node)
        .iter()
        .filter_map(get_node_name)
        .any(|name| predicate.skip_element(name))
}

/// 收集 `root` 子树中需要处理的文本节点
pub fn collect_text_nodes(root: &Handle, predicate: &dyn SkipPredicate) -> Vec<Handle> {
    let mut found = Vec::new();
    if is_within_skipped(root, predicate) {
        return found;
    }

    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        match &node.data {
            NodeData::Text { contents } => {
                if !predicate.skip_text(&contents.borrow()) {
                    found.push(node.clone());
                }
            }
            NodeData::Element { name, .. } => {
                if predicate.skip_element(&name.local) {
                    continue;
                }
                push_children(&mut stack, &node);
            }
            NodeData::Document => push_children(&mut stack, &node),
            _ => {}
        }
    }

    found
}

/// 收集 `root` 子树中（含自身）带有 `attr_name` 属性的元素
pub fn collect_elements_with_attr(root: &Handle, attr_name: &str) -> Vec<Handle> {
    let mut found = Vec::new();

    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        match &node.data {
            NodeData::Element { .. } => {
                if get_node_attr(&node, attr_name).is_some() {
                    found.push(node.clone());
                }
                push_children(&mut stack, &node);
            }
            NodeData::Document => push_children(&mut stack, &node),
            _ => {}
        }
    }

    found
}

fn push_children(stack: &mut Vec<Handle>, node: &Handle) {
    stack.extend(node.children.borrow().iter().rev().cloned());
}
