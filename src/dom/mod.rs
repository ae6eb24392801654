//! 内存DOM模块
//!
//! - `node`: 基础节点操作
//! - `document`: 可观察的活动文档与序列化
//! - `mutation`: 变更记录与观察者

pub mod document;
pub mod mutation;
pub mod node;

pub use document::Document;
pub use mutation::{MutationObserver, MutationRecord, ObserverId};
pub use node::{
    ancestor_elements, get_child_node_by_name, get_node_attr, get_node_name, get_text,
    html_to_dom, is_element, is_inclusive_ancestor, is_text, nearest_element, parent_node,
    NodeKey,
};
