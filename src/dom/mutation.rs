//! 变更记录与观察者注册

use std::rc::Rc;

use markup5ever_rcdom::Handle;

/// 观察者注册标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u64);

/// DOM 变更记录
#[derive(Debug, Clone)]
pub enum MutationRecord {
    /// 子节点增删
    ChildList {
        target: Handle,
        added: Vec<Handle>,
        removed: Vec<Handle>,
    },
    /// 文本内容修改
    CharacterData { target: Handle, old_value: String },
    /// 属性修改
    Attributes {
        target: Handle,
        name: String,
        old_value: Option<String>,
    },
}

impl MutationRecord {
    /// 发生变更的节点
    pub fn target(&self) -> &Handle {
        match self {
            MutationRecord::ChildList { target, .. }
            | MutationRecord::CharacterData { target, .. }
            | MutationRecord::Attributes { target, .. } => target,
        }
    }

    /// 新增的子节点（非 ChildList 记录为空）
    pub fn added_nodes(&self) -> &[Handle] {
        match self {
            MutationRecord::ChildList { added, .. } => added,
            _ => &[],
        }
    }

    /// 被移除的子节点（非 ChildList 记录为空）
    pub fn removed_nodes(&self) -> &[Handle] {
        match self {
            MutationRecord::ChildList { removed, .. } => removed,
            _ => &[],
        }
    }
}

/// 变更观察者
///
/// 宿主每次投递时，以一个批次传入该观察者自上次投递以来排队的全部记录。
pub trait MutationObserver {
    fn on_mutations(&self, records: &[MutationRecord]);
}

pub(crate) struct Registration {
    pub(crate) id: ObserverId,
    pub(crate) target: Handle,
    pub(crate) observer: Rc<dyn MutationObserver>,
    pub(crate) queue: Vec<MutationRecord>,
}
