//! 翻译账本
//!
//! 记录每一次实际发生的DOM修改及其原始值，用于还原。

use std::collections::HashMap;

use markup5ever_rcdom::Handle;

use crate::dom::NodeKey;

/// 被修改的属性类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LedgerKind {
    /// 文本节点内容
    TextContent,
    /// `placeholder` 属性
    Placeholder,
    /// `title` 属性
    Title,
    /// `aria-label` 属性
    AriaLabel,
}

impl LedgerKind {
    /// 需要翻译的属性，按处理顺序排列
    pub const ATTRIBUTES: [LedgerKind; 3] = [
        LedgerKind::Placeholder,
        LedgerKind::Title,
        LedgerKind::AriaLabel,
    ];

    /// 对应的HTML属性名，文本内容返回 `None`
    pub fn attribute_name(self) -> Option<&'static str> {
        match self {
            LedgerKind::TextContent => None,
            LedgerKind::Placeholder => Some("placeholder"),
            LedgerKind::Title => Some("title"),
            LedgerKind::AriaLabel => Some("aria-label"),
        }
    }
}

/// 账本条目
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub node: Handle,
    pub kind: LedgerKind,
    pub original_value: String,
}

/// 翻译账本
///
/// 同一节点的同一类型最多一个条目；原始值先写先得，直到条目被还原移除。
#[derive(Debug, Default)]
pub struct TranslationLedger {
    entries: Vec<LedgerEntry>,
    index: HashMap<(NodeKey, LedgerKind), usize>,
}

impl TranslationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录原始值，已存在时保留旧值并返回 `false`
    pub fn record(&mut self, node: &Handle, kind: LedgerKind, original_value: &str) -> bool {
        let key = (NodeKey::of(node), kind);
        if self.index.contains_key(&key) {
            return false;
        }

        self.index.insert(key, self.entries.len());
        self.entries.push(LedgerEntry {
            node: node.clone(),
            kind,
            original_value: original_value.to_string(),
        });
        true
    }

    pub fn contains(&self, node: &Handle, kind: LedgerKind) -> bool {
        self.index.contains_key(&(NodeKey::of(node), kind))
    }

    pub fn original_value(&self, node: &Handle, kind: LedgerKind) -> Option<&str> {
        self.index
            .get(&(NodeKey::of(node), kind))
            .map(|&i| self.entries[i].original_value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }

    /// 只保留满足条件的条目，返回移除的条目数
    pub fn retain(&mut self, mut keep: impl FnMut(&LedgerEntry) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| keep(entry));

        self.index.clear();
        for (i, entry) in self.entries.iter().enumerate() {
            self.index.insert((NodeKey::of(&entry.node), entry.kind), i);
        }
        before - self.entries.len()
    }

    /// 取出全部条目并清空账本
    pub fn drain(&mut self) -> Vec<LedgerEntry> {
        self.index.clear();
        std::mem::take(&mut self.entries)
    }
}
