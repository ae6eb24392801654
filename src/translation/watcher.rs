//! 变更观察器
//!
//! 全文档翻译之后，把新插入的子树送回同步器做增量翻译。
//! 状态只有两种：未连接与观察中；重新观察前总是先断开旧的观察者。

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use markup5ever_rcdom::Handle;

use crate::dom::{
    is_element, is_text, parent_node, Document, MutationObserver, MutationRecord, NodeKey,
    ObserverId,
};

use super::store::TranslationDictionary;
use super::synchronizer::DomSynchronizer;

enum WatcherState {
    Disconnected,
    Watching {
        document: Weak<Document>,
        id: ObserverId,
    },
}

/// 变更观察器
pub struct MutationWatcher {
    synchronizer: Rc<RefCell<DomSynchronizer>>,
    state: WatcherState,
}

impl std::fmt::Debug for MutationWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationWatcher")
            .field("watching", &self.is_watching())
            .finish()
    }
}

impl MutationWatcher {
    pub fn new(synchronizer: Rc<RefCell<DomSynchronizer>>) -> Self {
        Self {
            synchronizer,
            state: WatcherState::Disconnected,
        }
    }

    pub fn is_watching(&self) -> bool {
        matches!(self.state, WatcherState::Watching { .. })
    }

    /// 开始观察 `root` 子树；已在观察时先断开
    pub fn observe(
        &mut self,
        document: &Rc<Document>,
        root: &Handle,
        dictionary: Arc<TranslationDictionary>,
    ) {
        self.disconnect();

        let sink = Rc::new(InsertionSink {
            document: Rc::downgrade(document),
            synchronizer: Rc::clone(&self.synchronizer),
            dictionary,
        });
        let id = document.observe(root, sink);

        tracing::debug!("变更观察器已连接: {:?}", id);
        self.state = WatcherState::Watching {
            document: Rc::downgrade(document),
            id,
        };
    }

    /// 断开观察，返回之前是否处于观察中
    pub fn disconnect(&mut self) -> bool {
        match std::mem::replace(&mut self.state, WatcherState::Disconnected) {
            WatcherState::Watching { document, id } => {
                if let Some(document) = document.upgrade() {
                    document.disconnect(id);
                }
                tracing::debug!("变更观察器已断开: {:?}", id);
                true
            }
            WatcherState::Disconnected => false,
        }
    }
}

impl Drop for MutationWatcher {
    fn drop(&mut self) {
        self.disconnect();
    }
}

struct InsertionSink {
    document: Weak<Document>,
    synchronizer: Rc<RefCell<DomSynchronizer>>,
    dictionary: Arc<TranslationDictionary>,
}

impl MutationObserver for InsertionSink {
    fn on_mutations(&self, records: &[MutationRecord]) {
        let Some(document) = self.document.upgrade() else {
            return;
        };

        let roots = coalesce_insertions(&document, records);
        let has_removals = records.iter().any(|record| !record.removed_nodes().is_empty());
        if roots.is_empty() && !has_removals {
            return;
        }

        match self.synchronizer.try_borrow_mut() {
            Ok(mut synchronizer) => {
                // 移动的节点在投递时已重新连接，不会被清理
                if has_removals {
                    synchronizer.prune_detached(&document);
                }
                if roots.is_empty() {
                    return;
                }
                let report = synchronizer.translate_subtrees(&document, &roots, &self.dictionary);
                tracing::debug!(
                    "增量翻译 {} 个子树: 翻译 {}, 跳过 {}, 失败 {}",
                    roots.len(),
                    report.translated,
                    report.skipped,
                    report.failed
                );
            }
            Err(_) => {
                tracing::warn!("同步器正忙，忽略 {} 个新增子树", roots.len());
            }
        }
    }
}

/// 把一批变更记录合并为互不包含的新增子树根
///
/// 只保留仍在文档中的元素与文本节点；某节点的祖先也在新增集合中时只保留祖先。
pub fn coalesce_insertions(document: &Document, records: &[MutationRecord]) -> Vec<Handle> {
    let mut keys = HashSet::new();
    let mut candidates = Vec::new();

    for record in records {
        for node in record.added_nodes() {
            if (is_element(node) || is_text(node)) && keys.insert(NodeKey::of(node)) {
                candidates.push(node.clone());
            }
        }
    }

    candidates
        .into_iter()
        .filter(|node| document.contains(node))
        .filter(|node| {
            let mut current = parent_node(node);
            while let Some(ancestor) = current {
                if keys.contains(&NodeKey::of(&ancestor)) {
                    return false;
                }
                current = parent_node(&ancestor);
            }
            true
        })
        .collect()
}
