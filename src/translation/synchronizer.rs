//! DOM同步器
//!
//! 把词典应用到文档的文本节点与 `placeholder`/`title`/`aria-label` 属性上，
//! 并在账本中记录原始值以便还原。单个节点失败只记录日志，不会中断整个处理过程。

use markup5ever_rcdom::Handle;

use crate::config::{RestorePolicy, TranslatorConfig};
use crate::dom::{get_node_attr, get_text, Document};

use super::ledger::{LedgerKind, TranslationLedger};
use super::store::TranslationDictionary;
use super::walker::{collect_elements_with_attr, collect_text_nodes, SkipPredicate, TagSkipList};

/// 单次处理的统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassReport {
    /// 被翻译的节点/属性数
    pub translated: usize,
    /// 被还原的条目数
    pub restored: usize,
    /// 因已在账本中而跳过的节点/属性数
    pub skipped: usize,
    /// 修改失败的节点/属性数
    pub failed: usize,
}

impl PassReport {
    pub fn merge(&mut self, other: PassReport) {
        self.translated += other.translated;
        self.restored += other.restored;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// DOM同步器
pub struct DomSynchronizer {
    ledger: TranslationLedger,
    skip: Box<dyn SkipPredicate>,
    source_language: String,
    active_language: String,
    restore_policy: RestorePolicy,
}

impl std::fmt::Debug for DomSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomSynchronizer")
            .field("ledger_entries", &self.ledger.len())
            .field("source_language", &self.source_language)
            .field("active_language", &self.active_language)
            .field("restore_policy", &self.restore_policy)
            .finish()
    }
}

impl DomSynchronizer {
    pub fn new(config: &TranslatorConfig) -> Self {
        Self {
            ledger: TranslationLedger::new(),
            skip: Box::new(TagSkipList::new(&config.skip_elements)),
            source_language: config.source_language.clone(),
            active_language: config.source_language.clone(),
            restore_policy: config.restore_policy,
        }
    }

    /// 替换跳过规则
    pub fn with_skip_predicate(mut self, predicate: impl SkipPredicate + 'static) -> Self {
        self.skip = Box::new(predicate);
        self
    }

    pub fn ledger(&self) -> &TranslationLedger {
        &self.ledger
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    /// 当前文档所处的语言
    pub fn active_language(&self) -> &str {
        &self.active_language
    }

    /// 全文档翻译
    ///
    /// 目标为源语言时只做还原；否则按还原策略决定是否先还原，再遍历 body。
    pub fn translate_full_document(
        &mut self,
        document: &Document,
        target_language: &str,
        dictionary: &TranslationDictionary,
    ) -> PassReport {
        if target_language == self.source_language {
            return self.restore_all(document);
        }

        let mut report = PassReport::default();

        let needs_restore = match self.restore_policy {
            RestorePolicy::Always => true,
            RestorePolicy::OnLanguageChange => {
                self.active_language != self.source_language
                    && self.active_language != target_language
            }
        };
        if needs_restore {
            report.merge(self.restore_all(document));
        }

        let root = document.body().unwrap_or_else(|| document.root());
        report.merge(self.translate_subtree(document, &root, dictionary));
        self.active_language = target_language.to_string();

        tracing::info!(
            "全文档翻译完成 ({}): 翻译 {}, 还原 {}, 跳过 {}, 失败 {}",
            target_language,
            report.translated,
            report.restored,
            report.skipped,
            report.failed
        );
        report
    }

    /// 翻译以 `root` 为根的子树，不做还原
    pub fn translate_subtree(
        &mut self,
        document: &Document,
        root: &Handle,
        dictionary: &TranslationDictionary,
    ) -> PassReport {
        let mut report = PassReport::default();

        for node in collect_text_nodes(root, self.skip.as_ref()) {
            self.translate_text_node(document, &node, dictionary, &mut report);
        }

        for kind in LedgerKind::ATTRIBUTES {
            let Some(attr_name) = kind.attribute_name() else {
                continue;
            };
            for element in collect_elements_with_attr(root, attr_name) {
                self.translate_attribute(document, &element, kind, attr_name, dictionary, &mut report);
            }
        }

        report
    }

    /// 在一次处理中翻译多个子树
    pub fn translate_subtrees(
        &mut self,
        document: &Document,
        roots: &[Handle],
        dictionary: &TranslationDictionary,
    ) -> PassReport {
        let mut report = PassReport::default();
        for root in roots {
            report.merge(self.translate_subtree(document, root, dictionary));
        }
        report
    }

    fn translate_text_node(
        &mut self,
        document: &Document,
        node: &Handle,
        dictionary: &TranslationDictionary,
        report: &mut PassReport,
    ) {
        if self.ledger.contains(node, LedgerKind::TextContent) {
            report.skipped += 1;
            return;
        }

        let Some(original) = get_text(node) else {
            return;
        };
        let trimmed = original.trim();
        let Some(translated) = dictionary.lookup(trimmed) else {
            return;
        };
        if translated == trimmed {
            return;
        }

        let replacement = keep_padding(&original, translated);

        match document.set_text(node, &replacement) {
            Ok(()) => {
                self.ledger.record(node, LedgerKind::TextContent, &original);
                report.translated += 1;
            }
            Err(e) => {
                tracing::warn!("翻译文本节点失败 ({:?}): {}", trimmed, e);
                report.failed += 1;
            }
        }
    }

    fn translate_attribute(
        &mut self,
        document: &Document,
        element: &Handle,
        kind: LedgerKind,
        attr_name: &str,
        dictionary: &TranslationDictionary,
        report: &mut PassReport,
    ) {
        if self.ledger.contains(element, kind) {
            report.skipped += 1;
            return;
        }

        let Some(original) = get_node_attr(element, attr_name) else {
            return;
        };
        let Some(translated) = dictionary.lookup(&original) else {
            return;
        };
        if translated == original.trim() {
            return;
        }

        let replacement = keep_padding(&original, translated);

        match document.replace_attr(element, attr_name, &replacement) {
            Ok(()) => {
                self.ledger.record(element, kind, &original);
                report.translated += 1;
            }
            Err(e) => {
                tracing::warn!("翻译属性 {} 失败 ({:?}): {}", attr_name, original, e);
                report.failed += 1;
            }
        }
    }

    /// 丢弃已不在文档中的节点的条目
    ///
    /// 被移除的节点无从还原，条目只会让节点一直留在内存中。
    pub fn prune_detached(&mut self, document: &Document) -> usize {
        let pruned = self.ledger.retain(|entry| document.contains(&entry.node));
        if pruned > 0 {
            tracing::debug!("移除 {} 个已脱离文档的账本条目", pruned);
        }
        pruned
    }

    /// 还原账本中的全部修改并清空账本
    pub fn restore_all(&mut self, document: &Document) -> PassReport {
        let mut report = PassReport::default();
        let entries = self.ledger.drain();

        for entry in entries.iter().rev() {
            let result = match entry.kind.attribute_name() {
                None => document.set_text(&entry.node, &entry.original_value),
                Some(attr_name) => document.replace_attr(&entry.node, attr_name, &entry.original_value),
            };

            match result {
                Ok(()) => report.restored += 1,
                Err(e) => {
                    tracing::warn!(
                        "还原 {:?} 失败 ({:?}): {}",
                        entry.kind,
                        entry.original_value,
                        e
                    );
                    report.failed += 1;
                }
            }
        }

        self.active_language = self.source_language.clone();

        if !entries.is_empty() {
            tracing::info!("还原完成: 还原 {}, 失败 {}", report.restored, report.failed);
        }
        report
    }
}

/// 译文沿用原文的首尾空白
fn keep_padding(original: &str, translated: &str) -> String {
    let leading = &original[..original.len() - original.trim_start().len()];
    let trailing = &original[original.trim_end().len()..];
    format!("{}{}{}", leading, translated, trailing)
}
