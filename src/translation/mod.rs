//! 翻译引擎模块
//!
//! - **store**: 词典与当前语言状态
//! - **ledger**: 记录修改与原始值的账本
//! - **walker**: 带跳过规则的深度优先遍历
//! - **synchronizer**: 把词典应用到文档并负责还原
//! - **watcher**: 对新插入子树做增量翻译
//! - **controller**: 串行化各次处理的生命周期控制器
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use autotranslate::dom::Document;
//! use autotranslate::translation::{AutoTranslator, DictionaryCatalog, LanguageRequest};
//! use autotranslate::TranslatorConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let document = Rc::new(Document::parse("<button>Add Barber</button>")?);
//! let catalog = DictionaryCatalog::from_json_str(r#"{"ar": {"Add Barber": "إضافة حلاق"}}"#)?;
//! let translator = AutoTranslator::new(TranslatorConfig::default(), document);
//!
//! translator
//!     .on_language_change(LanguageRequest::new("ar", catalog.dictionary("ar")))
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod controller;
pub mod ledger;
pub mod store;
pub mod synchronizer;
pub mod walker;
pub mod watcher;

pub use controller::{AutoTranslator, PassOutcome};
pub use ledger::{LedgerEntry, LedgerKind, TranslationLedger};
pub use store::{DictionaryCatalog, LanguageRequest, TranslationDictionary, TranslationStore};
pub use synchronizer::{DomSynchronizer, PassReport};
pub use walker::{SkipPredicate, TagSkipList};
pub use watcher::MutationWatcher;
