//! # Autotranslate Library
//!
//! 为收银台与后台管理界面提供可逆的词典驱动自动翻译：遍历活动文档，
//! 在源语言与目标语言之间替换文本和属性，记录原始值以便还原，
//! 并对之后插入的内容做增量翻译。
//!
//! ## 模块组织
//!
//! - `dom` - 可观察的内存文档
//! - `translation` - 翻译引擎与生命周期控制器
//! - `config` - 配置加载
//! - `error` - 错误类型
//! - `logging` - 日志初始化

pub mod config;
pub mod dom;
pub mod error;
pub mod logging;
pub mod translation;

// Re-export commonly used items for convenience
pub use crate::config::{ConfigLoader, RestorePolicy, TranslatorConfig};
pub use error::{DomError, TranslatorError, TranslatorResult};
pub use translation::{AutoTranslator, LanguageRequest, PassOutcome, TranslationDictionary};
