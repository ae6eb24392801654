//! 统一错误处理
//!
//! 提供结构化错误类型：`TranslatorError` 用于配置与词典加载，
//! `DomError` 用于单个节点的修改失败

use std::fmt;

use thiserror::Error;

/// 自动翻译器错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslatorError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 词典错误
    #[error("词典错误: {0}")]
    DictionaryError(String),

    /// IO错误
    #[error("IO错误: {0}")]
    IoError(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// DOM操作错误
    #[error("DOM错误: {0}")]
    Dom(#[from] DomError),
}

impl TranslatorError {
    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let new_msg = match &self {
            TranslatorError::Dom(_) => return self,
            TranslatorError::ConfigError(msg)
            | TranslatorError::DictionaryError(msg)
            | TranslatorError::IoError(msg)
            | TranslatorError::ParseError(msg) => format!("{} (上下文: {})", msg, context),
        };

        match &mut self {
            TranslatorError::ConfigError(ref mut msg) => *msg = new_msg,
            TranslatorError::DictionaryError(ref mut msg) => *msg = new_msg,
            TranslatorError::IoError(ref mut msg) => *msg = new_msg,
            TranslatorError::ParseError(ref mut msg) => *msg = new_msg,
            TranslatorError::Dom(_) => {}
        }

        self
    }
}

/// 单个节点的修改失败
///
/// 翻译与还原过程中遇到这些错误时只记录日志，不会中断整个处理过程。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    /// 节点已脱离文档
    #[error("节点已脱离文档")]
    Detached,

    /// 节点不是文本节点
    #[error("节点不是文本节点")]
    NotText,

    /// 节点不是元素
    #[error("节点不是元素")]
    NotElement,

    /// 属性在读取后已被移除
    #[error("属性不存在: {0}")]
    MissingAttribute(String),

    /// 节点不是给定父节点的子节点
    #[error("节点不是该父节点的子节点")]
    NotChild,

    /// 插入会使节点成为自身的后代
    #[error("无效的层级插入")]
    HierarchyRequest,
}

/// 标准错误转换
impl From<std::io::Error> for TranslatorError {
    fn from(error: std::io::Error) -> Self {
        TranslatorError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for TranslatorError {
    fn from(error: serde_json::Error) -> Self {
        TranslatorError::ParseError(format!("JSON解析错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslatorError {
    fn from(error: toml::de::Error) -> Self {
        TranslatorError::ParseError(format!("TOML解析错误: {}", error))
    }
}

impl From<config::ConfigError> for TranslatorError {
    fn from(error: config::ConfigError) -> Self {
        TranslatorError::ConfigError(error.to_string())
    }
}

/// 结果类型别名
pub type TranslatorResult<T> = Result<T, TranslatorError>;
