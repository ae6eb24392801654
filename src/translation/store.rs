//! 词典与语言状态
//!
//! `TranslationDictionary` 是某一目标语言的扁平词典；`DictionaryCatalog`
//! 按语言代码管理词典；`TranslationStore` 持有当前的 (语言, 词典) 组合，
//! 并通过 watch 通道通知订阅者。

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{TranslatorError, TranslatorResult};

/// 翻译词典
///
/// 键在插入时去除首尾空白，查找时同样去除空白后精确匹配。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "HashMap<String, String>", into = "HashMap<String, String>")]
pub struct TranslationDictionary {
    entries: HashMap<String, String>,
}

impl TranslationDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let source = source.into();
        self.entries.insert(source.trim().to_string(), target.into());
    }

    /// 查找译文
    pub fn lookup(&self, text: &str) -> Option<&str> {
        self.entries.get(text.trim()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn from_json_str(content: &str) -> TranslatorResult<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

impl From<HashMap<String, String>> for TranslationDictionary {
    fn from(entries: HashMap<String, String>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<TranslationDictionary> for HashMap<String, String> {
    fn from(dictionary: TranslationDictionary) -> Self {
        dictionary.entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TranslationDictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dictionary = Self::new();
        for (source, target) in iter {
            dictionary.insert(source, target);
        }
        dictionary
    }
}

/// 按语言代码组织的词典集合
#[derive(Debug, Clone, Default)]
pub struct DictionaryCatalog {
    dictionaries: HashMap<String, Arc<TranslationDictionary>>,
}

impl DictionaryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 `{"ar": {"Save": "حفظ"}}` 形式的 JSON 加载
    pub fn from_json_str(content: &str) -> TranslatorResult<Self> {
        let raw: HashMap<String, TranslationDictionary> = serde_json::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    /// 从 `[ar]` 分表形式的 TOML 加载
    pub fn from_toml_str(content: &str) -> TranslatorResult<Self> {
        let raw: HashMap<String, TranslationDictionary> = toml::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    /// 根据扩展名加载 JSON 或 TOML 词典文件
    pub fn load(path: &Path) -> TranslatorResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslatorError::from(e).with_context(path.display()))?;

        let catalog = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            Some("toml") => Self::from_toml_str(&content)?,
            other => {
                return Err(TranslatorError::DictionaryError(format!(
                    "不支持的词典格式: {:?}",
                    other
                )))
            }
        };

        tracing::info!(
            "已加载词典 {}: {} 种语言",
            path.display(),
            catalog.dictionaries.len()
        );
        Ok(catalog)
    }

    fn from_raw(raw: HashMap<String, TranslationDictionary>) -> Self {
        Self {
            dictionaries: raw
                .into_iter()
                .map(|(language, dictionary)| (language, Arc::new(dictionary)))
                .collect(),
        }
    }

    pub fn insert(&mut self, language: impl Into<String>, dictionary: TranslationDictionary) {
        self.dictionaries.insert(language.into(), Arc::new(dictionary));
    }

    /// 获取词典；没有该语言的词典时返回空词典
    pub fn dictionary(&self, language: &str) -> Arc<TranslationDictionary> {
        match self.dictionaries.get(language) {
            Some(dictionary) => Arc::clone(dictionary),
            None => {
                tracing::debug!("语言 {} 没有词典，使用空词典", language);
                Arc::new(TranslationDictionary::new())
            }
        }
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.dictionaries.keys().map(String::as_str)
    }
}

/// 语言切换请求：(语言, 词典)
#[derive(Debug, Clone)]
pub struct LanguageRequest {
    pub language: String,
    pub dictionary: Arc<TranslationDictionary>,
}

impl LanguageRequest {
    pub fn new(language: impl Into<String>, dictionary: Arc<TranslationDictionary>) -> Self {
        Self {
            language: language.into(),
            dictionary,
        }
    }

    /// 不携带译文的请求，通常用于切回源语言
    pub fn without_dictionary(language: impl Into<String>) -> Self {
        Self::new(language, Arc::new(TranslationDictionary::new()))
    }

    /// 语言相同且词典内容相同
    pub fn same_as(&self, other: &LanguageRequest) -> bool {
        self.language == other.language
            && (Arc::ptr_eq(&self.dictionary, &other.dictionary) || self.dictionary == other.dictionary)
    }
}

/// 当前语言状态
#[derive(Debug)]
pub struct TranslationStore {
    sender: watch::Sender<LanguageRequest>,
    catalog: DictionaryCatalog,
}

impl TranslationStore {
    pub fn new(initial_language: &str, catalog: DictionaryCatalog) -> Self {
        let initial = LanguageRequest::new(initial_language, catalog.dictionary(initial_language));
        let (sender, _) = watch::channel(initial);
        Self { sender, catalog }
    }

    /// 当前 (语言, 词典)
    pub fn current(&self) -> LanguageRequest {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LanguageRequest> {
        self.sender.subscribe()
    }

    /// 切换语言，返回状态是否发生变化
    pub fn set_language(&self, language: &str) -> bool {
        let next = LanguageRequest::new(language, self.catalog.dictionary(language));
        self.publish(next)
    }

    /// 替换某种语言的词典；该语言处于活动状态时重新发布
    pub fn replace_dictionary(&mut self, language: &str, dictionary: TranslationDictionary) -> bool {
        self.catalog.insert(language, dictionary);
        if self.sender.borrow().language == language {
            let next = LanguageRequest::new(language, self.catalog.dictionary(language));
            self.publish(next)
        } else {
            false
        }
    }

    fn publish(&self, next: LanguageRequest) -> bool {
        self.sender.send_if_modified(|current| {
            if current.same_as(&next) {
                false
            } else {
                *current = next;
                true
            }
        })
    }
}
