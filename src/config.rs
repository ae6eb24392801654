//! 自动翻译配置管理模块
//!
//! 提供配置加载与验证功能，支持默认值、配置文件与环境变量三种配置源

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{TranslatorError, TranslatorResult};

/// 自动翻译配置常量
pub mod constants {
    /// 默认源语言（文档编写语言）
    pub const DEFAULT_SOURCE_LANGUAGE: &str = "en";

    /// 翻译前等待界面渲染完成的时间
    pub const SETTLE_DELAY_MS: u64 = 100;

    /// 一次投递中允许的最大回合数
    pub const MAX_DELIVERY_ROUNDS: usize = 32;

    pub const SKIP_ELEMENTS: &[&str] = &["script", "style", "noscript"];

    pub const CONFIG_PATHS: &[&str] = &[
        "autotranslate.toml",
        ".autotranslate.toml",
        "~/.config/autotranslate/config.toml",
        "/etc/autotranslate/config.toml",
    ];

    pub const ENV_PREFIX: &str = "AUTOTRANSLATE";
}

/// 切换到目标语言前的还原策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestorePolicy {
    /// 仅当上一个活动语言是另一种目标语言时才先还原
    #[default]
    OnLanguageChange,
    /// 每次目标语言翻译前都先还原
    Always,
}

/// 自动翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// 源语言代码
    pub source_language: String,

    /// 翻译延迟（毫秒），0 表示只让出一次调度
    pub settle_delay_ms: u64,

    /// 还原策略
    pub restore_policy: RestorePolicy,

    /// 跳过其文本内容的元素
    pub skip_elements: Vec<String>,

    /// 日志级别
    pub log_level: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            source_language: constants::DEFAULT_SOURCE_LANGUAGE.to_string(),
            settle_delay_ms: constants::SETTLE_DELAY_MS,
            restore_policy: RestorePolicy::default(),
            skip_elements: constants::SKIP_ELEMENTS
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
            log_level: "info".to_string(),
        }
    }
}

impl TranslatorConfig {
    /// 翻译延迟
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// 判断语言是否为源语言
    pub fn is_source_language(&self, language: &str) -> bool {
        self.source_language == language
    }

    /// 验证配置
    pub fn validate(&self) -> TranslatorResult<()> {
        if self.source_language.trim().is_empty() {
            return Err(TranslatorError::ConfigError("源语言不能为空".to_string()));
        }

        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(TranslatorError::ConfigError(format!(
                "无效的日志级别: {}",
                self.log_level
            )));
        }

        Ok(())
    }
}

/// 配置加载器
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// 加载配置
    ///
    /// 指定路径时只加载该文件，否则使用 `CONFIG_PATHS` 中第一个存在的文件。
    pub fn load(path: Option<&Path>) -> TranslatorResult<TranslatorConfig> {
        let mut builder = Self::defaults()?;

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path));
                tracing::info!("加载配置文件: {}", path.display());
            }
            None => {
                for candidate in constants::CONFIG_PATHS {
                    let expanded_path = shellexpand::tilde(candidate);
                    if Path::new(expanded_path.as_ref()).exists() {
                        builder = builder.add_source(File::with_name(&expanded_path));
                        tracing::info!("加载配置文件: {}", expanded_path);
                        break;
                    }
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(constants::ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Self::finish(builder)
    }

    /// 从 TOML 字符串加载配置（不读取环境变量）
    pub fn from_toml_str(content: &str) -> TranslatorResult<TranslatorConfig> {
        let builder = Self::defaults()?.add_source(File::from_str(content, FileFormat::Toml));
        Self::finish(builder)
    }

    fn defaults() -> TranslatorResult<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Config::try_from(&TranslatorConfig::default())
            .map_err(|e| TranslatorError::ConfigError(format!("默认配置错误: {}", e)))?;
        Ok(Config::builder().add_source(defaults))
    }

    fn finish(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> TranslatorResult<TranslatorConfig> {
        let config = builder
            .build()
            .map_err(|e| TranslatorError::ConfigError(format!("构建配置失败: {}", e)))?;

        let translator_config: TranslatorConfig = config
            .try_deserialize()
            .map_err(|e| TranslatorError::ConfigError(format!("反序列化配置失败: {}", e)))?;

        translator_config.validate()?;

        tracing::debug!(
            "加载的配置 - 源语言: {}, 延迟: {}ms",
            translator_config.source_language,
            translator_config.settle_delay_ms
        );

        Ok(translator_config)
    }
}
