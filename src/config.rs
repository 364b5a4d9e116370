//! 拦截器配置
//!
//! 字段提取函数无法序列化，需要在代码中通过
//! [`InterceptorChain::with_field_extractor`](crate::interceptor::InterceptorChain::with_field_extractor) 设置。

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct InterceptorConfig {
    pub order: PipelineOrder,
    pub tags: TagsConfig,
    pub validator: ValidatorConfig,
    pub log: LogConfig,
}

/// 两个拦截器的嵌套顺序，前者在外层
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOrder {
    #[default]
    TagsFirst,
    ValidatorFirst,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TagsConfig {
    pub enabled: bool,
    /// 客户端流 / 双向流只从第一条消息提取字段
    pub extract_initial_only: bool,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            extract_initial_only: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub enabled: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// `RUST_LOG` 未设置时使用的过滤规则
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl InterceptorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: InterceptorConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn with_order(mut self, order: PipelineOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_tags(mut self, enabled: bool) -> Self {
        self.tags.enabled = enabled;
        self
    }

    pub fn with_extract_initial_only(mut self, enable: bool) -> Self {
        self.tags.extract_initial_only = enable;
        self
    }

    pub fn with_validator(mut self, enabled: bool) -> Self {
        self.validator.enabled = enabled;
        self
    }
}
