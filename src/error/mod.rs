//! 错误处理模块
//!
//! - 校验失败：转换为 `InvalidArgument` 状态
//! - 传输错误：`tonic::Status` 原样透传，不在此定义
//! - 配置错误：加载拦截器配置时产生

pub mod config;
pub mod grpc;

pub use config::ConfigError;
pub use grpc::{VIOLATIONS_METADATA_KEY, ValidationFailure};
