//! 日志初始化
//!
//! 优先使用 `RUST_LOG`，未设置时回退到配置中的过滤规则。

use crate::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// 安装全局 tracing subscriber，重复安装时返回错误
pub fn init_tracing(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}
