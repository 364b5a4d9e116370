//! Flare gRPC 拦截器
//!
//! 提供两个可组合的服务端拦截器：
//! - 标签传播：为每次调用创建标签集合，写入对端地址和请求字段
//! - 请求校验：消息校验失败时以 `InvalidArgument` 拒绝调用
//!
//! 两者都以 `tower::Layer` 的形式提供，可通过 [`InterceptorChain`] 按配置顺序组合。

pub mod config;
pub mod context;
pub mod error;
pub mod extract;
pub mod interceptor;
pub mod stream;
pub mod telemetry;
pub mod types;
pub mod validate;

// Re-exports
pub use config::{InterceptorConfig, LogConfig, PipelineOrder, TagsConfig, ValidatorConfig};
pub use context::{CallContext, PEER_ADDRESS_KEY, REQUEST_FIELD_PREFIX, Tags};
pub use error::{ConfigError, VIOLATIONS_METADATA_KEY, ValidationFailure};
pub use extract::{
    Fields, RequestFieldExtractor, RequestFields, codegen_extractor, extractor_for,
};
pub use interceptor::{
    ExtractState, InterceptorChain, StreamCall, TaggedStream, TagsLayer, TagsOptions,
    TagsService, TagsStream, UnaryCall, ValidatingStream, ValidatorLayer, ValidatorService,
};
pub use stream::{BoxServerStream, RecvStream, ServerStream, SingleMessage, WrappedStream};
pub use telemetry::init_tracing;
pub use types::{CallInfo, MethodKind};
pub use validate::{
    Capability, Validatable, Validate, ValidateAll, ValidationError, ValidationErrors,
};
