use super::{StreamCall, TagsLayer, TagsOptions, UnaryCall, ValidatorLayer};
use crate::config::{InterceptorConfig, PipelineOrder};
use crate::extract::RequestFieldExtractor;
use crate::stream::{BoxServerStream, ServerStream};
use crate::validate::Validatable;
use std::task::{Context, Poll};
use tonic::Status;
use tower::util::BoxCloneService;
use tower::{Layer, Service, ServiceBuilder};
use tracing::debug;

/// 组合拦截器
///
/// 按配置的顺序把标签拦截器和校验拦截器套在业务处理器外层。
/// 被禁用的拦截器完全不参与调用。
#[derive(Debug, Clone)]
pub struct InterceptorChain {
    config: InterceptorConfig,
    tags: TagsOptions,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::from_config(InterceptorConfig::default())
    }

    pub fn from_config(config: InterceptorConfig) -> Self {
        let tags = TagsOptions::new().with_extract_initial_only(config.tags.extract_initial_only);
        Self { config, tags }
    }

    pub fn with_field_extractor(mut self, extractor: RequestFieldExtractor) -> Self {
        self.tags = self.tags.with_field_extractor(extractor);
        self
    }

    pub fn with_order(mut self, order: PipelineOrder) -> Self {
        self.config.order = order;
        self
    }

    pub fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    fn tags_layer(&self) -> Option<TagsLayer> {
        self.config
            .tags
            .enabled
            .then(|| TagsLayer::new(self.tags.clone()))
    }

    fn validator_layer(&self) -> Option<ValidatorLayer> {
        self.config.validator.enabled.then_some(ValidatorLayer)
    }

    /// 包装一元调用处理器
    pub fn unary<M, H>(&self, handler: H) -> BoxCloneService<UnaryCall<M>, H::Response, Status>
    where
        M: Validatable + 'static,
        H: Service<UnaryCall<M>, Error = Status> + Clone + Send + 'static,
        H::Future: Send + 'static,
        H::Response: Send + 'static,
    {
        debug!(
            order = ?self.config.order,
            tags = self.config.tags.enabled,
            validator = self.config.validator.enabled,
            "building unary interceptor chain"
        );

        match (self.tags_layer(), self.validator_layer(), self.config.order) {
            (Some(tags), Some(validator), PipelineOrder::TagsFirst) => BoxCloneService::new(
                ServiceBuilder::new()
                    .layer(tags)
                    .layer(validator)
                    .service(handler),
            ),
            (Some(tags), Some(validator), PipelineOrder::ValidatorFirst) => BoxCloneService::new(
                ServiceBuilder::new()
                    .layer(validator)
                    .layer(tags)
                    .service(handler),
            ),
            (Some(tags), None, _) => BoxCloneService::new(tags.layer(handler)),
            (None, Some(validator), _) => BoxCloneService::new(validator.layer(handler)),
            (None, None, _) => BoxCloneService::new(handler),
        }
    }

    /// 包装流式调用处理器
    ///
    /// 处理器收到的是类型擦除后的流，与拦截器的嵌套顺序无关。
    pub fn streaming<St, H>(
        &self,
        handler: H,
    ) -> BoxCloneService<StreamCall<St>, H::Response, Status>
    where
        St: ServerStream + 'static,
        St::Message: Validatable + 'static,
        H: Service<StreamCall<BoxServerStream<St::Message>>, Error = Status>
            + Clone
            + Send
            + 'static,
        H::Future: Send + 'static,
        H::Response: Send + 'static,
    {
        debug!(
            order = ?self.config.order,
            tags = self.config.tags.enabled,
            validator = self.config.validator.enabled,
            "building streaming interceptor chain"
        );

        match (self.tags_layer(), self.validator_layer(), self.config.order) {
            (Some(tags), Some(validator), PipelineOrder::TagsFirst) => BoxCloneService::new(
                ServiceBuilder::new()
                    .layer(tags)
                    .layer(validator)
                    .layer(BoxStreamLayer)
                    .service(handler),
            ),
            (Some(tags), Some(validator), PipelineOrder::ValidatorFirst) => BoxCloneService::new(
                ServiceBuilder::new()
                    .layer(validator)
                    .layer(tags)
                    .layer(BoxStreamLayer)
                    .service(handler),
            ),
            (Some(tags), None, _) => BoxCloneService::new(
                ServiceBuilder::new()
                    .layer(tags)
                    .layer(BoxStreamLayer)
                    .service(handler),
            ),
            (None, Some(validator), _) => BoxCloneService::new(
                ServiceBuilder::new()
                    .layer(validator)
                    .layer(BoxStreamLayer)
                    .service(handler),
            ),
            (None, None, _) => BoxCloneService::new(BoxStreamLayer.layer(handler)),
        }
    }
}

impl Default for InterceptorChain {
    fn default() -> Self {
        Self::new()
    }
}

/// 在进入处理器之前擦除流的具体类型
#[derive(Debug, Clone, Copy)]
struct BoxStreamLayer;

impl<H> Layer<H> for BoxStreamLayer {
    type Service = BoxStreamService<H>;

    fn layer(&self, inner: H) -> Self::Service {
        BoxStreamService { inner }
    }
}

#[derive(Debug, Clone)]
struct BoxStreamService<H> {
    inner: H,
}

impl<H, St> Service<StreamCall<St>> for BoxStreamService<H>
where
    St: ServerStream + 'static,
    H: Service<StreamCall<BoxServerStream<St::Message>>>,
{
    type Response = H::Response;
    type Error = H::Error;
    type Future = H::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, call: StreamCall<St>) -> Self::Future {
        let StreamCall { info, stream } = call;
        let stream: BoxServerStream<St::Message> = Box::new(stream);
        self.inner.call(StreamCall::new(info, stream))
    }
}
