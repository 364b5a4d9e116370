//! 标签传播拦截器
//!
//! 每次调用创建新的标签集合，写入对端地址；配置了字段提取函数时，
//! 再把请求字段以 `grpc.request.<key>` 的形式写入。

use super::{StreamCall, UnaryCall};
use crate::context::{CallContext, PEER_ADDRESS_KEY, REQUEST_FIELD_PREFIX, Tags};
use crate::extract::RequestFieldExtractor;
use crate::stream::{ServerStream, WrappedStream};
use crate::types::CallInfo;
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use tonic::Status;
use tower::{Layer, Service};
use tracing::trace;

/// 标签拦截器选项
#[derive(Clone, Default)]
pub struct TagsOptions {
    extractor: Option<RequestFieldExtractor>,
    extract_initial_only: bool,
}

impl TagsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置请求字段提取函数
    pub fn with_field_extractor(mut self, extractor: RequestFieldExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// 设置提取函数，并且客户端流 / 双向流只从第一条消息提取
    pub fn with_field_extractor_for_initial_req(mut self, extractor: RequestFieldExtractor) -> Self {
        self.extractor = Some(extractor);
        self.extract_initial_only = true;
        self
    }

    /// 客户端流 / 双向流是否只从第一条消息提取
    pub fn with_extract_initial_only(mut self, enable: bool) -> Self {
        self.extract_initial_only = enable;
        self
    }

    pub fn extractor(&self) -> Option<&RequestFieldExtractor> {
        self.extractor.as_ref()
    }

    pub fn extract_initial_only(&self) -> bool {
        self.extract_initial_only
    }
}

impl fmt::Debug for TagsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagsOptions")
            .field("extractor", &self.extractor.is_some())
            .field("extract_initial_only", &self.extract_initial_only)
            .finish()
    }
}

/// 标签拦截器层
#[derive(Debug, Clone, Default)]
pub struct TagsLayer {
    options: Arc<TagsOptions>,
}

impl TagsLayer {
    pub fn new(options: TagsOptions) -> Self {
        Self {
            options: Arc::new(options),
        }
    }
}

impl<S> Layer<S> for TagsLayer {
    type Service = TagsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TagsService {
            inner,
            options: self.options.clone(),
        }
    }
}

/// 标签拦截器
#[derive(Debug, Clone)]
pub struct TagsService<S> {
    inner: S,
    options: Arc<TagsOptions>,
}

impl<S, M> Service<UnaryCall<M>> for TagsService<S>
where
    S: Service<UnaryCall<M>>,
    M: Any,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut call: UnaryCall<M>) -> Self::Future {
        let tags = new_tags_for(&call.context);
        if let Some(extractor) = &self.options.extractor {
            set_request_field_tags(&tags, extractor, call.info.full_method(), &call.message);
        }

        trace!(
            service = call.info.service_name(),
            method = call.info.method_name(),
            tags = tags.len(),
            "request tags attached"
        );

        call.context = call.context.with_tags(tags);
        self.inner.call(call)
    }
}

impl<S, St> Service<StreamCall<St>> for TagsService<S>
where
    S: Service<StreamCall<TagsStream<St>>>,
    St: ServerStream,
    St::Message: Any,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, call: StreamCall<St>) -> Self::Future {
        let StreamCall { info, stream } = call;
        let context = stream.context().with_tags(new_tags_for(stream.context()));

        let stream = match &self.options.extractor {
            // 没有提取函数时只替换上下文
            None => TagsStream::Swapped(WrappedStream::new(stream, context)),
            Some(extractor) => TagsStream::Intercepted(TaggedStream::new(
                stream,
                context,
                info.clone(),
                extractor.clone(),
                self.options.extract_initial_only,
            )),
        };

        trace!(
            service = info.service_name(),
            method = info.method_name(),
            kind = %info.kind(),
            intercepted = matches!(stream, TagsStream::Intercepted(_)),
            "stream tags attached"
        );

        self.inner.call(StreamCall::new(info, stream))
    }
}

/// 标签拦截器交给下一阶段的流
pub enum TagsStream<S> {
    Swapped(WrappedStream<S>),
    Intercepted(TaggedStream<S>),
}

#[async_trait]
impl<S> ServerStream for TagsStream<S>
where
    S: ServerStream,
    S::Message: Any,
{
    type Message = S::Message;

    fn context(&self) -> &CallContext {
        match self {
            TagsStream::Swapped(stream) => stream.context(),
            TagsStream::Intercepted(stream) => stream.context(),
        }
    }

    async fn recv_msg(&mut self) -> Result<Option<S::Message>, Status> {
        match self {
            TagsStream::Swapped(stream) => stream.recv_msg().await,
            TagsStream::Intercepted(stream) => stream.recv_msg().await,
        }
    }
}

/// 流提取状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractState {
    AwaitingFirst,
    Steady,
}

/// 拦截接收操作、从请求消息中提取字段的流包装
///
/// 上下文以包装器持有的为准，覆盖内部流的上下文。
pub struct TaggedStream<S> {
    inner: S,
    context: CallContext,
    info: CallInfo,
    extractor: RequestFieldExtractor,
    extract_initial_only: bool,
    state: ExtractState,
}

impl<S> TaggedStream<S> {
    pub fn new(
        inner: S,
        context: CallContext,
        info: CallInfo,
        extractor: RequestFieldExtractor,
        extract_initial_only: bool,
    ) -> Self {
        Self {
            inner,
            context,
            info,
            extractor,
            extract_initial_only,
            state: ExtractState::AwaitingFirst,
        }
    }

    pub fn state(&self) -> ExtractState {
        self.state
    }
}

#[async_trait]
impl<S> ServerStream for TaggedStream<S>
where
    S: ServerStream,
    S::Message: Any,
{
    type Message = S::Message;

    fn context(&self) -> &CallContext {
        &self.context
    }

    async fn recv_msg(&mut self) -> Result<Option<S::Message>, Status> {
        let Some(message) = self.inner.recv_msg().await? else {
            return Ok(None);
        };

        // 服务端流只有一条请求消息，每次接收都提取
        let extract = !self.info.is_client_stream()
            || (self.extract_initial_only && self.state == ExtractState::AwaitingFirst);
        self.state = ExtractState::Steady;

        if extract && let Some(tags) = self.context.tags() {
            set_request_field_tags(tags, &self.extractor, self.info.full_method(), &message);
        }

        Ok(Some(message))
    }
}

fn new_tags_for(context: &CallContext) -> Tags {
    let tags = Tags::new();
    if let Some(addr) = context.peer_addr() {
        tags.set(PEER_ADDRESS_KEY, addr.to_string());
    }
    tags
}

fn set_request_field_tags(
    tags: &Tags,
    extractor: &RequestFieldExtractor,
    full_method: &str,
    message: &dyn Any,
) {
    if let Some(fields) = extractor(full_method, message) {
        for (key, value) in fields {
            tags.set(format!("{REQUEST_FIELD_PREFIX}{key}"), value);
        }
    }
}
