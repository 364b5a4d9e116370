//! 请求校验拦截器
//!
//! 不合法的请求以 `InvalidArgument` 拒绝，业务处理器不会看到该消息。
//! 一元调用在处理器运行之前拒绝；流式调用在处理器调用 `recv_msg` 时拒绝，
//! 服务端流的唯一请求消息在第一次接收时即被校验。

use super::{StreamCall, UnaryCall};
use crate::context::CallContext;
use crate::error::ValidationFailure;
use crate::stream::ServerStream;
use crate::types::CallInfo;
use crate::validate::{self, Validatable};
use async_trait::async_trait;
use futures::future::{self, Either, Ready};
use std::task::{Context, Poll};
use tonic::Status;
use tower::{Layer, Service};
use tracing::warn;

/// 校验拦截器层，没有可配置项
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatorLayer;

impl ValidatorLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for ValidatorLayer {
    type Service = ValidatorService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ValidatorService { inner }
    }
}

/// 校验拦截器
#[derive(Debug, Clone)]
pub struct ValidatorService<S> {
    inner: S,
}

impl<S, M> Service<UnaryCall<M>> for ValidatorService<S>
where
    S: Service<UnaryCall<M>>,
    S::Error: From<ValidationFailure>,
    M: Validatable,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Either<Ready<Result<S::Response, S::Error>>, S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, call: UnaryCall<M>) -> Self::Future {
        if let Err(failure) = validate::check(&call.message) {
            warn!(
                service = call.info.service_name(),
                method = call.info.method_name(),
                violations = failure.violations(),
                error = %failure,
                "request validation failed"
            );
            return Either::Left(future::ready(Err(failure.into())));
        }

        Either::Right(self.inner.call(call))
    }
}

impl<S, St> Service<StreamCall<St>> for ValidatorService<S>
where
    S: Service<StreamCall<ValidatingStream<St>>>,
    St: ServerStream,
    St::Message: Validatable,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, call: StreamCall<St>) -> Self::Future {
        let StreamCall { info, stream } = call;
        let stream = ValidatingStream::new(stream, info.clone());
        self.inner.call(StreamCall::new(info, stream))
    }
}

/// 对每一条接收到的消息执行校验的流包装，消息之间不保留状态
pub struct ValidatingStream<S> {
    inner: S,
    info: CallInfo,
}

impl<S> ValidatingStream<S> {
    pub fn new(inner: S, info: CallInfo) -> Self {
        Self { inner, info }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S> ServerStream for ValidatingStream<S>
where
    S: ServerStream,
    S::Message: Validatable,
{
    type Message = S::Message;

    fn context(&self) -> &CallContext {
        self.inner.context()
    }

    async fn recv_msg(&mut self) -> Result<Option<S::Message>, Status> {
        let Some(message) = self.inner.recv_msg().await? else {
            return Ok(None);
        };

        if let Err(failure) = validate::check(&message) {
            warn!(
                service = self.info.service_name(),
                method = self.info.method_name(),
                violations = failure.violations(),
                error = %failure,
                "stream message validation failed"
            );
            return Err(failure.into());
        }

        Ok(Some(message))
    }
}
