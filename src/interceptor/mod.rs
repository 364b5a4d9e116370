//! gRPC 拦截器模块
//!
//! 提供标签传播、请求校验两个拦截器，均以 `tower::Layer` 的形式组合，
//! 同一个服务同时接受一元调用 [`UnaryCall`] 与流式调用 [`StreamCall`]。

pub mod composite;
pub mod tags;
pub mod validator;

pub use composite::InterceptorChain;
pub use tags::{ExtractState, TaggedStream, TagsLayer, TagsOptions, TagsService, TagsStream};
pub use validator::{ValidatingStream, ValidatorLayer, ValidatorService};

use crate::context::CallContext;
use crate::stream::{RecvStream, ServerStream, SingleMessage, single_message};
use crate::types::CallInfo;
use tonic::Request;

/// 一元调用
#[derive(Debug)]
pub struct UnaryCall<M> {
    pub info: CallInfo,
    pub context: CallContext,
    pub message: M,
}

impl<M> UnaryCall<M> {
    pub fn new(info: CallInfo, context: CallContext, message: M) -> Self {
        Self {
            info,
            context,
            message,
        }
    }

    /// 从 tonic 请求构造
    pub fn from_request(info: CallInfo, request: Request<M>) -> Self {
        let context = CallContext::from_request(&request);
        Self::new(info, context, request.into_inner())
    }

    /// 还原为 tonic 请求，标签随 extensions 传递给业务处理器
    pub fn into_request(self) -> Request<M> {
        self.context.into_request(self.message)
    }
}

/// 流式调用
///
/// 上下文由流本身提供，处理器应通过 `stream.context()` 读取。
pub struct StreamCall<S> {
    pub info: CallInfo,
    pub stream: S,
}

impl<S> StreamCall<S> {
    pub fn new(info: CallInfo, stream: S) -> Self {
        Self { info, stream }
    }
}

impl<S: ServerStream> StreamCall<S> {
    pub fn context(&self) -> &CallContext {
        self.stream.context()
    }
}

impl<St> StreamCall<RecvStream<St>> {
    /// 客户端流 / 双向流：`St` 通常为 `tonic::Streaming<T>`
    pub fn from_request(info: CallInfo, request: Request<St>) -> Self {
        let context = CallContext::from_request(&request);
        Self::new(info, RecvStream::new(request.into_inner(), context))
    }
}

impl<M> StreamCall<RecvStream<SingleMessage<M>>> {
    /// 服务端流：tonic 已解码出唯一的请求消息，
    /// 以单消息流的形式交给拦截器，在第一次接收时被观察和校验
    pub fn server_streaming(info: CallInfo, request: Request<M>) -> Self {
        let context = CallContext::from_request(&request);
        Self::new(info, single_message(request.into_inner(), context))
    }
}
