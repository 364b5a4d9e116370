//! 服务端消息流抽象
//!
//! 流式调用的接收端通过 [`ServerStream`] 暴露给拦截器和业务处理器。
//! 传输层保证同一个流上的接收操作串行执行（`&mut self`），包装器内部状态无需同步。

use crate::context::CallContext;
use async_trait::async_trait;
use futures::future::{self, Ready};
use futures::stream::{self, Once};
use futures::{Stream, StreamExt};
use tonic::Status;

/// 服务端接收流
#[async_trait]
pub trait ServerStream: Send {
    type Message: Send;

    /// 当前调用的上下文
    fn context(&self) -> &CallContext;

    /// 接收下一条消息，流结束时返回 `Ok(None)`
    async fn recv_msg(&mut self) -> Result<Option<Self::Message>, Status>;
}

/// 类型擦除后的接收流
pub type BoxServerStream<M> = Box<dyn ServerStream<Message = M>>;

#[async_trait]
impl<M: Send + 'static> ServerStream for BoxServerStream<M> {
    type Message = M;

    fn context(&self) -> &CallContext {
        (**self).context()
    }

    async fn recv_msg(&mut self) -> Result<Option<M>, Status> {
        (**self).recv_msg().await
    }
}

/// 由传输层消息流（如 `tonic::Streaming<T>`）构造的接收流
pub struct RecvStream<St> {
    inner: St,
    context: CallContext,
}

impl<St> RecvStream<St> {
    pub fn new(inner: St, context: CallContext) -> Self {
        Self { inner, context }
    }

    pub fn into_inner(self) -> St {
        self.inner
    }
}

#[async_trait]
impl<St, M> ServerStream for RecvStream<St>
where
    St: Stream<Item = Result<M, Status>> + Send + Unpin,
    M: Send,
{
    type Message = M;

    fn context(&self) -> &CallContext {
        &self.context
    }

    async fn recv_msg(&mut self) -> Result<Option<M>, Status> {
        self.inner.next().await.transpose()
    }
}

/// 服务端流式调用中唯一的一条请求消息
pub type SingleMessage<M> = Once<Ready<Result<M, Status>>>;

/// 把已解码的单条请求消息包装为接收流
pub fn single_message<M>(message: M, context: CallContext) -> RecvStream<SingleMessage<M>> {
    RecvStream::new(stream::once(future::ready(Ok(message))), context)
}

/// 只替换上下文、不拦截接收操作的轻量包装
pub struct WrappedStream<S> {
    inner: S,
    context: CallContext,
}

impl<S> WrappedStream<S> {
    pub fn new(inner: S, context: CallContext) -> Self {
        Self { inner, context }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S> ServerStream for WrappedStream<S>
where
    S: ServerStream,
{
    type Message = S::Message;

    fn context(&self) -> &CallContext {
        &self.context
    }

    async fn recv_msg(&mut self) -> Result<Option<S::Message>, Status> {
        self.inner.recv_msg().await
    }
}
