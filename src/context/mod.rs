//! 调用上下文
//!
//! 上下文是不可变句柄：`with_tags` 返回新的上下文，不修改原有上下文。
//! 唯一可变的部分是它指向的标签集合。
//! 请求的元数据和 extensions 原样保留，拦截器只增加标签集合。

mod tags;

pub use tags::{PEER_ADDRESS_KEY, REQUEST_FIELD_PREFIX, Tags};

use std::net::SocketAddr;
use tonic::metadata::MetadataMap;
use tonic::{Extensions, Request};

/// 调用上下文
///
/// 请求元数据（包括 `grpc-timeout`）原样转发，本层不引入新的截止时间。
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    peer_addr: Option<SocketAddr>,
    metadata: MetadataMap,
    extensions: Extensions,
    tags: Option<Tags>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 tonic 请求中提取对端地址、元数据、extensions 以及已有的标签
    pub fn from_request<T>(req: &Request<T>) -> Self {
        Self {
            peer_addr: req.remote_addr(),
            metadata: req.metadata().clone(),
            extensions: req.extensions().clone(),
            tags: req.extensions().get::<Tags>().cloned(),
        }
    }

    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataMap) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// 返回挂载了 `tags` 的新上下文
    pub fn with_tags(&self, tags: Tags) -> Self {
        Self {
            tags: Some(tags),
            ..self.clone()
        }
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    /// 上游层或传输层附加的 extensions
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// 当前调用的标签集合（没有拦截器运行时为 `None`）
    pub fn tags(&self) -> Option<&Tags> {
        self.tags.as_ref()
    }

    /// 重新组装为 tonic 请求，标签加入原有的 extensions
    ///
    /// 对端地址来自传输层的连接信息，只有原 extensions 中带有该信息时才能被读回。
    pub fn into_request<T>(self, message: T) -> Request<T> {
        let mut extensions = self.extensions;
        if let Some(tags) = self.tags {
            extensions.insert(tags);
        }
        Request::from_parts(self.metadata, extensions, message)
    }
}
