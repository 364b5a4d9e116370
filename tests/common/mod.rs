//! 测试公共工具：假消息类型、假传输流、计数提取函数

#![allow(dead_code)]

use flare_interceptors::{
    CallContext, Capability, Fields, RecvStream, RequestFieldExtractor, Validatable, Validate,
    ValidateAll, ValidationError, ValidationErrors, extractor_for,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tonic::Status;

pub const PEER: &str = "10.0.0.1:500";

/// 单项校验消息：`name` 不能为空
#[derive(Debug, Clone, PartialEq)]
pub struct PingRequest {
    pub id: String,
    pub name: String,
}

impl PingRequest {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

impl Validate for PingRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::new("field required"));
        }
        Ok(())
    }
}

impl Validatable for PingRequest {
    fn capability(&self) -> Capability<'_> {
        Capability::Single(self)
    }
}

/// 完整校验消息
#[derive(Debug, Clone, PartialEq)]
pub struct SendRequest {
    pub user_id: String,
    pub content: String,
}

impl ValidateAll for SendRequest {
    fn validate_all(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.user_id.is_empty() {
            errors.push(ValidationError::for_field("user_id", "must not be empty"));
        }
        if self.content.len() > 8 {
            errors.push(ValidationError::for_field("content", "too long"));
        }
        errors.into_result()
    }
}

impl Validatable for SendRequest {
    fn capability(&self) -> Capability<'_> {
        Capability::All(self)
    }
}

/// 不声明校验能力的消息
#[derive(Debug, Clone, PartialEq)]
pub struct Heartbeat {
    pub seq: u64,
}

impl Validatable for Heartbeat {}

pub type FakeStream<M> = RecvStream<futures::stream::Iter<std::vec::IntoIter<Result<M, Status>>>>;

pub fn peer_addr() -> SocketAddr {
    PEER.parse().unwrap()
}

pub fn peer_context() -> CallContext {
    CallContext::new().with_peer_addr(peer_addr())
}

pub fn fake_stream<M>(context: CallContext, items: Vec<Result<M, Status>>) -> FakeStream<M> {
    RecvStream::new(futures::stream::iter(items), context)
}

/// 记录调用次数的提取函数，从 `PingRequest.id` 提取 `id`
pub fn counting_id_extractor() -> (RequestFieldExtractor, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let extractor = extractor_for(move |_method: &str, msg: &PingRequest| {
        counter.fetch_add(1, Ordering::SeqCst);
        Some(Fields::from([("id".to_string(), json!(msg.id))]))
    });
    (extractor, calls)
}

pub fn count(calls: &AtomicUsize) -> usize {
    calls.load(Ordering::SeqCst)
}
