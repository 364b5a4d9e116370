//! 调用级标签容器
//!
//! 每次调用创建一个，调用结束即丢弃，不跨调用共享

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// 对端地址标签
pub const PEER_ADDRESS_KEY: &str = "peer.address";

/// 请求字段标签前缀
pub const REQUEST_FIELD_PREFIX: &str = "grpc.request.";

/// 标签集合
///
/// 克隆得到的是同一个集合的句柄，写入对所有持有者可见。
/// 键唯一，后写覆盖先写。
#[derive(Debug, Clone, Default)]
pub struct Tags {
    values: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置标签
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.lock().insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// 当前所有标签的快照
    pub fn values(&self) -> BTreeMap<String, Value> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_write_wins() {
        let tags = Tags::new();
        tags.set("user_id", "1").set("user_id", "2");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("user_id"), Some(json!("2")));
    }

    #[test]
    fn test_clone_shares_storage() {
        let tags = Tags::new();
        let handle = tags.clone();
        handle.set("grpc.request.id", 42);
        assert_eq!(tags.values().get("grpc.request.id"), Some(&json!(42)));
    }
}
