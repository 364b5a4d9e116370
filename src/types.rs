//! 调用描述符
//!
//! 由传输层在每次调用时提供，只读

use serde::{Deserialize, Serialize};
use std::fmt;

/// RPC 方法的流式形态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Unary,
    ServerStreaming,
    ClientStreaming,
    BidiStreaming,
}

impl MethodKind {
    /// 客户端是否可能发送多条消息
    #[inline]
    pub fn is_client_stream(&self) -> bool {
        matches!(self, MethodKind::ClientStreaming | MethodKind::BidiStreaming)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Unary => "unary",
            MethodKind::ServerStreaming => "server_streaming",
            MethodKind::ClientStreaming => "client_streaming",
            MethodKind::BidiStreaming => "bidi_streaming",
        }
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 调用描述符：完整方法名 + 流式形态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallInfo {
    full_method: String,
    kind: MethodKind,
}

impl CallInfo {
    pub fn new(full_method: impl Into<String>, kind: MethodKind) -> Self {
        Self {
            full_method: full_method.into(),
            kind,
        }
    }

    pub fn unary(full_method: impl Into<String>) -> Self {
        Self::new(full_method, MethodKind::Unary)
    }

    pub fn server_streaming(full_method: impl Into<String>) -> Self {
        Self::new(full_method, MethodKind::ServerStreaming)
    }

    pub fn client_streaming(full_method: impl Into<String>) -> Self {
        Self::new(full_method, MethodKind::ClientStreaming)
    }

    pub fn bidi_streaming(full_method: impl Into<String>) -> Self {
        Self::new(full_method, MethodKind::BidiStreaming)
    }

    /// 完整方法名，形如 `/package.Service/Method`
    pub fn full_method(&self) -> &str {
        &self.full_method
    }

    pub fn kind(&self) -> MethodKind {
        self.kind
    }

    pub fn is_client_stream(&self) -> bool {
        self.kind.is_client_stream()
    }

    /// 服务名（不含 package 前缀）
    pub fn service_name(&self) -> &str {
        self.full_method
            .trim_start_matches('/')
            .split('/')
            .next()
            .and_then(|s| s.rsplit('.').next())
            .unwrap_or("unknown")
    }

    /// 方法名
    pub fn method_name(&self) -> &str {
        self.full_method
            .trim_start_matches('/')
            .split('/')
            .nth(1)
            .unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_shape() {
        assert!(!MethodKind::Unary.is_client_stream());
        assert!(!MethodKind::ServerStreaming.is_client_stream());
        assert!(MethodKind::ClientStreaming.is_client_stream());
        assert!(MethodKind::BidiStreaming.is_client_stream());
    }

    #[test]
    fn test_method_path_parts() {
        let info = CallInfo::unary("/flare.signaling.v1.Signaling/Login");
        assert_eq!(info.service_name(), "Signaling");
        assert_eq!(info.method_name(), "Login");

        let info = CallInfo::unary("invalid");
        assert_eq!(info.service_name(), "invalid");
        assert_eq!(info.method_name(), "unknown");
    }
}
