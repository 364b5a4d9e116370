//! 校验失败与 gRPC 状态之间的转换

use crate::validate::{ValidationError, ValidationErrors};
use thiserror::Error;
use tonic::Status;

/// 违规条目数量写入的 metadata 键
pub const VIOLATIONS_METADATA_KEY: &str = "x-validation-violations";

/// 请求校验失败
///
/// 始终在业务逻辑看到问题消息之前终止调用。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// 完整校验的全部错误
    #[error(transparent)]
    All(ValidationErrors),

    /// 单项校验的第一个错误
    #[error(transparent)]
    Single(ValidationError),
}

impl ValidationFailure {
    /// 违规条目数量
    pub fn violations(&self) -> usize {
        match self {
            ValidationFailure::All(errors) => errors.len(),
            ValidationFailure::Single(_) => 1,
        }
    }
}

impl From<ValidationFailure> for Status {
    fn from(failure: ValidationFailure) -> Self {
        let mut status = Status::invalid_argument(failure.to_string());

        if let Ok(value) = failure.violations().to_string().parse() {
            status.metadata_mut().insert(VIOLATIONS_METADATA_KEY, value);
        }

        status
    }
}
