//! 请求消息校验能力
//!
//! 消息通过 [`Validatable::capability`] 声明自己支持的校验方式：
//! 完整校验（汇总全部错误）、单项校验（遇到第一个错误即返回）或不校验。

use crate::error::ValidationFailure;
use thiserror::Error;

/// 单条校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}{reason}", field_prefix(.field))]
pub struct ValidationError {
    field: Option<String>,
    reason: String,
}

impl ValidationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            field: None,
            reason: reason.into(),
        }
    }

    /// 关联到具体字段的校验错误
    pub fn for_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

fn field_prefix(field: &Option<String>) -> String {
    field
        .as_deref()
        .map(|field| format!("{field}: "))
        .unwrap_or_default()
}

/// 汇总的校验错误，按 `; ` 连接
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", join_errors(.0))]
pub struct ValidationErrors(Vec<ValidationError>);

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// 没有错误时返回 `Ok(())`
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl FromIterator<ValidationError> for ValidationErrors {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// 完整校验，返回全部错误
pub trait ValidateAll {
    fn validate_all(&self) -> Result<(), ValidationErrors>;
}

/// 单项校验，遇到第一个错误即返回
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// 消息声明的校验能力
pub enum Capability<'a> {
    All(&'a dyn ValidateAll),
    Single(&'a dyn Validate),
    None,
}

/// 可被校验拦截器识别的消息
///
/// 默认不声明任何能力，消息原样放行。同时支持两种方式的消息应返回 `Capability::All`。
pub trait Validatable {
    fn capability(&self) -> Capability<'_> {
        Capability::None
    }
}

/// 按消息声明的能力执行校验
pub fn check<M>(message: &M) -> Result<(), ValidationFailure>
where
    M: Validatable + ?Sized,
{
    match message.capability() {
        Capability::All(v) => v.validate_all().map_err(ValidationFailure::All),
        Capability::Single(v) => v.validate().map_err(ValidationFailure::Single),
        Capability::None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Both(&'static str);

    impl ValidateAll for Both {
        fn validate_all(&self) -> Result<(), ValidationErrors> {
            [ValidationError::new("all"), ValidationError::new(self.0)]
                .into_iter()
                .collect::<ValidationErrors>()
                .into_result()
        }
    }

    impl Validate for Both {
        fn validate(&self) -> Result<(), ValidationError> {
            Err(ValidationError::new("single"))
        }
    }

    impl Validatable for Both {
        fn capability(&self) -> Capability<'_> {
            Capability::All(self)
        }
    }

    struct Plain;

    impl Validatable for Plain {}

    #[test]
    fn test_all_capability_collects_every_error() {
        let failure = check(&Both("second")).unwrap_err();
        assert_eq!(failure.violations(), 2);
        assert_eq!(failure.to_string(), "all; second");
    }

    #[test]
    fn test_no_capability_passes() {
        assert!(check(&Plain).is_ok());
    }

    #[test]
    fn test_empty_errors_into_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ValidationError::for_field("name", "field required").to_string(),
            "name: field required"
        );
        assert_eq!(ValidationError::new("field required").to_string(), "field required");
    }
}
