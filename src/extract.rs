//! 请求字段提取
//!
//! 提取函数由调用方提供：`(方法名, 请求消息) -> 字段映射`，返回 `None` 表示没有可提取的字段。

use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 提取出的请求字段
pub type Fields = BTreeMap<String, Value>;

/// 请求字段提取函数
pub type RequestFieldExtractor = Arc<dyn Fn(&str, &dyn Any) -> Option<Fields> + Send + Sync>;

/// 针对某一消息类型的提取函数，其它类型的消息直接跳过
pub fn extractor_for<M, F>(f: F) -> RequestFieldExtractor
where
    M: Any,
    F: Fn(&str, &M) -> Option<Fields> + Send + Sync + 'static,
{
    Arc::new(move |method: &str, message: &dyn Any| {
        message
            .downcast_ref::<M>()
            .and_then(|message| f(method, message))
    })
}

/// 由生成代码实现的字段导出能力
pub trait RequestFields {
    fn extract_request_fields(&self, dst: &mut Fields);
}

/// 使用消息自身 `RequestFields` 实现的提取函数
pub fn codegen_extractor<M>() -> RequestFieldExtractor
where
    M: RequestFields + Any,
{
    extractor_for(|_method: &str, message: &M| {
        let mut fields = Fields::new();
        message.extract_request_fields(&mut fields);
        if fields.is_empty() {
            None
        } else {
            Some(fields)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Login {
        user_id: String,
    }

    impl RequestFields for Login {
        fn extract_request_fields(&self, dst: &mut Fields) {
            if !self.user_id.is_empty() {
                dst.insert("user_id".to_string(), json!(self.user_id));
            }
        }
    }

    #[test]
    fn test_extractor_for_skips_other_types() {
        let extractor = extractor_for(|_, msg: &String| {
            Some(Fields::from([("len".to_string(), json!(msg.len()))]))
        });
        assert!(extractor("/a.B/C", &7u32).is_none());
        let fields = extractor("/a.B/C", &"abc".to_string()).unwrap();
        assert_eq!(fields.get("len"), Some(&json!(3)));
    }

    #[test]
    fn test_codegen_extractor_empty_is_none() {
        let extractor = codegen_extractor::<Login>();
        let empty = Login {
            user_id: String::new(),
        };
        assert!(extractor("/a.B/C", &empty).is_none());

        let login = Login {
            user_id: "u1".to_string(),
        };
        let fields = extractor("/a.B/C", &login).unwrap();
        assert_eq!(fields.get("user_id"), Some(&json!("u1")));
    }
}
