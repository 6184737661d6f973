//! 签到结果数据结构
//!
//! 定义签到请求、单次策略尝试结果以及最终签到结果

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// 签到请求，单次运行内不可变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinRequest {
    /// 用户ID
    pub user_id: String,
    /// 签到接口
    pub endpoint: Url,
}

impl CheckinRequest {
    pub fn new(user_id: impl Into<String>, endpoint: Url) -> Self {
        Self {
            user_id: user_id.into(),
            endpoint,
        }
    }
}

/// 签到策略（请求方式）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckinMethod {
    /// 标准表单POST
    StandardPost,
    /// 先访问主页获取cookies再POST
    BrowserSimulation,
    /// 带uid查询参数的GET
    GetRequest,
}

impl CheckinMethod {
    /// 回退链顺序
    pub const FALLBACK_ORDER: [CheckinMethod; 3] = [
        CheckinMethod::StandardPost,
        CheckinMethod::BrowserSimulation,
        CheckinMethod::GetRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckinMethod::StandardPost => "standard-post",
            CheckinMethod::BrowserSimulation => "browser-simulation",
            CheckinMethod::GetRequest => "get-request",
        }
    }
}

impl std::fmt::Display for CheckinMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 响应体
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// 原始文本
    Text(String),
    /// 已解析的JSON
    Json(Value),
}

/// 单次策略尝试的结果，创建后不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptResult {
    /// HTTP状态码
    pub status: Option<u16>,
    /// 响应体
    pub body: Option<ResponseBody>,
    /// 是否被拦截
    pub blocked: bool,
    /// 产生该结果的策略
    pub method: CheckinMethod,
    /// 传输层错误信息
    pub transport_error: Option<String>,
}

impl AttemptResult {
    /// 由真实HTTP响应构建，403视为被拦截
    pub fn from_response(method: CheckinMethod, status: u16, body: Option<ResponseBody>) -> Self {
        Self {
            status: Some(status),
            body,
            blocked: status == 403,
            method,
            transport_error: None,
        }
    }

    /// 传输层异常时合成的结果：状态码500且标记为被拦截
    pub fn transport_failure(method: CheckinMethod, error: impl Into<String>) -> Self {
        Self {
            status: Some(500),
            body: None,
            blocked: true,
            method,
            transport_error: Some(error.into()),
        }
    }
}

/// 最终签到结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinOutcome {
    /// 运行ID
    pub run_id: Uuid,
    /// 是否签到成功
    pub success: bool,
    /// 最终HTTP状态码
    pub status: Option<u16>,
    /// 分类后的响应数据
    pub data: Value,
    /// 结果生成时间
    pub timestamp: DateTime<Utc>,
    /// 用户ID
    pub user_id: String,
    /// 最终使用的策略
    pub method: Option<CheckinMethod>,
    /// 错误信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckinOutcome {
    /// 签到流程本身出错（未产生任何尝试结果）时的结果
    pub fn from_error(user_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            success: false,
            status: None,
            data: Value::Object(Default::default()),
            timestamp: Utc::now(),
            user_id: user_id.into(),
            method: None,
            error: Some(error.into()),
        }
    }

    /// 分类数据是否标记为被拦截
    pub fn is_blocked(&self) -> bool {
        self.data.get("blocked").is_some_and(is_truthy)
    }

    /// 可读的提示信息：优先取响应中的msg，其次是错误信息
    pub fn message(&self) -> Option<String> {
        let msg = self
            .data
            .get("msg")
            .filter(|v| is_truthy(v))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });

        msg.or_else(|| self.error.clone().filter(|e| !e.is_empty()))
    }

    /// 方法标签，未知时为 "unknown"
    pub fn method_label(&self) -> &'static str {
        self.method.map(|m| m.as_str()).unwrap_or("unknown")
    }

    /// 转换为格式化JSON字符串
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// 按JSON真值语义判断
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_method_labels() {
        assert_eq!(CheckinMethod::StandardPost.to_string(), "standard-post");
        assert_eq!(
            serde_json::to_value(CheckinMethod::BrowserSimulation).unwrap(),
            json!("browser-simulation")
        );
        assert_eq!(CheckinMethod::GetRequest.as_str(), "get-request");
    }

    #[test]
    fn test_forbidden_response_is_blocked() {
        let attempt = AttemptResult::from_response(CheckinMethod::StandardPost, 403, None);
        assert!(attempt.blocked);

        let attempt = AttemptResult::from_response(CheckinMethod::StandardPost, 500, None);
        assert!(!attempt.blocked);
    }

    #[test]
    fn test_transport_failure_shape() {
        let attempt = AttemptResult::transport_failure(CheckinMethod::GetRequest, "Request timeout");
        assert_eq!(attempt.status, Some(500));
        assert!(attempt.blocked);
        assert!(attempt.body.is_none());
        assert_eq!(attempt.transport_error.as_deref(), Some("Request timeout"));
    }

    #[test]
    fn test_outcome_message_fallbacks() {
        let mut outcome = CheckinOutcome::from_error("123", "连接失败");
        assert_eq!(outcome.message().as_deref(), Some("连接失败"));
        assert_eq!(outcome.method_label(), "unknown");

        outcome.data = json!({"msg": "签到成功"});
        assert_eq!(outcome.message().as_deref(), Some("签到成功"));

        outcome.data = json!({"msg": ""});
        outcome.error = None;
        assert_eq!(outcome.message(), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("yes")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn test_outcome_serialization_skips_missing_error() {
        let mut outcome = CheckinOutcome::from_error("123", "boom");
        outcome.error = None;
        let json = outcome.to_json().unwrap();
        assert!(!json.contains("\"error\""));
        assert!(json.contains("\"user_id\": \"123\""));
    }
}
