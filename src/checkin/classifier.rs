//! 响应分类
//!
//! 将最后一次尝试的原始响应归类为成功、业务失败或被边缘防护拦截

use crate::checkin::result::{is_truthy, AttemptResult, CheckinOutcome, ResponseBody};
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::info;
use uuid::Uuid;

/// 边缘防护拦截页面特征
pub const BLOCK_MARKERS: [&str; 2] = [
    "Sorry, you have been blocked",
    "Attention Required! | Cloudflare",
];

/// 被拦截时的提示信息
pub const BLOCKED_MESSAGE: &str = "IP被Cloudflare拦截";

/// 非JSON文本响应保留的字符数
pub const MESSAGE_PREVIEW_CHARS: usize = 200;

/// 文本是否为边缘防护拦截页面
pub fn is_challenge_page(text: &str) -> bool {
    BLOCK_MARKERS.iter().any(|marker| text.contains(marker))
}

/// 将响应体归类为结构化数据
pub fn classify_body(attempt: &AttemptResult) -> Value {
    let status = attempt.status.map(Value::from).unwrap_or(Value::Null);

    match &attempt.body {
        None => Value::Object(Map::new()),
        Some(ResponseBody::Text(text)) if is_challenge_page(text) => json!({
            "msg": BLOCKED_MESSAGE,
            "status": status,
            "blocked": true,
        }),
        Some(ResponseBody::Text(text)) => serde_json::from_str(text).unwrap_or_else(|_| {
            let preview: String = text.chars().take(MESSAGE_PREVIEW_CHARS).collect();
            json!({ "msg": preview, "status": status })
        }),
        Some(ResponseBody::Json(value)) => value.clone(),
    }
}

/// 生成最终签到结果：状态码为200且未被拦截才算成功
pub fn classify(attempt: &AttemptResult, user_id: &str) -> CheckinOutcome {
    let data = classify_body(attempt);

    match serde_json::to_string_pretty(&data) {
        Ok(pretty) => info!("签到响应: {}", pretty),
        Err(_) => info!("签到响应: {}", data),
    }

    let blocked = data.get("blocked").is_some_and(is_truthy);
    let success = attempt.status == Some(200) && !blocked;

    CheckinOutcome {
        run_id: Uuid::new_v4(),
        success,
        status: attempt.status,
        data,
        timestamp: Utc::now(),
        user_id: user_id.to_string(),
        method: Some(attempt.method),
        error: attempt.transport_error.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::result::CheckinMethod;

    fn text_attempt(status: u16, body: &str) -> AttemptResult {
        AttemptResult::from_response(
            CheckinMethod::StandardPost,
            status,
            Some(ResponseBody::Text(body.to_string())),
        )
    }

    #[test]
    fn test_challenge_page_blocked_for_any_status() {
        for status in [200, 403, 503] {
            let attempt = text_attempt(
                status,
                "<title>Attention Required! | Cloudflare</title>",
            );
            let outcome = classify(&attempt, "123");
            assert!(outcome.is_blocked());
            assert!(!outcome.success);
            assert_eq!(outcome.data["msg"], BLOCKED_MESSAGE);
            assert_eq!(outcome.data["status"], status);
        }
    }

    #[test]
    fn test_sorry_marker_blocked() {
        let attempt = text_attempt(200, "<h1>Sorry, you have been blocked</h1>");
        let outcome = classify(&attempt, "123");
        assert!(outcome.is_blocked());
        assert!(!outcome.success);
    }

    #[test]
    fn test_json_text_success() {
        let outcome = classify(&text_attempt(200, r#"{"msg":"ok"}"#), "123");
        assert!(outcome.success);
        assert_eq!(outcome.data, json!({"msg": "ok"}));
        assert_eq!(outcome.method, Some(CheckinMethod::StandardPost));
        assert_eq!(outcome.user_id, "123");
    }

    #[test]
    fn test_long_plain_text_truncated() {
        let body: String = "签".repeat(100) + &"a".repeat(400);
        assert_eq!(body.chars().count(), 500);

        let outcome = classify(&text_attempt(200, &body), "123");
        let expected: String = body.chars().take(200).collect();
        assert_eq!(outcome.data["msg"], Value::String(expected));
        assert_eq!(outcome.data["status"], 200);
        assert!(outcome.success);
    }

    #[test]
    fn test_structured_body_used_directly() {
        let attempt = AttemptResult::from_response(
            CheckinMethod::GetRequest,
            200,
            Some(ResponseBody::Json(json!({"msg": "今日已签到", "code": 1}))),
        );
        let outcome = classify(&attempt, "123");
        assert_eq!(outcome.data["code"], 1);
        assert!(outcome.success);
    }

    #[test]
    fn test_structured_blocked_flag_respected() {
        let attempt = AttemptResult::from_response(
            CheckinMethod::GetRequest,
            200,
            Some(ResponseBody::Json(json!({"blocked": true}))),
        );
        assert!(!classify(&attempt, "123").success);
    }

    #[test]
    fn test_absent_body_is_empty_object() {
        let attempt = AttemptResult::from_response(CheckinMethod::StandardPost, 200, None);
        let outcome = classify(&attempt, "123");
        assert_eq!(outcome.data, json!({}));
        assert!(outcome.success);
    }

    #[test]
    fn test_transport_failure_not_success() {
        let attempt = AttemptResult::transport_failure(CheckinMethod::GetRequest, "Request timeout");
        let outcome = classify(&attempt, "123");
        assert!(!outcome.success);
        assert_eq!(outcome.status, Some(500));
        assert_eq!(outcome.error.as_deref(), Some("Request timeout"));
        assert_eq!(outcome.message().as_deref(), Some("Request timeout"));
    }

    #[test]
    fn test_non_200_application_failure() {
        let outcome = classify(&text_attempt(404, "Not Found"), "123");
        assert!(!outcome.success);
        assert!(!outcome.is_blocked());
        assert_eq!(outcome.data["msg"], "Not Found");
    }
}
