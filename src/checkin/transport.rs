//! HTTP传输层
//!
//! 签到策略通过 `CheckinTransport` 发送请求，便于替换为测试实现

use crate::checkin::result::ResponseBody;
use crate::error::{Result, TransportError};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, SET_COOKIE};
use reqwest::{Client, Method, Url};
use std::time::Duration;
use tokio::time::timeout;

/// 待发送的HTTP请求
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP方法
    pub method: Method,
    /// 请求地址
    pub url: Url,
    /// 请求头
    pub headers: Vec<(&'static str, String)>,
    /// 表单请求体
    pub form: Option<Vec<(String, String)>>,
    /// 超时时间
    pub timeout: Duration,
}

impl HttpRequest {
    /// 按名称查找请求头（不区分大小写）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// 收到的HTTP响应
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// 状态码
    pub status: u16,
    /// Content-Type
    pub content_type: Option<String>,
    /// 所有Set-Cookie头
    pub set_cookies: Vec<String>,
    /// 响应体文本
    pub body: String,
}

impl HttpResponse {
    /// 转换为响应体：声明为JSON且可解析时为结构化数据，否则为文本，空响应体为None
    pub fn into_body(self) -> Option<ResponseBody> {
        if self.body.is_empty() {
            return None;
        }

        let is_json = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));

        if is_json {
            if let Ok(value) = serde_json::from_str(&self.body) {
                return Some(ResponseBody::Json(value));
            }
        }

        Some(ResponseBody::Text(self.body))
    }
}

/// 签到传输层trait
#[async_trait]
pub trait CheckinTransport: Send + Sync {
    /// 发送请求，接受任意状态码，仅在传输层失败时返回错误
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

/// 基于reqwest的传输层实现
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// 创建新的传输层
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(TransportError::RequestError)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl CheckinTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(request.method.clone(), request.url.clone());

        for (name, value) in &request.headers {
            builder = builder.header(*name, value.as_str());
        }

        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let set_cookies = response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(str::to_string)
                .collect();
            let body = response.text().await?;

            Ok::<_, reqwest::Error>(HttpResponse {
                status,
                content_type,
                set_cookies,
                body,
            })
        };

        match timeout(request.timeout, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(TransportError::RequestError(e)),
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

/// 格式化传输错误信息，使其更加清晰易读
pub fn describe_error(error: &TransportError) -> String {
    let error = match error {
        TransportError::RequestError(e) => e,
        TransportError::Timeout => return "Request timeout".to_string(),
        TransportError::InvalidUrl(url) => return format!("Invalid URL: {url}"),
    };

    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        "Connection refused".to_string()
    } else if error.is_builder() {
        "Invalid request".to_string()
    } else if error.is_decode() || error.is_body() {
        "Response decode error".to_string()
    } else {
        let error_str = error.to_string();
        if error_str.contains("dns") || error_str.contains("DNS") {
            "DNS resolution failed".to_string()
        } else if error_str.contains("certificate")
            || error_str.contains("tls")
            || error_str.contains("ssl")
        {
            "SSL/TLS certificate error".to_string()
        } else {
            format!("Request failed: {}", error_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(content_type: Option<&str>, body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            content_type: content_type.map(str::to_string),
            set_cookies: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_json_content_type_is_structured() {
        let body = response(Some("application/json; charset=utf-8"), r#"{"msg":"ok"}"#).into_body();
        assert_eq!(body, Some(ResponseBody::Json(json!({"msg": "ok"}))));
    }

    #[test]
    fn test_html_stays_textual() {
        let body = response(Some("text/html"), r#"{"msg":"ok"}"#).into_body();
        assert_eq!(body, Some(ResponseBody::Text(r#"{"msg":"ok"}"#.to_string())));
    }

    #[test]
    fn test_invalid_json_with_json_content_type_is_text() {
        let body = response(Some("application/json"), "oops").into_body();
        assert_eq!(body, Some(ResponseBody::Text("oops".to_string())));
    }

    #[test]
    fn test_empty_body_is_absent() {
        assert_eq!(response(Some("text/html"), "").into_body(), None);
    }

    #[test]
    fn test_describe_timeout() {
        assert_eq!(describe_error(&TransportError::Timeout), "Request timeout");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let transport = ReqwestTransport::new().unwrap();
        let request = HttpRequest {
            method: Method::GET,
            url: Url::parse("http://127.0.0.1:1/").unwrap(),
            headers: Vec::new(),
            form: None,
            timeout: Duration::from_secs(5),
        };

        let err = transport.execute(request).await.unwrap_err();
        let message = describe_error(&err);
        assert!(
            message.contains("Connection refused") || message.contains("Request failed"),
            "unexpected message: {message}"
        );
    }

    #[tokio::test]
    async fn test_collects_set_cookie_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_header("set-cookie", "PHPSESSID=abc; path=/")
            .with_body("<html></html>")
            .create_async()
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let request = HttpRequest {
            method: Method::GET,
            url: Url::parse(&server.url()).unwrap(),
            headers: vec![("Cache-Control", "no-cache".to_string())],
            form: None,
            timeout: Duration::from_secs(5),
        };

        let response = transport.execute(request).await.unwrap();
        mock.assert_async().await;
        assert_eq!(response.status, 200);
        assert_eq!(response.set_cookies, vec!["PHPSESSID=abc; path=/".to_string()]);
        assert_eq!(response.body, "<html></html>");
    }

    /// 接受连接但从不响应的本地服务器
    async fn silent_server() -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let transport = ReqwestTransport::new().unwrap();
        let request = HttpRequest {
            method: Method::POST,
            url: silent_server().await.join("checkin").unwrap(),
            headers: Vec::new(),
            form: Some(vec![("uid".to_string(), "123".to_string())]),
            timeout: Duration::from_millis(100),
        };

        let started = std::time::Instant::now();
        let err = transport.execute(request).await.unwrap_err();

        assert!(matches!(err, TransportError::Timeout), "unexpected error: {err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
