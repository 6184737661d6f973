//! 签到回退链执行器
//!
//! 按固定顺序尝试 标准POST → 浏览器模拟POST → GET，
//! 遇到第一个未被拦截的结果即停止。

use crate::checkin::result::{AttemptResult, CheckinMethod, CheckinRequest};
use crate::checkin::transport::{describe_error, CheckinTransport, HttpRequest, HttpResponse};
use crate::config::CheckinSection;
use crate::error::{Result, TransportError};
use reqwest::{Method, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const ACCEPT_JSON: &str = "application/json, text/javascript, */*; q=0.01";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// 策略请求参数
#[derive(Debug, Clone)]
pub struct StrategySettings {
    /// 站点主页，用于获取cookies并作为Origin/Referer
    pub site_root: Url,
    /// 浏览器User-Agent
    pub user_agent: String,
    /// 单次请求超时
    pub timeout: Duration,
}

impl StrategySettings {
    /// 从签到配置构建
    pub fn from_config(config: &CheckinSection) -> Result<Self> {
        let site_root = Url::parse(&config.site_root)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.site_root, e)))?;

        Ok(Self {
            site_root,
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_secs(config.request_timeout_seconds),
        })
    }

    /// 站点Origin，不带结尾斜杠
    fn origin(&self) -> String {
        self.site_root.origin().ascii_serialization()
    }
}

/// 回退链执行器
pub struct FallbackExecutor {
    transport: Arc<dyn CheckinTransport>,
    settings: StrategySettings,
}

impl FallbackExecutor {
    pub fn new(transport: Arc<dyn CheckinTransport>, settings: StrategySettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// 执行回退链，返回最后一次尝试的结果
    pub async fn execute(&self, request: &CheckinRequest) -> AttemptResult {
        let [first, rest @ ..] = CheckinMethod::FALLBACK_ORDER;

        let mut attempt = self.attempt(first, request).await;

        for method in rest {
            if !attempt.blocked {
                break;
            }
            warn!("{} 请求被拦截，尝试 {} ...", attempt.method, method);
            attempt = self.attempt(method, request).await;
        }

        attempt
    }

    /// 执行单个策略，传输层异常转换为被拦截的合成结果
    pub async fn attempt(&self, method: CheckinMethod, request: &CheckinRequest) -> AttemptResult {
        debug!("执行签到策略: {}", method);

        match self.run_strategy(method, request).await {
            Ok(response) => {
                info!("{} 响应状态: {}", method, response.status);
                AttemptResult::from_response(method, response.status, response.into_body())
            }
            Err(e) => {
                let message = describe_error(&e);
                warn!("{} 请求失败: {}", method, message);
                AttemptResult::transport_failure(method, message)
            }
        }
    }

    async fn run_strategy(
        &self,
        method: CheckinMethod,
        request: &CheckinRequest,
    ) -> std::result::Result<HttpResponse, TransportError> {
        match method {
            CheckinMethod::StandardPost => {
                self.transport.execute(self.checkin_post(request, None)).await
            }
            CheckinMethod::BrowserSimulation => {
                let home = self.transport.execute(self.home_request()).await?;
                info!("主页访问状态: {}", home.status);

                let cookies = cookie_header(&home.set_cookies);
                debug!("获取到 {} 个cookie", home.set_cookies.len());

                let cookies = (!cookies.is_empty()).then_some(cookies);
                self.transport
                    .execute(self.checkin_post(request, cookies))
                    .await
            }
            CheckinMethod::GetRequest => self.transport.execute(self.checkin_get(request)).await,
        }
    }

    fn checkin_post(&self, request: &CheckinRequest, cookies: Option<String>) -> HttpRequest {
        let mut headers = vec![
            (
                "Content-Type",
                "application/x-www-form-urlencoded".to_string(),
            ),
            ("User-Agent", self.settings.user_agent.clone()),
            ("Accept", ACCEPT_JSON.to_string()),
            ("Accept-Language", ACCEPT_LANGUAGE.to_string()),
            ("Origin", self.settings.origin()),
            ("Referer", self.settings.site_root.to_string()),
            ("X-Requested-With", "XMLHttpRequest".to_string()),
        ];

        if let Some(cookies) = cookies {
            headers.push(("Cookie", cookies));
        }

        HttpRequest {
            method: Method::POST,
            url: request.endpoint.clone(),
            headers,
            form: Some(vec![("uid".to_string(), request.user_id.clone())]),
            timeout: self.settings.timeout,
        }
    }

    fn home_request(&self) -> HttpRequest {
        HttpRequest {
            method: Method::GET,
            url: self.settings.site_root.clone(),
            headers: self.browser_get_headers(),
            form: None,
            timeout: self.settings.timeout,
        }
    }

    fn checkin_get(&self, request: &CheckinRequest) -> HttpRequest {
        let mut url = request.endpoint.clone();
        url.query_pairs_mut().append_pair("uid", &request.user_id);

        HttpRequest {
            method: Method::GET,
            url,
            headers: self.browser_get_headers(),
            form: None,
            timeout: self.settings.timeout,
        }
    }

    fn browser_get_headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("User-Agent", self.settings.user_agent.clone()),
            ("Accept", ACCEPT_HTML.to_string()),
            ("Accept-Language", ACCEPT_LANGUAGE.to_string()),
            ("Cache-Control", "no-cache".to_string()),
        ]
    }
}

/// 由Set-Cookie头构建Cookie请求头：取每个cookie分号前的 name=value 部分
pub fn cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .filter_map(|cookie| cookie.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}
