//! Telegram通知发送器模块
//!
//! 通过Bot API的sendMessage接口发送签到结果

use crate::checkin::CheckinOutcome;
use crate::config::{NotificationSection, TelegramCredentials};
use crate::error::NotificationError;
use crate::notification::sender::{NotificationMessage, NotificationSender};
use crate::notification::template::{
    escape_html, HandlebarsTemplate, MessageTemplate, TemplateContext,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::FixedOffset;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, error, info};

/// Telegram通知发送器
pub struct TelegramSender {
    /// HTTP客户端
    client: Client,
    /// API地址
    api_base: String,
    /// 机器人凭据
    credentials: TelegramCredentials,
    /// 消息解析模式
    parse_mode: String,
    /// 消息模板
    template: Box<dyn MessageTemplate>,
    /// 运行环境描述
    run_environment: String,
    /// 消息中的本地时区
    utc_offset: FixedOffset,
    /// 消息标题中的站点名称
    site_name: String,
}

impl TelegramSender {
    /// 创建新的Telegram发送器
    ///
    /// # 参数
    /// * `credentials` - 机器人凭据
    /// * `config` - 通知配置
    /// * `run_environment` - 运行环境描述
    ///
    /// # 返回
    /// * `Result<Self>` - 发送器实例
    pub fn new(
        credentials: TelegramCredentials,
        config: &NotificationSection,
        run_environment: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("创建HTTP客户端失败")?;

        let template = match &config.message_template {
            Some(custom) => HandlebarsTemplate::new(custom)?,
            None => HandlebarsTemplate::default_checkin()?,
        };

        let utc_offset = FixedOffset::east_opt(config.utc_offset_hours * 3600).ok_or_else(|| {
            NotificationError::ConfigError(format!("无效的UTC偏移: {}", config.utc_offset_hours))
        })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            credentials,
            parse_mode: config.parse_mode.clone(),
            template: Box::new(template),
            run_environment: run_environment.into(),
            utc_offset,
            site_name: config.site_name.clone(),
        })
    }

    /// 渲染签到结果消息
    pub fn render_outcome(&self, outcome: &CheckinOutcome) -> Result<String> {
        let context = TemplateContext::from_outcome(outcome, &self.run_environment, self.utc_offset)
            .with_site_name(self.site_name.as_str());
        self.template.render(&context)
    }

    /// 构建sendMessage请求体
    fn build_message_body(&self, text: &str) -> Value {
        json!({
            "chat_id": self.credentials.chat_id,
            "text": text,
            "parse_mode": self.parse_mode,
        })
    }

    /// 发送文本到Telegram
    async fn send_text(&self, text: &str) -> Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_base, self.credentials.bot_token
        );
        debug!(
            "发送消息到Telegram: {}/bot{}/sendMessage",
            self.api_base,
            self.credentials.masked_token()
        );

        let response = self
            .client
            .post(&url)
            .json(&self.build_message_body(text))
            .send()
            .await
            .map_err(|e| NotificationError::SendError(e.without_url().to_string()))?;

        if response.status().is_success() {
            info!("Telegram通知发送成功");
            Ok(())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("Telegram通知发送失败: {} - {}", status, text);
            Err(NotificationError::SendError(format!("HTTP {}", status)).into())
        }
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send_outcome(&self, outcome: &CheckinOutcome) -> Result<()> {
        let text = self.render_outcome(outcome)?;
        self.send_text(&text).await
    }

    async fn send_message(&self, message: &NotificationMessage) -> Result<()> {
        let text = format!(
            "<b>{}</b>\n\n{}",
            escape_html(&message.title),
            escape_html(&message.content)
        );
        self.send_text(&text).await
    }

    async fn test_connection(&self) -> Result<()> {
        let test_message = NotificationMessage {
            title: "连接测试".to_string(),
            content: format!(
                "这是一条测试消息，用于验证Telegram通知是否正常。\n运行环境: {}",
                self.run_environment
            ),
        };
        self.send_message(&test_message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::CheckinMethod;
    use mockito::Matcher;
    use serde_json::json;

    fn credentials() -> TelegramCredentials {
        TelegramCredentials {
            bot_token: "123:token".to_string(),
            chat_id: "42".to_string(),
        }
    }

    fn sender(api_base: &str) -> TelegramSender {
        let config = NotificationSection {
            api_base: api_base.to_string(),
            ..NotificationSection::default()
        };
        TelegramSender::new(credentials(), &config, "本地").unwrap()
    }

    fn sample_outcome() -> CheckinOutcome {
        let mut outcome = CheckinOutcome::from_error("123", "");
        outcome.success = true;
        outcome.status = Some(200);
        outcome.data = json!({"msg": "ok"});
        outcome.method = Some(CheckinMethod::StandardPost);
        outcome.error = None;
        outcome
    }

    #[tokio::test]
    async fn test_send_outcome_posts_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:token/sendMessage")
            .match_body(Matcher::PartialJson(json!({
                "chat_id": "42",
                "parse_mode": "HTML",
            })))
            .with_status(200)
            .with_body(r#"{"ok":true,"result":{"message_id":1}}"#)
            .create_async()
            .await;

        let result = sender(&server.url()).send_outcome(&sample_outcome()).await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_failure_status_is_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:token/sendMessage")
            .with_status(401)
            .with_body(r#"{"ok":false,"description":"Unauthorized"}"#)
            .create_async()
            .await;

        let result = sender(&server.url()).send_outcome(&sample_outcome()).await;

        assert!(result.is_err());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreachable_api_is_error() {
        let result = sender("http://127.0.0.1:1")
            .send_outcome(&sample_outcome())
            .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_render_outcome() {
        let text = sender("https://api.telegram.org")
            .render_outcome(&sample_outcome())
            .unwrap();
        assert!(text.contains("🔧 方法: standard-post"));
        assert!(text.contains("💬 信息: ok"));
    }

    #[test]
    fn test_custom_template() {
        let config = NotificationSection {
            message_template: Some("{{user_id}}:{{status_text}}".to_string()),
            ..NotificationSection::default()
        };
        let sender = TelegramSender::new(credentials(), &config, "本地").unwrap();
        assert_eq!(sender.render_outcome(&sample_outcome()).unwrap(), "123:成功");
    }

    #[test]
    fn test_configured_site_name_in_title() {
        let config = NotificationSection {
            site_name: "mirror-site".to_string(),
            ..NotificationSection::default()
        };
        let sender = TelegramSender::new(credentials(), &config, "本地").unwrap();
        let text = sender.render_outcome(&sample_outcome()).unwrap();
        assert!(text.starts_with("✅ mirror-site 签到成功"));
    }

    #[test]
    fn test_message_body() {
        let body = sender("https://api.telegram.org").build_message_body("hi");
        assert_eq!(
            body,
            json!({"chat_id": "42", "text": "hi", "parse_mode": "HTML"})
        );
    }
}
