//! 消息模板模块
//!
//! 使用Handlebars将签到结果渲染为通知文本

use crate::checkin::CheckinOutcome;
use crate::error::NotificationError;
use anyhow::Result;
use chrono::FixedOffset;
use handlebars::Handlebars;
use serde::Serialize;

const TEMPLATE_NAME: &str = "checkin";

/// 无返回信息时的提示
pub const NO_MESSAGE: &str = "无返回信息";

/// 默认站点名称
pub const DEFAULT_SITE_NAME: &str = "natfreecloud";

/// 模板上下文数据
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    /// 站点名称
    pub site_name: String,
    /// 成功/失败图标
    pub status_emoji: String,
    /// 状态文字：被拦截/成功/失败
    pub status_text: String,
    /// 用户ID
    pub user_id: String,
    /// HTTP状态码
    pub status_code: String,
    /// 签到方法
    pub method: String,
    /// 提示信息
    pub message: String,
    /// 本地时间
    pub local_time: String,
    /// 运行环境
    pub run_environment: String,
    /// 是否被拦截
    pub blocked: bool,
}

impl TemplateContext {
    /// 由签到结果构建模板上下文
    ///
    /// # 参数
    /// * `outcome` - 签到结果
    /// * `run_environment` - 运行环境描述
    /// * `offset` - 本地时间的时区偏移
    pub fn from_outcome(
        outcome: &CheckinOutcome,
        run_environment: &str,
        offset: FixedOffset,
    ) -> Self {
        let blocked = outcome.is_blocked();
        let status_text = if blocked {
            "被拦截"
        } else if outcome.success {
            "成功"
        } else {
            "失败"
        };

        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            status_emoji: if outcome.success { "✅" } else { "❌" }.to_string(),
            status_text: status_text.to_string(),
            user_id: outcome.user_id.clone(),
            status_code: outcome
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            method: outcome.method_label().to_string(),
            message: outcome.message().unwrap_or_else(|| NO_MESSAGE.to_string()),
            local_time: outcome
                .timestamp
                .with_timezone(&offset)
                .format("%Y/%m/%d %H:%M:%S")
                .to_string(),
            run_environment: run_environment.to_string(),
            blocked,
        }
    }

    /// 替换消息中的站点名称
    pub fn with_site_name(mut self, site_name: impl Into<String>) -> Self {
        self.site_name = site_name.into();
        self
    }

    /// 覆盖所有字段的示例上下文，用于在运行前试渲染自定义模板
    pub fn preview() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            status_emoji: "❌".to_string(),
            status_text: "被拦截".to_string(),
            user_id: "10000".to_string(),
            status_code: "403".to_string(),
            method: "get-request".to_string(),
            message: "IP被Cloudflare拦截".to_string(),
            local_time: "2024/01/01 08:00:00".to_string(),
            run_environment: "本地".to_string(),
            blocked: true,
        }
    }
}

/// 消息模板trait
pub trait MessageTemplate: Send + Sync {
    /// 渲染模板
    fn render(&self, context: &TemplateContext) -> Result<String>;
}

/// Handlebars模板
pub struct HandlebarsTemplate {
    registry: Handlebars<'static>,
}

impl HandlebarsTemplate {
    /// 编译模板，语法错误时返回错误
    ///
    /// # 参数
    /// * `template` - 模板字符串
    ///
    /// # 返回
    /// * `Result<Self>` - 模板实例
    pub fn new(template: &str) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(escape_html);
        registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| NotificationError::TemplateError(e.to_string()))?;

        Ok(Self { registry })
    }

    /// 使用默认签到模板
    pub fn default_checkin() -> Result<Self> {
        Self::new(&default_checkin_template())
    }
}

impl MessageTemplate for HandlebarsTemplate {
    fn render(&self, context: &TemplateContext) -> Result<String> {
        let rendered = self
            .registry
            .render(TEMPLATE_NAME, context)
            .map_err(|e| NotificationError::TemplateError(e.to_string()))?;
        Ok(rendered)
    }
}

/// 转义Telegram HTML模式中的保留字符
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// 默认的签到结果消息模板
pub fn default_checkin_template() -> String {
    "{{status_emoji}} {{site_name}} 签到{{status_text}}\n\n\
👤 用户ID: {{user_id}}\n\
📊 状态码: {{status_code}}\n\
🔧 方法: {{method}}\n\
💬 信息: {{message}}\n\
⏰ 时间: {{local_time}}\n\
🏃 运行环境: {{run_environment}}\n\
{{#if blocked}}\n⚠️ 请求被拦截，可能需要手动签到{{/if}}"
        .to_string()
}
