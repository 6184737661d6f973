//! 配置数据结构定义
//!
//! 定义配置文件结构、运行时配置和验证逻辑

use crate::notification::template::{
    HandlebarsTemplate, MessageTemplate, TemplateContext, DEFAULT_SITE_NAME,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 默认签到接口
pub const DEFAULT_ENDPOINT: &str =
    "https://nat.freecloud.ltd/addons?_plugin=19&_controller=index&_action=index";

/// 默认站点主页（浏览器模拟时用于获取cookies）
pub const DEFAULT_SITE_ROOT: &str = "https://nat.freecloud.ltd/";

/// 默认浏览器User-Agent
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 默认Telegram API地址
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// 配置文件结构，所有字段都有默认值
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileConfig {
    /// 签到配置
    #[serde(default)]
    pub checkin: CheckinSection,
    /// 通知配置
    #[serde(default)]
    pub notification: NotificationSection,
    /// 日志配置
    #[serde(default)]
    pub logging: LoggingSection,
}

/// 签到请求配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckinSection {
    /// 签到接口URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// 站点主页URL
    #[serde(default = "default_site_root")]
    pub site_root: String,
    /// 单次请求超时时间（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// 浏览器User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// 通知配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSection {
    /// Telegram API地址
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// 通知请求超时时间（秒）
    #[serde(default = "default_notify_timeout")]
    pub timeout_seconds: u64,
    /// 消息解析模式
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
    /// 消息中本地时间的UTC偏移（小时）
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,
    /// 消息标题中的站点名称
    #[serde(default = "default_site_name")]
    pub site_name: String,
    /// 自定义消息模板（Handlebars语法）
    #[serde(default)]
    pub message_template: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// 日志目录
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
    /// 日志文件名前缀
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// 是否输出到控制台
    #[serde(default = "default_console")]
    pub console: bool,
    /// 控制台和文件使用JSON行格式输出
    #[serde(default)]
    pub json: bool,
}

impl Default for CheckinSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            site_root: default_site_root(),
            request_timeout_seconds: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for NotificationSection {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_seconds: default_notify_timeout(),
            parse_mode: default_parse_mode(),
            utc_offset_hours: default_utc_offset(),
            site_name: default_site_name(),
            message_template: None,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: default_log_dir(),
            file_prefix: default_file_prefix(),
            console: default_console(),
            json: false,
        }
    }
}

// 默认值函数
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_site_root() -> String {
    DEFAULT_SITE_ROOT.to_string()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_api_base() -> String {
    DEFAULT_TELEGRAM_API_BASE.to_string()
}
fn default_notify_timeout() -> u64 {
    10
}
fn default_parse_mode() -> String {
    "HTML".to_string()
}
fn default_utc_offset() -> i32 {
    8 // Asia/Shanghai
}
fn default_site_name() -> String {
    DEFAULT_SITE_NAME.to_string()
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}
fn default_file_prefix() -> String {
    "checkin".to_string()
}
fn default_console() -> bool {
    true
}

/// Telegram机器人凭据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramCredentials {
    /// 机器人token
    pub bot_token: String,
    /// 聊天ID
    pub chat_id: String,
}

impl TelegramCredentials {
    /// 脱敏后的token，用于日志和配置展示
    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.bot_token.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}****{tail}")
    }
}

/// 单次运行的有效配置
#[derive(Debug, Clone)]
pub struct Config {
    /// 签到用户ID
    pub user_id: String,
    /// 签到配置
    pub checkin: CheckinSection,
    /// 通知配置
    pub notification: NotificationSection,
    /// 日志配置
    pub logging: LoggingSection,
    /// Telegram凭据，未配置时为None
    pub telegram: Option<TelegramCredentials>,
    /// 运行环境描述
    pub run_environment: String,
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &FileConfig) -> Result<(), String> {
    if config.checkin.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    if config.notification.timeout_seconds == 0 {
        return Err("通知超时时间不能为0".to_string());
    }

    for (name, url) in [
        ("checkin.endpoint", &config.checkin.endpoint),
        ("checkin.site_root", &config.checkin.site_root),
        ("notification.api_base", &config.notification.api_base),
    ] {
        let parsed = reqwest::Url::parse(url).map_err(|e| format!("{name} 不是有效的URL: {e}"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(format!("{name} 必须使用 http 或 https 协议"));
        }
    }

    if config.checkin.user_agent.trim().is_empty() {
        return Err("User-Agent不能为空".to_string());
    }

    if !(-23..=23).contains(&config.notification.utc_offset_hours) {
        return Err(format!(
            "UTC偏移超出范围: {}",
            config.notification.utc_offset_hours
        ));
    }

    if config.logging.file_prefix.trim().is_empty() {
        return Err("日志文件名前缀不能为空".to_string());
    }

    // 与发送时相同的严格模式试渲染一次，未知变量在这里就报错
    if let Some(template) = &config.notification.message_template {
        let compiled =
            HandlebarsTemplate::new(template).map_err(|e| format!("消息模板语法错误: {e}"))?;
        compiled
            .render(&TemplateContext::preview())
            .map_err(|e| format!("消息模板渲染失败: {e}"))?;
    }

    Ok(())
}
