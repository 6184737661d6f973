//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::checkin::{CheckinOutcome, CheckinTransport, ReqwestTransport};
use crate::cli::args::{Args, Commands, OutputFormat};
use crate::config::{
    resolve_run_environment, resolve_telegram, resolve_user_id, FileConfig, ProcessEnv,
};
use crate::core::runner::run_once;
use crate::error::{NotificationError, Result};
use crate::notification::{NotificationSender, TelegramSender};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args, config: &FileConfig) -> Result<()>;
}

/// 签到命令
pub struct RunCommand;

impl RunCommand {
    /// 执行签到，返回签到结果
    pub async fn run(&self, args: &Args, config: &FileConfig) -> Result<CheckinOutcome> {
        info!("=== natfreecloud 自动签到开始 ===");

        let transport: Arc<dyn CheckinTransport> = Arc::new(ReqwestTransport::new()?);
        let outcome = run_once(config.clone(), &ProcessEnv, args.uid.as_deref(), transport).await?;

        info!("=== 签到完成 ===");
        info!("最终结果: {}", outcome.to_json()?);

        Ok(outcome)
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args, _config: &FileConfig) -> Result<()> {
        if let Commands::Version { format } = args.command() {
            match format {
                OutputFormat::Json => {
                    let version_info = json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 配置验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args, config: &FileConfig) -> Result<()> {
        let format = match args.command() {
            Commands::Validate { format } => format,
            _ => OutputFormat::Text,
        };

        let summary = effective_config_summary(args, config);

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
            OutputFormat::Text => {
                println!("✅ 配置有效");
                println!("签到接口: {}", config.checkin.endpoint);
                println!("站点主页: {}", config.checkin.site_root);
                println!("请求超时: {}秒", config.checkin.request_timeout_seconds);
                println!("用户ID: {}", summary["user_id"].as_str().unwrap_or("未配置"));
                println!(
                    "Telegram: {}",
                    summary["telegram"]["bot_token"]
                        .as_str()
                        .map(|token| format!("已配置 (token: {token})"))
                        .unwrap_or_else(|| "未配置".to_string())
                );
                println!("日志目录: {}", config.logging.dir.display());
            }
        }

        Ok(())
    }
}

/// 汇总有效配置，token脱敏
fn effective_config_summary(args: &Args, config: &FileConfig) -> serde_json::Value {
    let env = ProcessEnv;
    let user_id = resolve_user_id(&env, args.uid.as_deref()).ok();
    let telegram = resolve_telegram(&env).map(|creds| {
        json!({
            "bot_token": creds.masked_token(),
            "chat_id": creds.chat_id,
        })
    });

    json!({
        "user_id": user_id,
        "telegram": telegram,
        "run_environment": resolve_run_environment(&env),
        "config": config,
    })
}

/// 测试通知命令
pub struct TestNotificationCommand;

#[async_trait]
impl Command for TestNotificationCommand {
    async fn execute(&self, _args: &Args, config: &FileConfig) -> Result<()> {
        let env = ProcessEnv;
        let credentials = resolve_telegram(&env).ok_or_else(|| {
            NotificationError::ConfigError("未配置 TG_BOT_TOKEN 或 TG_CHAT_ID".to_string())
        })?;

        let sender = TelegramSender::new(
            credentials,
            &config.notification,
            resolve_run_environment(&env),
        )?;

        println!("发送测试通知...");
        sender.test_connection().await?;
        println!("✅ 测试通知发送成功");

        Ok(())
    }
}
