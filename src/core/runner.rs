//! 签到运行器
//!
//! 串联回退链、响应分类和通知，一次运行只产生一个签到结果

use crate::checkin::{
    classify, CheckinOutcome, CheckinRequest, CheckinTransport, FallbackExecutor,
    StrategySettings,
};
use crate::config::{resolve_config, Config, EnvSource, FileConfig};
use crate::error::{Result, TransportError};
use crate::notification::{NoOpSender, NotificationSender, TelegramSender};
use reqwest::Url;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 单次签到运行器
pub struct CheckinApp {
    executor: FallbackExecutor,
    notifier: Arc<dyn NotificationSender>,
    request: CheckinRequest,
}

impl CheckinApp {
    /// 创建运行器
    ///
    /// # 参数
    /// * `transport` - HTTP传输层
    /// * `notifier` - 通知发送器
    /// * `config` - 运行时配置
    pub fn new(
        transport: Arc<dyn CheckinTransport>,
        notifier: Arc<dyn NotificationSender>,
        config: &Config,
    ) -> Result<Self> {
        let endpoint = Url::parse(&config.checkin.endpoint).map_err(|e| {
            TransportError::InvalidUrl(format!("{}: {}", config.checkin.endpoint, e))
        })?;
        let settings = StrategySettings::from_config(&config.checkin)?;

        Ok(Self {
            executor: FallbackExecutor::new(transport, settings),
            notifier,
            request: CheckinRequest::new(config.user_id.clone(), endpoint),
        })
    }

    /// 执行签到并发送通知
    pub async fn run(&self) -> CheckinOutcome {
        info!("开始签到，用户ID: {}", self.request.user_id);

        let attempt = self.executor.execute(&self.request).await;
        let outcome = classify(&attempt, &self.request.user_id);

        notify_outcome(self.notifier.as_ref(), &outcome).await;
        outcome
    }
}

/// 发送签到结果通知，失败只记录日志
pub async fn notify_outcome(notifier: &dyn NotificationSender, outcome: &CheckinOutcome) {
    if let Err(e) = notifier.send_outcome(outcome).await {
        error!("发送Telegram通知失败: {}", e);
    }
}

/// 根据配置选择通知发送器
pub fn build_notifier(config: &Config) -> Arc<dyn NotificationSender> {
    let Some(credentials) = config.telegram.clone() else {
        return Arc::new(NoOpSender);
    };

    match TelegramSender::new(credentials, &config.notification, config.run_environment.clone()) {
        Ok(sender) => Arc::new(sender),
        Err(e) => {
            warn!("初始化Telegram通知失败，跳过通知: {}", e);
            Arc::new(NoOpSender)
        }
    }
}

/// 记录运行环境信息
fn log_environment(config: &Config) {
    info!("环境信息:");
    info!("- 程序版本: {} v{}", crate::APP_NAME, crate::VERSION);
    info!("- 运行环境: {}", config.run_environment);
    info!("- 用户ID: {}", config.user_id);
    info!(
        "- Telegram配置: {}",
        if config.telegram.is_some() {
            "已配置"
        } else {
            "未配置"
        }
    );
}

/// 完成一次签到：解析配置 → 回退链 → 分类 → 通知
///
/// 缺少用户ID时在发出任何HTTP请求前返回配置错误。
///
/// # 参数
/// * `file` - 已验证的文件配置
/// * `env` - 环境变量来源
/// * `uid_override` - 命令行指定的用户ID
/// * `transport` - HTTP传输层
///
/// # 返回
/// * `Result<CheckinOutcome>` - 签到结果
pub async fn run_once(
    file: FileConfig,
    env: &dyn EnvSource,
    uid_override: Option<&str>,
    transport: Arc<dyn CheckinTransport>,
) -> Result<CheckinOutcome> {
    let config = resolve_config(file, env, uid_override)?;
    log_environment(&config);

    let notifier = build_notifier(&config);

    let app = match CheckinApp::new(transport, Arc::clone(&notifier), &config) {
        Ok(app) => app,
        Err(e) => {
            error!("签到过程中出错: {}", e);
            let outcome = CheckinOutcome::from_error(config.user_id.clone(), e.to_string());
            notify_outcome(notifier.as_ref(), &outcome).await;
            return Ok(outcome);
        }
    };

    Ok(app.run().await)
}

/// 进程退出码：签到成功为0，其余为1
pub fn exit_code(result: &Result<CheckinOutcome>) -> i32 {
    match result {
        Ok(outcome) if outcome.success => 0,
        _ => 1,
    }
}
