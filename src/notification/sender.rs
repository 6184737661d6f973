//! 通知发送器模块
//!
//! 定义通知发送的trait和基础实现

use crate::checkin::CheckinOutcome;
use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// 通知消息结构
#[derive(Debug, Clone)]
pub struct NotificationMessage {
    /// 消息标题
    pub title: String,
    /// 消息内容
    pub content: String,
}

/// 通知发送器trait
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 发送签到结果
    ///
    /// # 参数
    /// * `outcome` - 签到结果
    ///
    /// # 返回
    /// * `Result<()>` - 发送结果
    async fn send_outcome(&self, outcome: &CheckinOutcome) -> Result<()>;

    /// 发送自定义消息
    async fn send_message(&self, message: &NotificationMessage) -> Result<()>;

    /// 测试连接
    async fn test_connection(&self) -> Result<()>;

    /// 是否已配置通知渠道
    fn is_configured(&self) -> bool {
        true
    }
}

/// 空的通知发送器实现（未配置通知时使用）
pub struct NoOpSender;

#[async_trait]
impl NotificationSender for NoOpSender {
    async fn send_outcome(&self, _outcome: &CheckinOutcome) -> Result<()> {
        info!("未配置Telegram通知");
        Ok(())
    }

    async fn send_message(&self, _message: &NotificationMessage) -> Result<()> {
        info!("未配置Telegram通知");
        Ok(())
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    fn is_configured(&self) -> bool {
        false
    }
}
