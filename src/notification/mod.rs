//! 通知模块
//!
//! 提供Telegram通知和消息模板功能

pub mod sender;
pub mod telegram;
pub mod template;

// 重新导出主要类型
pub use sender::{NoOpSender, NotificationMessage, NotificationSender};
pub use telegram::TelegramSender;
pub use template::{HandlebarsTemplate, MessageTemplate, TemplateContext};
