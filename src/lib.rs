//! natfreecloud 自动签到
//!
//! 这是一个用Rust编写的定时签到工具，支持：
//! - 标准POST、浏览器模拟POST、GET三级回退
//! - Cloudflare拦截识别
//! - Telegram通知
//! - 结构化日志记录

pub mod checkin;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod notification;

// 重新导出主要类型
pub use checkin::{CheckinMethod, CheckinOutcome, FallbackExecutor};
pub use config::{Config, FileConfig};
pub use error::CheckinError;

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
