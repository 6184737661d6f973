//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// natfreecloud 自动签到工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "freecloud-checkin",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径（可选）",
        env = "CHECKIN_CONFIG"
    )]
    pub config: Option<PathBuf>,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        help = "日志级别",
        env = "CHECKIN_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// 日志目录
    #[arg(
        long,
        value_name = "DIR",
        help = "日志目录，覆盖配置文件",
        env = "CHECKIN_LOG_DIR"
    )]
    pub log_dir: Option<PathBuf>,

    /// 不写日志文件
    #[arg(long, help = "只输出到控制台，不写日志文件")]
    pub no_log_file: bool,

    /// 用户ID
    #[arg(
        long,
        value_name = "ID",
        help = "签到用户ID，优先于 MANUAL_USER_ID 和 UID 环境变量"
    )]
    pub uid: Option<String>,

    /// 子命令，缺省为 run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Args {
    /// 实际执行的子命令
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Debug, PartialEq)]
pub enum LogLevel {
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// 输出格式
#[derive(ValueEnum, Clone, Debug, PartialEq, Default)]
pub enum OutputFormat {
    /// 文本格式
    #[default]
    Text,
    /// JSON格式
    Json,
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// 执行签到并发送通知
    Run,

    /// 发送测试通知
    TestNotification,

    /// 验证并显示当前配置
    Validate {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}
