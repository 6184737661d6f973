//! 配置管理模块
//!
//! 提供配置文件解析、环境变量读取和验证功能

pub mod loader;
pub mod types;

// 重新导出主要类型
pub use loader::{
    resolve_config, resolve_run_environment, resolve_telegram, resolve_user_id, ConfigLoader,
    EnvSource, ProcessEnv, TomlConfigLoader,
};
pub use types::{
    validate_config, CheckinSection, Config, FileConfig, LoggingSection, NotificationSection,
    TelegramCredentials,
};
