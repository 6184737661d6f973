//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// 签到程序的主要错误类型
#[derive(Error, Debug)]
pub enum CheckinError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 传输层错误
    #[error("请求错误: {0}")]
    Transport(#[from] TransportError),

    /// 通知相关错误
    #[error("通知错误: {0}")]
    Notification(#[from] NotificationError),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 未配置用户ID
    #[error("未配置用户ID，请设置 UID 环境变量")]
    MissingUserId,

    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 传输层错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    /// HTTP客户端构建或请求错误
    #[error("HTTP请求失败: {0}")]
    RequestError(#[from] reqwest::Error),

    /// 超时错误
    #[error("请求超时")]
    Timeout,

    /// 无效的URL
    #[error("无效的URL: {0}")]
    InvalidUrl(String),
}

/// 通知错误类型
#[derive(Error, Debug)]
pub enum NotificationError {
    /// 发送失败
    #[error("通知发送失败: {0}")]
    SendError(String),

    /// 模板渲染错误
    #[error("模板渲染失败: {0}")]
    TemplateError(String),

    /// 配置错误
    #[error("通知配置错误: {0}")]
    ConfigError(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, CheckinError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_user_id_message() {
        let err: CheckinError = ConfigError::MissingUserId.into();
        assert_eq!(
            err.to_string(),
            "配置错误: 未配置用户ID，请设置 UID 环境变量"
        );
    }

    #[test]
    fn test_transport_timeout_message() {
        let err = CheckinError::from(TransportError::Timeout);
        assert!(err.to_string().contains("请求超时"));
    }
}
