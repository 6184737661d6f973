//! 配置加载器实现
//!
//! 提供TOML配置文件解析、环境变量替换以及运行时配置解析功能

use crate::config::types::{validate_config, Config, FileConfig, TelegramCredentials};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// 手动指定的用户ID（优先）
pub const ENV_MANUAL_USER_ID: &str = "MANUAL_USER_ID";
/// 默认用户ID
pub const ENV_USER_ID: &str = "UID";
/// Telegram机器人token
pub const ENV_TG_BOT_TOKEN: &str = "TG_BOT_TOKEN";
/// Telegram聊天ID
pub const ENV_TG_CHAT_ID: &str = "TG_CHAT_ID";
/// GitHub Actions标识
pub const ENV_GITHUB_ACTIONS: &str = "GITHUB_ACTIONS";

/// 环境变量来源
pub trait EnvSource: Send + Sync {
    /// 读取环境变量，不存在时返回None
    fn var(&self, key: &str) -> Option<String>;
}

/// 进程环境变量
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// 读取非空环境变量（去除首尾空白）
fn non_empty_var(env: &dyn EnvSource, key: &str) -> Option<String> {
    env.var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// 配置加载器trait，定义配置加载接口
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// 从文件加载配置
    ///
    /// # 参数
    /// * `path` - 配置文件路径
    ///
    /// # 返回
    /// * `Result<FileConfig>` - 加载的配置或错误
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<FileConfig>;

    /// 从字符串加载配置
    async fn load_from_string(&self, content: &str) -> Result<FileConfig>;

    /// 验证配置
    fn validate(&self, config: &FileConfig) -> Result<()>;
}

/// TOML配置加载器实现
#[derive(Clone)]
pub struct TomlConfigLoader {
    /// 是否启用环境变量替换
    enable_env_substitution: bool,
    /// 环境变量来源
    env: Arc<dyn EnvSource>,
}

impl TomlConfigLoader {
    /// 创建新的TOML配置加载器，从进程环境读取变量
    pub fn new(enable_env_substitution: bool) -> Self {
        Self::with_env(enable_env_substitution, Arc::new(ProcessEnv))
    }

    /// 使用指定的环境变量来源创建加载器
    pub fn with_env(enable_env_substitution: bool, env: Arc<dyn EnvSource>) -> Self {
        Self {
            enable_env_substitution,
            env,
        }
    }

    /// 替换字符串中的 ${VAR_NAME} 环境变量
    fn substitute_env_vars(&self, content: &str) -> Result<String> {
        if !self.enable_env_substitution {
            return Ok(content.to_string());
        }

        let env_var_regex = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .map_err(|e| ConfigError::ParseError(format!("正则表达式错误: {}", e)))?;

        let mut result = content.to_string();

        for captures in env_var_regex.captures_iter(content) {
            let full_match = &captures[0];
            let var_name = &captures[1];

            match self.env.var(var_name) {
                Some(value) => {
                    result = result.replace(full_match, &value);
                }
                None => {
                    return Err(ConfigError::EnvVarError {
                        var: var_name.to_string(),
                    }
                    .into());
                }
            }
        }

        Ok(result)
    }

    fn parse_toml(&self, content: &str) -> Result<FileConfig> {
        let processed_content = self.substitute_env_vars(content)?;

        let config: FileConfig = toml::from_str(&processed_content)
            .map_err(|e| ConfigError::ParseError(format!("TOML解析失败: {}", e)))?;

        Ok(config)
    }
}

#[async_trait]
impl ConfigLoader for TomlConfigLoader {
    async fn load_from_file<P: AsRef<Path> + Send>(&self, path: P) -> Result<FileConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ParseError(format!("读取文件失败: {}", e)))?;

        let config = self.parse_toml(&content)?;
        self.validate(&config)?;

        log::debug!("成功加载配置文件: {}", path.display());

        Ok(config)
    }

    async fn load_from_string(&self, content: &str) -> Result<FileConfig> {
        let config = self.parse_toml(content)?;
        self.validate(&config)?;
        Ok(config)
    }

    fn validate(&self, config: &FileConfig) -> Result<()> {
        validate_config(config).map_err(|e| ConfigError::ValidationError(e).into())
    }
}

/// 解析签到用户ID
///
/// 优先级：命令行参数 > MANUAL_USER_ID > UID，空值视为未设置
pub fn resolve_user_id(env: &dyn EnvSource, cli_override: Option<&str>) -> Result<String> {
    cli_override
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| non_empty_var(env, ENV_MANUAL_USER_ID))
        .or_else(|| non_empty_var(env, ENV_USER_ID))
        .ok_or_else(|| ConfigError::MissingUserId.into())
}

/// 解析Telegram凭据，token和chat id必须同时存在
pub fn resolve_telegram(env: &dyn EnvSource) -> Option<TelegramCredentials> {
    let bot_token = non_empty_var(env, ENV_TG_BOT_TOKEN)?;
    let chat_id = non_empty_var(env, ENV_TG_CHAT_ID)?;
    Some(TelegramCredentials { bot_token, chat_id })
}

/// 运行环境描述
pub fn resolve_run_environment(env: &dyn EnvSource) -> String {
    match env.var(ENV_GITHUB_ACTIONS).as_deref() {
        Some("true") => "GitHub Actions".to_string(),
        _ => "本地".to_string(),
    }
}

/// 由配置文件和环境变量组合出运行时配置
///
/// # 参数
/// * `file` - 已验证的文件配置
/// * `env` - 环境变量来源
/// * `uid_override` - 命令行指定的用户ID
///
/// # 返回
/// * `Result<Config>` - 缺少用户ID时返回配置错误
pub fn resolve_config(
    file: FileConfig,
    env: &dyn EnvSource,
    uid_override: Option<&str>,
) -> Result<Config> {
    let user_id = resolve_user_id(env, uid_override)?;

    Ok(Config {
        user_id,
        checkin: file.checkin,
        notification: file.notification,
        logging: file.logging,
        telegram: resolve_telegram(env),
        run_environment: resolve_run_environment(env),
    })
}
