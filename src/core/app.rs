//! 应用程序核心逻辑
//!
//! 包含主函数、命令执行和应用程序生命周期管理

use crate::cli::args::{Args, Commands};
use crate::cli::commands::{
    Command, RunCommand, TestNotificationCommand, ValidateCommand, VersionCommand,
};
use crate::config::{ConfigLoader, FileConfig, LoggingSection, TomlConfigLoader};
use crate::core::runner::exit_code;
use crate::logging::{LogConfig, LoggingSystem};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::{error, info};

/// 当前目录下的默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "checkin.toml";

/// 应用程序主函数
pub async fn main() -> Result<()> {
    let args = Args::parse();

    // 配置文件决定日志目录，加载失败时先用默认日志配置记录错误
    let loaded = load_file_config(&args).await;
    let logging_section = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();

    let logging_system = LoggingSystem::setup_logging(build_log_config(&args, &logging_section))
        .context("初始化日志系统失败")?;

    info!("{} v{} 启动", crate::APP_NAME, crate::VERSION);
    if let Some(path) = logging_system.log_file_path() {
        info!("日志文件: {}", path.display());
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!("加载配置失败: {}", e);
            std::process::exit(1);
        }
    };

    let code = execute_command(&args, &config).await;
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}

/// 加载配置文件：显式指定的路径必须存在，否则尝试当前目录的默认文件
pub async fn load_file_config(args: &Args) -> crate::error::Result<FileConfig> {
    let loader = TomlConfigLoader::new(true);

    match &args.config {
        Some(path) => loader.load_from_file(path).await,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            loader.load_from_file(DEFAULT_CONFIG_FILE).await
        }
        None => Ok(FileConfig::default()),
    }
}

/// 由命令行参数和配置文件构建日志配置
pub fn build_log_config(args: &Args, logging: &LoggingSection) -> LogConfig {
    let log_dir = if args.no_log_file {
        None
    } else {
        Some(
            args.log_dir
                .clone()
                .unwrap_or_else(|| logging.dir.clone()),
        )
    };

    LogConfig {
        level: args.log_level.clone().into(),
        console: logging.console,
        json_format: logging.json,
        log_dir,
        file_prefix: logging.file_prefix.clone(),
    }
}

/// 执行CLI命令，返回进程退出码
pub async fn execute_command(args: &Args, config: &FileConfig) -> i32 {
    let command: Box<dyn Command> = match args.command() {
        Commands::Run => {
            let result = RunCommand.run(args, config).await;
            if let Err(e) = &result {
                error!("主函数执行失败: {}", e);
            }
            return exit_code(&result);
        }
        Commands::TestNotification => Box::new(TestNotificationCommand),
        Commands::Validate { .. } => Box::new(ValidateCommand),
        Commands::Version { .. } => Box::new(VersionCommand),
    };

    match command.execute(args, config).await {
        Ok(()) => 0,
        Err(e) => {
            error!("命令执行失败: {}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_log_config_overrides() {
        let args = Args::try_parse_from(["freecloud-checkin", "--log-dir", "/tmp/override"]).unwrap();
        let config = build_log_config(&args, &LoggingSection::default());
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/override")));
        assert_eq!(config.file_prefix, "checkin");
        assert!(!config.json_format);

        let args = Args::try_parse_from(["freecloud-checkin", "--no-log-file"]).unwrap();
        let config = build_log_config(&args, &LoggingSection::default());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_build_log_config_defaults_to_section() {
        let args = Args::try_parse_from(["freecloud-checkin"]).unwrap();
        let section = LoggingSection {
            dir: PathBuf::from("var/logs"),
            file_prefix: "nat".to_string(),
            console: false,
            json: true,
        };
        let config = build_log_config(&args, &section);
        assert_eq!(config.log_dir, Some(PathBuf::from("var/logs")));
        assert!(!config.console);
        assert!(config.json_format);
        assert_eq!(config.file_prefix, "nat");
    }

    #[tokio::test]
    async fn test_missing_explicit_config_file() {
        let args =
            Args::try_parse_from(["freecloud-checkin", "--config", "/nonexistent/checkin.toml"])
                .unwrap();
        assert!(load_file_config(&args).await.is_err());
    }
}
