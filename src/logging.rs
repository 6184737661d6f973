//! 日志系统模块
//!
//! 控制台输出加按日期滚动的日志文件，每次运行显式初始化一次

use chrono::{NaiveDate, Utc};
use log::LevelFilter;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer, Registry};

/// 日志配置结构
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: LevelFilter,
    /// 是否输出到控制台
    pub console: bool,
    /// 控制台和文件都使用JSON行格式
    pub json_format: bool,
    /// 日志目录，为None时不写文件
    pub log_dir: Option<PathBuf>,
    /// 日志文件名前缀
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            console: true,
            json_format: false,
            log_dir: Some(PathBuf::from("logs")),
            file_prefix: "checkin".to_string(),
        }
    }
}

/// 按UTC日期滚动的日志文件：`<dir>/<prefix>-YYYY-MM-DD.log`
#[derive(Debug)]
pub struct DailyFileWriter {
    dir: PathBuf,
    prefix: String,
    current: Mutex<Option<(NaiveDate, File)>>,
}

impl DailyFileWriter {
    /// 创建写入器，目录不存在时自动创建
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let writer = Self {
            dir,
            prefix: prefix.into(),
            current: Mutex::new(None),
        };
        // 提前打开当天文件，尽早暴露权限问题
        writer.write_on(Utc::now().date_naive(), b"")?;
        Ok(writer)
    }

    /// 指定日期对应的日志文件路径
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{}-{}.log", self.prefix, date.format("%Y-%m-%d")))
    }

    /// 当天的日志文件路径
    pub fn current_path(&self) -> PathBuf {
        self.path_for(Utc::now().date_naive())
    }

    fn open(&self, date: NaiveDate) -> io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(date))
    }

    /// 写入指定日期的文件，日期变化时切换文件
    fn write_on(&self, date: NaiveDate, buf: &[u8]) -> io::Result<usize> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| io::Error::other("日志文件锁已损坏"))?;

        let needs_roll = !matches!(current.as_ref(), Some((open_date, _)) if *open_date == date);
        if needs_roll {
            *current = Some((date, self.open(date)?));
        }

        match current.as_mut() {
            Some((_, file)) => file.write(buf),
            None => Ok(0),
        }
    }
}

impl Write for &DailyFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_on(Utc::now().date_naive(), buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| io::Error::other("日志文件锁已损坏"))?;
        match current.as_mut() {
            Some((_, file)) => file.flush(),
            None => Ok(()),
        }
    }
}

/// 日志系统
pub struct LoggingSystem {
    file_writer: Option<Arc<DailyFileWriter>>,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// # 参数
    /// * `config` - 日志配置
    ///
    /// # 返回
    /// * `Result<LoggingSystem, anyhow::Error>` - 初始化结果
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let file_writer = match &config.log_dir {
            Some(dir) => Some(Arc::new(
                DailyFileWriter::new(dir, config.file_prefix.clone())
                    .map_err(|e| anyhow::anyhow!("创建日志目录失败: {}", e))?,
            )),
            None => None,
        };

        Self::init_log_tracer();
        Self::init_tracing_subscriber(&config, file_writer.clone())?;

        Ok(Self { file_writer })
    }

    /// 初始化 LogTracer（log crate 到 tracing 的桥接），重复初始化时忽略
    fn init_log_tracer() {
        if tracing_log::LogTracer::init().is_err() {
            tracing::debug!("LogTracer已经初始化过了");
        }
    }

    /// 构建并安装 tracing subscriber
    fn init_tracing_subscriber(
        config: &LogConfig,
        file_writer: Option<Arc<DailyFileWriter>>,
    ) -> anyhow::Result<()> {
        let env_filter = EnvFilter::from_default_env()
            .add_directive(Self::convert_level_to_directive(config.level));

        let layers = Self::build_layers(config, file_writer);
        let subscriber = registry().with(layers).with(env_filter);

        match tracing::subscriber::set_global_default(subscriber) {
            Ok(()) => {
                tracing::debug!("日志配置: {:?}", config);
                Ok(())
            }
            Err(_) => {
                // 同一进程内重复初始化（例如测试），沿用已有的subscriber
                tracing::debug!("日志系统已经初始化过了");
                Ok(())
            }
        }
    }

    /// 构建控制台和文件输出层
    fn build_layers(
        config: &LogConfig,
        file_writer: Option<Arc<DailyFileWriter>>,
    ) -> Vec<Box<dyn Layer<Registry> + Send + Sync>> {
        let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

        if config.console {
            let console = if config.json_format {
                fmt::layer()
                    .json()
                    .with_timer(fmt::time::ChronoLocal::rfc_3339())
                    .boxed()
            } else {
                fmt::layer()
                    .with_timer(fmt::time::ChronoLocal::rfc_3339())
                    .with_target(false)
                    .boxed()
            };
            layers.push(console);
        }

        if let Some(writer) = file_writer {
            let file = if config.json_format {
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_timer(fmt::time::ChronoLocal::rfc_3339())
                    .with_ansi(false)
                    .boxed()
            } else {
                fmt::layer()
                    .with_writer(writer)
                    .with_timer(fmt::time::ChronoLocal::rfc_3339())
                    .with_ansi(false)
                    .with_target(false)
                    .boxed()
            };
            layers.push(file);
        }

        layers
    }

    /// 将 log::LevelFilter 转换为 tracing 的指令
    fn convert_level_to_directive(level: LevelFilter) -> tracing_subscriber::filter::Directive {
        use tracing_subscriber::filter::{Directive, LevelFilter as TracingLevel};
        let level = match level {
            LevelFilter::Off => TracingLevel::OFF,
            LevelFilter::Error => TracingLevel::ERROR,
            LevelFilter::Warn => TracingLevel::WARN,
            LevelFilter::Info => TracingLevel::INFO,
            LevelFilter::Debug => TracingLevel::DEBUG,
            LevelFilter::Trace => TracingLevel::TRACE,
        };
        Directive::from(level)
    }

    /// 当天日志文件路径（未启用文件日志时为None）
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.file_writer.as_ref().map(|w| w.current_path())
    }
}
