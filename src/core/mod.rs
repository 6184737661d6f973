//! 核心模块
//!
//! 包含应用程序的生命周期管理和单次签到运行逻辑

pub mod app;
pub mod runner;

// 重新导出主要类型
pub use app::execute_command;
pub use runner::{exit_code, run_once, CheckinApp};
