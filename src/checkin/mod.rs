//! 签到模块
//!
//! 提供签到回退链、响应分类和HTTP传输层

pub mod classifier;
pub mod executor;
pub mod result;
pub mod transport;

// 重新导出主要类型
pub use classifier::{classify, classify_body};
pub use executor::{FallbackExecutor, StrategySettings};
pub use result::{AttemptResult, CheckinMethod, CheckinOutcome, CheckinRequest, ResponseBody};
pub use transport::{CheckinTransport, HttpRequest, HttpResponse, ReqwestTransport};
