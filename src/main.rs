//! natfreecloud 自动签到主程序入口

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    freecloud_checkin::core::app::main().await
}
