//! Mirror Server - 账本镜像目录服务
//!
//! # 架构概述
//!
//! 本服务维护一个外部权威账本 (供应链合约) 与本地嵌入式数据库之间的
//! 镜像同步：
//!
//! - **账本优先**: 所有变更先写账本，确认后再写镜像；账本永远是唯一事实源
//! - **id 映射**: 账本 id 与镜像记录 id 之间维持严格 1:1 双射
//! - **事件收敛**: 其他账本客户端产生的变更通过事件流幂等地收敛到镜像
//!
//! # 模块结构
//!
//! ```text
//! mirror-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证
//! ├── api/           # HTTP 路由和处理器
//! ├── sync/          # 协调器、事件 applier、监听器
//! ├── db/            # 镜像数据库层
//! └── utils/         # 错误、日志
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod sync;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use core::server::{build_app, build_router};
pub use sync::{SyncCoordinator, SyncError};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(Some(&log_level), log_dir.as_deref());

    Ok(())
}
