use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use ledger_client::{HttpLedger, Ledger};

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::sync::SyncCoordinator;

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式镜像数据库 |
/// | ledger | Arc<dyn Ledger> | 权威账本句柄 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | coordinator | SyncCoordinator | 账本/镜像同步协调器 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式镜像数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 权威账本
    pub ledger: Arc<dyn Ledger>,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
    /// 同步协调器
    pub coordinator: SyncCoordinator,
}

impl ServerState {
    /// 手动构造服务器状态 (测试中配合 MemoryLedger / Mem 数据库使用)
    pub fn new(config: Config, db: Surreal<Db>, ledger: Arc<dyn Ledger>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let coordinator = SyncCoordinator::new(
            ledger.clone(),
            db.clone(),
            Duration::from_millis(config.ledger_timeout_ms),
        );

        Self {
            config,
            db,
            ledger,
            jwt_service,
            coordinator,
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 确保工作目录结构
    /// 2. 打开数据库 (work_dir/database/mirror.db)
    /// 3. 连接账本网关 (后台事件轮询随之启动)
    ///
    /// # Panics
    ///
    /// 工作目录或数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_service = DbService::new(&config.database_path())
            .await
            .expect("Failed to initialize database");

        let ledger: Arc<dyn Ledger> = Arc::new(HttpLedger::connect_with_timeout(
            config.ledger_gateway_url.clone(),
            Duration::from_millis(config.ledger_timeout_ms),
        ));

        Self::new(config.clone(), db_service.db, ledger)
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用。启动的任务：
    /// - 账本事件监听器 (镜像收敛)
    pub fn start_background_tasks(&self) {
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            crate::sync::listener::run(coordinator).await;
        });
    }

    /// 获取数据库实例
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取 JWT 服务
    pub fn jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 获取同步协调器
    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }
}
