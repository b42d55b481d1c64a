use crate::auth::JwtConfig;

/// 服务器配置 - 镜像节点的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/mirror | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | LEDGER_GATEWAY_URL | http://localhost:8545 | 账本网关地址 |
/// | LEDGER_TIMEOUT_MS | 30000 | 账本调用超时(毫秒) |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/mirror HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 账本网关 URL
    pub ledger_gateway_url: String,
    /// 账本调用超时 (毫秒)；超时映射为 Unavailable
    pub ledger_timeout_ms: u64,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别
    pub log_level: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/mirror".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            ledger_gateway_url: std::env::var("LEDGER_GATEWAY_URL")
                .unwrap_or_else(|_| "http://localhost:8545".into()),
            ledger_timeout_ms: std::env::var("LEDGER_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30_000),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }

    /// 数据库文件路径 (work_dir/database/mirror.db)
    pub fn database_path(&self) -> String {
        format!("{}/database/mirror.db", self.work_dir)
    }

    /// 日志目录 (work_dir/logs)
    pub fn log_dir(&self) -> String {
        format!("{}/logs", self.work_dir)
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(format!("{}/database", self.work_dir))?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
