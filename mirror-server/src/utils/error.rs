//! 统一错误处理
//!
//! 提供应用级错误类型和响应结构：
//! - [`AppError`] - 应用错误枚举
//! - [`AppResponse`] - API 响应结构
//!
//! # 错误码规范
//!
//! | 前缀 | 分类 | 示例 |
//! |------|------|------|
//! | E3xxx | 认证令牌错误 | E3002 无效令牌 |
//! | E4xxx | 同步/账本错误 | E4001 交易回滚 |
//! | E9xxx | 系统错误 | E9002 数据库错误 |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ledger_client::LedgerError;
use serde::Serialize;
use tracing::error;

/// API 统一响应结构
///
/// ```json
/// {
///   "code": "E0000",
///   "message": "Success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// 错误码 (E0000 表示成功)
    pub code: String,
    /// 消息
    pub message: String,
    /// 响应数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 认证错误 (4xx) ==========
    #[error("Authentication required")]
    /// 未登录 (401)
    Unauthorized,

    #[error("Token expired")]
    /// 令牌过期 (401)
    TokenExpired,

    #[error("Invalid token")]
    /// 无效令牌 (401)
    InvalidToken,

    #[error("Permission denied: {0}")]
    /// 无权限 (403)
    Forbidden(String),

    // ========== 业务逻辑错误 (4xx) ==========
    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    #[error("Resource already exists: {0}")]
    /// 资源冲突 (409)
    Conflict(String),

    #[error("Validation failed: {0}")]
    /// 验证失败 (400)
    Validation(String),

    #[error("Invalid request: {0}")]
    /// 无效请求 (400)
    Invalid(String),

    // ========== 账本/同步错误 ==========
    #[error("Transaction reverted: {0}")]
    /// 账本交易回滚 (422) - 不写镜像
    LedgerReverted(String),

    #[error("No id mapping for ledger id {0}")]
    /// 映射表缺失 (409) - 操作部分生效
    MappingMiss(u64),

    #[error("Mirror write failed after ledger confirmation: {0}")]
    /// 账本已确认但镜像写入失败 (500) - 已知不一致，不回滚
    MirrorWrite(String),

    #[error("Ledger unavailable: {0}")]
    /// 账本不可达/超时 (503)
    LedgerUnavailable(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Database error: {0}")]
    /// 数据库错误 (500)
    Database(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Authentication errors (401)
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "E3001", "Please login first"),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "E3003", "Token expired"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "E3002", "Invalid token"),

            // Authorization errors (403)
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "E2001", msg.as_str()),

            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.as_str()),

            // Conflict (409)
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E0004", msg.as_str()),

            // Validation (400)
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.as_str()),

            // Invalid request (400)
            AppError::Invalid(msg) => (StatusCode::BAD_REQUEST, "E0006", msg.as_str()),

            // Reverted transaction (422): the ledger rejected it, no
            // mirror write happened
            AppError::LedgerReverted(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "E4001", msg.as_str())
            }

            // Mapping miss (409): the two stores disagree about this id
            AppError::MappingMiss(_) => (
                StatusCode::CONFLICT,
                "E4002",
                "Mirror mapping missing for ledger id",
            ),

            // Mirror write failure (500): ledger confirmed, mirror did not
            AppError::MirrorWrite(msg) => {
                error!(target: "sync", error = %msg, "Mirror write failed after confirmation");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E4003",
                    "Mirror store update failed; ledger state is authoritative",
                )
            }

            // Ledger unreachable (503)
            AppError::LedgerUnavailable(msg) => {
                error!(target: "ledger", error = %msg, "Ledger unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, "E4004", "Ledger unavailable")
            }

            // Database errors (500)
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "E9002", "Database error")
            }

            // Internal errors (500)
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error",
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message: message.to_string(),
            data: None,
        });

        (status, body).into_response()
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::NotFound(msg) => AppError::NotFound(msg),
            LedgerError::Reverted(msg) => AppError::LedgerReverted(msg),
            LedgerError::Unavailable(msg) => AppError::LedgerUnavailable(msg),
            LedgerError::Gateway(msg) => AppError::Internal(msg),
        }
    }
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn invalid_token(_msg: impl Into<String>) -> Self {
        Self::InvalidToken
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn token_expired() -> Self {
        Self::TokenExpired
    }

    /// Unified message to prevent username enumeration during login
    pub fn invalid_credentials() -> Self {
        Self::Invalid("Invalid username or password".to_string())
    }
}

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}
