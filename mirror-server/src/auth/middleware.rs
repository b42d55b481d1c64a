//! 认证中间件
//!
//! 为 JWT 认证和授权提供 Axum 中间件

use axum::{
    extract::{Request, State},
    http::Method,
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::utils::AppError;

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT。
/// 验证成功后将 [`CurrentUser`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - `/api/health`、`/api/auth/login`、`/api/auth/register`
/// - 除 `/api/auth/*` 外的所有 GET 读取 (目录读取是公开的)
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    // 公共 API 路由跳过认证
    let is_public_api_route =
        path == "/api/health" || path == "/api/auth/login" || path == "/api/auth/register";
    let is_public_read = req.method() == Method::GET && !path.starts_with("/api/auth");
    if is_public_api_route || is_public_read {
        return Ok(next.run(req).await);
    }

    let jwt_service = state.jwt_service();
    let auth_header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            warn!(target: "security", uri = %req.uri(), "Request without authorization header");
            return Err(AppError::unauthorized());
        }
    };

    // 验证令牌
    match jwt_service.validate_token(token) {
        Ok(claims) => {
            let user = CurrentUser::from(claims);
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!(target: "security", error = %e, uri = %req.uri(), "Token validation failed");
            match e {
                JwtError::ExpiredToken => Err(AppError::token_expired()),
                _ => Err(AppError::invalid_token("Invalid token")),
            }
        }
    }
}

/// 从请求扩展中获取 CurrentUser 的扩展方法
pub trait CurrentUserExt {
    /// 未认证返回 401 Unauthorized
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or(AppError::Unauthorized)
    }
}

/// 要求合约所有者角色；目录增删改与订单履行/删除使用
pub fn require_owner(user: &CurrentUser) -> Result<(), AppError> {
    if !user.is_owner() {
        warn!(
            target: "security",
            user_id = %user.id,
            username = %user.username,
            "Owner role required"
        );
        return Err(AppError::forbidden("Owner role required"));
    }
    Ok(())
}
