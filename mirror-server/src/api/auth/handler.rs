//! Authentication Handlers
//!
//! Registration, login and token management. Registration assigns each
//! user a ledger account by registration order; the first user becomes
//! the contract owner.

use std::time::Duration;

use axum::{Extension, Json, extract::State};
use chrono::Utc;

use shared::client::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Role, User, UserContent};
use crate::db::repository::UserRepository;
use crate::utils::{AppError, AppResponse, ok};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

fn user_info(user: &User) -> UserInfo {
    UserInfo {
        id: user.id.as_ref().map(|t| t.to_string()).unwrap_or_default(),
        username: user.username.clone(),
        user_address: user.user_address.clone(),
        role: user.role.as_str().to_string(),
        created_at: user.created_at.timestamp(),
    }
}

/// POST /api/auth/register - 注册新用户
///
/// 账本账户按注册顺序轮转分配 (`accounts[count % len]`)；
/// 第一个注册的用户获得 owner 角色 (账户 0 即合约所有者)。
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<UserInfo>, AppError> {
    if req.username.trim().is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if req.password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let repo = UserRepository::new(state.get_db());
    let count = repo.count().await?;

    let accounts = state
        .ledger
        .accounts()
        .await
        .map_err(AppError::from)?;
    if accounts.is_empty() {
        return Err(AppError::internal("No ledger accounts available"));
    }
    let user_address = accounts[(count as usize) % accounts.len()].clone();
    let role = if count == 0 { Role::Owner } else { Role::Buyer };

    let password_hash = User::hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

    let user = repo
        .create(UserContent {
            username: req.username.trim().to_string(),
            password_hash,
            user_address,
            role,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(
        username = %user.username,
        user_address = %user.user_address,
        role = user.role.as_str(),
        "User registered"
    );

    Ok(Json(user_info(&user)))
}

/// POST /api/auth/login - 登录
///
/// 验证凭据并返回 JWT 令牌
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let repo = UserRepository::new(state.get_db());
    let user = repo.find_by_username(&req.username).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent username enumeration
    let user = match user {
        Some(u) => {
            let password_valid = u
                .verify_password(&req.password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;

            if !password_valid {
                tracing::warn!(username = %req.username, "Login failed - invalid credentials");
                return Err(AppError::invalid_credentials());
            }

            u
        }
        None => {
            tracing::warn!(username = %req.username, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    let user_id = user.id.as_ref().map(|t| t.to_string()).unwrap_or_default();
    let token = state
        .jwt_service()
        .generate_token(
            &user_id,
            &user.username,
            user.role.as_str(),
            &user.user_address,
        )
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(
        user_id = %user_id,
        username = %user.username,
        role = user.role.as_str(),
        "User logged in successfully"
    );

    Ok(Json(LoginResponse {
        token,
        user: user_info(&user),
    }))
}

/// GET /api/auth/me - 当前用户信息
pub async fn me(
    State(state): State<ServerState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserInfo>, AppError> {
    // Query fresh data; the token may be older than a profile change
    let repo = UserRepository::new(state.get_db());
    let user = repo
        .find_by_username(&current.username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("User {}", current.username)))?;

    Ok(Json(user_info(&user)))
}

/// POST /api/auth/logout - 登出
///
/// JWT 是无状态的；登出只在客户端丢弃令牌
pub async fn logout(
    Extension(current): Extension<CurrentUser>,
) -> Json<AppResponse<()>> {
    tracing::info!(username = %current.username, "User logged out");
    ok(())
}
