//! Authentication Module
//!
//! JWT 令牌认证：令牌服务 + axum 中间件

pub mod jwt;
pub mod middleware;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::require_auth;
