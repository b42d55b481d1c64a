//! HTTP API Module
//!
//! RESTful 接口，按资源分模块装配路由

pub mod auth;
pub mod health;
pub mod orders;
pub mod products;
