//! Shared types for the mirror stack
//!
//! Request/response DTOs used by both the HTTP API and any client code.
//! Kept free of server-side dependencies so clients can link it directly.

pub mod catalog;
pub mod client;

pub use serde::{Deserialize, Serialize};

pub use catalog::{
    CreateProductRequest, OrderView, PlaceOrderRequest, ProductView, UpdateProductRequest,
};
pub use client::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};
