//! Order API Handlers
//!
//! Orders are placed by product name (ledger resolution rule) and signed
//! with the calling user's own ledger account. Fulfillment and deletion
//! require the owner role.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use shared::catalog::{OrderView, PlaceOrderRequest};

use crate::auth::CurrentUser;
use crate::auth::middleware::require_owner;
use crate::core::ServerState;
use crate::db::models::Order;
use crate::utils::{AppError, AppResponse, AppResult, ok};

fn order_view(order: &Order) -> OrderView {
    OrderView {
        order_id: order.order_id,
        product_name: order.product_name.clone(),
        quantity: order.quantity,
        buyer: order.buyer.clone(),
        status: order.status.as_str().to_string(),
    }
}

/// GET /api/orders - 镜像订单列表
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<OrderView>>> {
    let orders = state.coordinator().list_orders().await?;
    Ok(Json(orders.iter().map(order_view).collect()))
}

/// GET /api/orders/:id - 按账本订单 id 获取订单
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<Json<OrderView>> {
    let order = state
        .coordinator()
        .get_order(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))?;
    Ok(Json(order_view(&order)))
}

/// POST /api/orders - 下单 (任何已登录用户)
///
/// 库存不足时账本回滚，镜像不变
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<PlaceOrderRequest>,
) -> AppResult<Json<OrderView>> {
    if req.product_name.trim().is_empty() {
        return Err(AppError::Validation("Product name is required".to_string()));
    }
    if req.quantity == 0 {
        return Err(AppError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }

    let order = state
        .coordinator()
        .place_order(&req.product_name, req.quantity, &user.user_address)
        .await?;

    Ok(Json(order_view(&order)))
}

/// POST /api/orders/:id/fulfill - 履行订单 (owner)
pub async fn fulfill(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<u64>,
) -> AppResult<Json<OrderView>> {
    require_owner(&user)?;

    let order = state.coordinator().fulfill_order(id).await?;
    Ok(Json(order_view(&order)))
}

/// DELETE /api/orders/:id - 删除订单 (owner)
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<u64>,
) -> AppResult<Json<AppResponse<()>>> {
    require_owner(&user)?;

    state.coordinator().delete_order(id).await?;
    Ok(ok(()))
}
