//! Product API Handlers
//!
//! Reads come straight from the ledger (with mirror ids attached);
//! mutations go through the sync coordinator so the ledger commits
//! before the mirror is touched. The `{id}` segment is the ledger id.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use shared::catalog::{CreateProductRequest, ProductView, UpdateProductRequest};

use crate::auth::CurrentUser;
use crate::auth::middleware::require_owner;
use crate::core::ServerState;
use crate::utils::{AppError, AppResponse, AppResult, ok};

fn validate_fields(name: &str, quantity: u64) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Product name is required".to_string()));
    }
    if quantity == 0 {
        return Err(AppError::Validation(
            "Quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/products - 活跃商品列表 (账本扫描 + 镜像 id)
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<ProductView>>> {
    let products = state.coordinator().list_products().await?;

    let views = products
        .into_iter()
        .map(|(ledger_id, record, mirror_id)| ProductView {
            ledger_id,
            mirror_id,
            name: record.name,
            description: record.description,
            price: record.price,
            quantity: record.quantity,
            category: record.category,
        })
        .collect();

    Ok(Json(views))
}

/// GET /api/products/:id - 按账本 id 获取商品
///
/// 已删除的槽位返回 404
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<u64>,
) -> AppResult<Json<ProductView>> {
    let (record, mirror_id) = state.coordinator().get_product(id).await?;

    Ok(Json(ProductView {
        ledger_id: id,
        mirror_id,
        name: record.name,
        description: record.description,
        price: record.price,
        quantity: record.quantity,
        category: record.category,
    }))
}

/// POST /api/products - 创建商品 (owner)
pub async fn create(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Json(req): Json<CreateProductRequest>,
) -> AppResult<Json<ProductView>> {
    require_owner(&user)?;
    validate_fields(&req.name, req.quantity)?;

    let (ledger_id, product) = state.coordinator().create_product(req).await?;

    Ok(Json(ProductView {
        ledger_id,
        mirror_id: product.id.map(|t| t.to_string()),
        name: product.name,
        description: product.description,
        price: product.price,
        quantity: product.quantity,
        category: product.category,
    }))
}

/// PUT /api/products/:id - 更新商品 (owner)
pub async fn update(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateProductRequest>,
) -> AppResult<Json<ProductView>> {
    require_owner(&user)?;
    validate_fields(&req.name, req.quantity)?;

    let product = state.coordinator().update_product(id, req).await?;

    Ok(Json(ProductView {
        ledger_id: id,
        mirror_id: product.id.map(|t| t.to_string()),
        name: product.name,
        description: product.description,
        price: product.price,
        quantity: product.quantity,
        category: product.category,
    }))
}

/// DELETE /api/products/:id - 删除商品 (owner)
pub async fn delete(
    State(state): State<ServerState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<u64>,
) -> AppResult<Json<AppResponse<()>>> {
    require_owner(&user)?;

    state.coordinator().delete_product(id).await?;
    Ok(ok(()))
}
