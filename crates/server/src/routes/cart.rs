//! Cart handlers.
//!
//! Every route requires a Bearer access token; the [`CurrentUser`] extractor
//! rejects unauthenticated requests with 401 before the handler runs.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bazaar_core::{CartItemId, ProductId};

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::CartLine;
use crate::services::cart::AddStatus;
use crate::state::AppState;

/// Body for `POST /cart`. `quantity` defaults to 1 when omitted.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    product_id: ProductId,
    quantity: Option<i32>,
}

/// Body for `PUT /cart/{item_id}`. An absent `quantity` reads the item back
/// without changing it.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    quantity: Option<i32>,
}

/// Response for `POST /cart`: the resulting line item plus whether it was
/// newly created or merged into an existing one.
#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    item: CartLine,
    status: AddStatus,
}

/// `GET /cart` - the caller's cart as product-resolved line items.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<CartLine>>> {
    Ok(Json(state.cart().list(user).await?))
}

/// `POST /cart` - add a product, merging into an existing line item.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<AddItemResponse>)> {
    let (item, status) = state
        .cart()
        .add(user, req.product_id, req.quantity)
        .await?;
    tracing::debug!(user = %user, product = %req.product_id, ?status, "cart add");
    Ok((StatusCode::CREATED, Json(AddItemResponse { item, status })))
}

/// `PUT /cart/{item_id}` - set a line item's quantity.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<CartItemId>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartLine>> {
    let line = state.cart().set_quantity(user, item_id, req.quantity).await?;
    Ok(Json(line))
}

/// `DELETE /cart/{item_id}` - remove a line item.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<CartItemId>,
) -> Result<StatusCode> {
    state.cart().remove(user, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
