//! Product catalog handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bazaar_core::ProductId;

use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::models::{NewProduct, Product};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Pagination parameters for the listing endpoint.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    page: Option<i64>,
    page_size: Option<i64>,
}

/// One page of products plus the total count across all pages.
#[derive(Debug, Serialize)]
pub struct ProductPage {
    count: i64,
    page: i64,
    page_size: i64,
    results: Vec<Product>,
}

/// `GET /products` - paginated listing in ID order.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<ProductPage>> {
    let page = pagination.page.unwrap_or(1).max(1);
    let page_size = pagination
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    // Saturate so an absurd page number degrades to an empty page instead
    // of overflowing the offset arithmetic.
    let offset = page.saturating_sub(1).saturating_mul(page_size);

    let (results, count) = state.catalog().list(page_size, offset).await?;
    Ok(Json(ProductPage {
        count,
        page,
        page_size,
        results,
    }))
}

/// `GET /products/{id}` - product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = state
        .catalog()
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id} not found")))?;
    Ok(Json(product))
}

/// `POST /products` - create a product.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Json(new_product): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    validate(&new_product)?;
    let product = state.catalog().create(new_product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /products/{id}` - replace a product.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(new_product): Json<NewProduct>,
) -> Result<Json<Product>> {
    validate(&new_product)?;
    match state.catalog().update(id, new_product).await {
        Ok(product) => Ok(Json(product)),
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound(format!("product {id} not found")))
        }
        Err(e) => Err(e.into()),
    }
}

/// `DELETE /products/{id}` - delete a product.
#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<StatusCode> {
    if state.catalog().delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("product {id} not found")))
    }
}

fn validate(product: &NewProduct) -> Result<()> {
    if product.name.trim().is_empty() {
        return Err(AppError::BadRequest("product name must not be empty".to_owned()));
    }
    if product.price.is_sign_negative() {
        return Err(AppError::BadRequest("price must not be negative".to_owned()));
    }
    if product.stock < 0 {
        return Err(AppError::BadRequest("stock must not be negative".to_owned()));
    }
    Ok(())
}
