//! Catalog browsing handlers with Redis-cached listings.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::api::AppState;
use crate::config::{PRODUCT_ALL_CACHE_TTL_SECONDS, PRODUCT_LIST_CACHE_TTL_SECONDS};
use crate::domain::{Product, ProductFilter};
use crate::errors::AppResult;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Case-insensitive category name fragment
    pub category: Option<String>,
}

/// Authenticated routes under `/products`.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/all", get(all_products))
        .route("/search/:name", get(search_products))
        .route("/:id", get(get_product))
}

/// Serve a listing from the cache, filling it from the database on a miss.
///
/// Cache errors are logged and the database answers instead.
pub(crate) async fn cached_products(
    state: &AppState,
    filter: ProductFilter,
    ttl_seconds: u64,
) -> AppResult<Vec<Product>> {
    match state.cache.get_products(&filter).await {
        Ok(Some(products)) => {
            tracing::debug!(filter = %filter.cache_key(), "Product cache hit");
            return Ok(products);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "Product cache read failed"),
    }

    let products = state.catalog_service.list_products(filter.clone()).await?;

    if let Err(e) = state.cache.set_products(&filter, &products, ttl_seconds).await {
        tracing::warn!(error = %e, "Product cache write failed");
    }

    Ok(products)
}

/// Drop every cached listing after catalog or stock changes.
pub(crate) async fn invalidate_product_cache(state: &AppState) {
    match state.cache.invalidate_products().await {
        Ok(removed) => tracing::debug!(removed, "Product cache invalidated"),
        Err(e) => tracing::warn!(error = %e, "Product cache invalidation failed"),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// List products, optionally filtered by category
#[utoipa::path(
    get,
    path = "/api/v1/products",
    tag = "Products",
    params(ProductQuery),
    responses((status = 200, description = "Matching products", body = Vec<Product>)),
    security(("bearer_auth" = []))
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<Vec<Product>>> {
    let filter = ProductFilter {
        category: non_blank(query.category),
        name: None,
    };

    let products = cached_products(&state, filter, PRODUCT_LIST_CACHE_TTL_SECONDS).await?;
    Ok(Json(products))
}

/// Every product
#[utoipa::path(
    get,
    path = "/api/v1/products/all",
    tag = "Products",
    responses((status = 200, description = "All products", body = Vec<Product>)),
    security(("bearer_auth" = []))
)]
pub async fn all_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let products = cached_products(
        &state,
        ProductFilter::default(),
        PRODUCT_ALL_CACHE_TTL_SECONDS,
    )
    .await?;

    Ok(Json(products))
}

/// Search products by name
#[utoipa::path(
    get,
    path = "/api/v1/products/search/{name}",
    tag = "Products",
    params(("name" = String, Path, description = "Case-insensitive name fragment")),
    responses((status = 200, description = "Matching products", body = Vec<Product>)),
    security(("bearer_auth" = []))
)]
pub async fn search_products(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<Product>>> {
    let filter = ProductFilter {
        category: None,
        name: non_blank(Some(name)),
    };

    let products = cached_products(&state, filter, PRODUCT_LIST_CACHE_TTL_SECONDS).await?;
    Ok(Json(products))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Product>> {
    let product = state.catalog_service.get_product(id).await?;
    Ok(Json(product))
}
