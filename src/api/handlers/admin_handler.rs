//! Admin handlers: catalog management, order processing and analytics.
//!
//! Mounted behind both the auth and admin middleware.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::product_handler::{cached_products, invalidate_product_cache};
use crate::api::extractors::validation::{image_url_list, image_urls};
use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::config::PRODUCT_ALL_CACHE_TTL_SECONDS;
use crate::domain::{
    AdminOrderResponse, Category, CategoryWithCount, NewProduct, OrderStatus, Product,
    ProductChanges, ProductFilter, SalesAnalytics,
};
use crate::errors::{AppError, AppResult};
use crate::types::{Created, MessageResponse, Paginated, PaginatedAdminOrders, PaginationParams};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    #[schema(example = "Basmati Rice")]
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "249.00")]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    #[schema(example = 40)]
    pub stock: i32,
    #[validate(length(max = 50))]
    #[schema(example = "1 kg")]
    pub quantity: Option<String>,
    #[schema(value_type = Option<String>, example = "1.00")]
    pub weight: Option<Decimal>,
    pub category_id: Uuid,
    #[serde(default)]
    #[validate(custom(function = "image_url_list"))]
    pub images: Vec<String>,
}

impl From<ProductRequest> for NewProduct {
    fn from(req: ProductRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            description: req.description,
            price: req.price,
            stock: req.stock,
            quantity: req.quantity,
            weight: req.weight,
            category_id: req.category_id,
            images: req.images.into_iter().map(|url| url.trim().to_string()).collect(),
        }
    }
}

/// Partial product update; `images` replaces the whole list when present
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,
    #[validate(length(max = 50))]
    pub quantity: Option<String>,
    #[schema(value_type = Option<String>)]
    pub weight: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
}

impl TryFrom<UpdateProductRequest> for ProductChanges {
    type Error = AppError;

    fn try_from(req: UpdateProductRequest) -> AppResult<Self> {
        if let Some(images) = &req.images {
            image_urls(images).map_err(|e| {
                AppError::validation(
                    e.message
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "images are invalid".to_string()),
                )
            })?;
        }

        Ok(Self {
            name: req.name.map(|v| v.trim().to_string()),
            description: req.description,
            price: req.price,
            stock: req.stock,
            quantity: req.quantity,
            weight: req.weight,
            category_id: req.category_id,
            images: req.images,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DeleteProductRequest {
    pub id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Category name must be 1-100 characters"))]
    #[schema(example = "Groceries")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Admin routes under `/admin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products/all", get(all_products))
        .route("/products/add-product", post(create_product))
        .route("/products/update-product/:id", put(update_product))
        .route("/products/delete-product", delete(delete_product))
        .route("/categories/all", get(list_categories))
        .route("/categories/add-category", post(create_category))
        .route("/categories/update-category/:id", put(update_category))
        .route("/categories/delete-category/:id", delete(delete_category))
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/update/:id", put(update_order_status))
        .route("/analytics", get(analytics))
}

/// Every product
#[utoipa::path(
    get,
    path = "/api/v1/admin/products/all",
    operation_id = "admin_all_products",
    tag = "Admin",
    responses(
        (status = 200, description = "All products", body = Vec<Product>),
        (status = 403, description = "Admin role required")
    ),
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

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/admin/products/add-product",
    tag = "Admin",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ProductRequest>,
) -> AppResult<Created<Product>> {
    let product = state.catalog_service.create_product(payload.into()).await?;
    invalidate_product_cache(&state).await;

    Ok(Created(product))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/v1/admin/products/update-product/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Product or category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    let product = state
        .catalog_service
        .update_product(id, payload.try_into()?)
        .await?;
    invalidate_product_cache(&state).await;

    Ok(Json(product))
}

/// Delete a product that no order references
#[utoipa::path(
    delete,
    path = "/api/v1/admin/products/delete-product",
    tag = "Admin",
    request_body = DeleteProductRequest,
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product is part of existing orders")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_product(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<DeleteProductRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.catalog_service.delete_product(payload.id).await?;
    invalidate_product_cache(&state).await;

    Ok(Json(MessageResponse::new("Product deleted")))
}

/// Categories with their product counts
#[utoipa::path(
    get,
    path = "/api/v1/admin/categories/all",
    tag = "Admin",
    responses((status = 200, description = "Categories", body = Vec<CategoryWithCount>)),
    security(("bearer_auth" = []))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<CategoryWithCount>>> {
    let categories = state.catalog_service.list_categories().await?;
    Ok(Json(categories))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/admin/categories/add-category",
    tag = "Admin",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 409, description = "Category already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> AppResult<Created<Category>> {
    let category = state.catalog_service.create_category(payload.name).await?;
    Ok(Created(category))
}

/// Rename a category
#[utoipa::path(
    put,
    path = "/api/v1/admin/categories/update-category/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category renamed", body = Category),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Name already taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CategoryRequest>,
) -> AppResult<Json<Category>> {
    let category = state
        .catalog_service
        .update_category(id, payload.name)
        .await?;
    // Listings embed the category name
    invalidate_product_cache(&state).await;

    Ok(Json(category))
}

/// Delete an empty category
#[utoipa::path(
    delete,
    path = "/api/v1/admin/categories/delete-category/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = MessageResponse),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has products")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.catalog_service.delete_category(id).await?;
    invalidate_product_cache(&state).await;

    Ok(Json(MessageResponse::new("Category deleted")))
}

/// Placed orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/admin/orders",
    tag = "Admin",
    params(PaginationParams),
    responses((status = 200, description = "Orders page", body = PaginatedAdminOrders)),
    security(("bearer_auth" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<AdminOrderResponse>>> {
    let page = state.admin_service.list_orders(params).await?;
    Ok(Json(page.map(AdminOrderResponse::from)))
}

/// One placed order
#[utoipa::path(
    get,
    path = "/api/v1/admin/orders/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = AdminOrderResponse),
        (status = 404, description = "Order not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AdminOrderResponse>> {
    let order = state.admin_service.get_order(id).await?;
    Ok(Json(order.into()))
}

/// Move an order along its lifecycle
#[utoipa::path(
    put,
    path = "/api/v1/admin/orders/update/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Order updated", body = AdminOrderResponse),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateStatusRequest>,
) -> AppResult<Json<AdminOrderResponse>> {
    let order = state
        .admin_service
        .update_order_status(id, payload.status)
        .await?;

    Ok(Json(order.into()))
}

/// Revenue figures
#[utoipa::path(
    get,
    path = "/api/v1/admin/analytics",
    tag = "Admin",
    responses((status = 200, description = "Sales analytics", body = SalesAnalytics)),
    security(("bearer_auth" = []))
)]
pub async fn analytics(State(state): State<AppState>) -> AppResult<Json<SalesAnalytics>> {
    let analytics = state.admin_service.analytics().await?;
    Ok(Json(analytics))
}
