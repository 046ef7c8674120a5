//! Cart and order handlers for the signed-in customer.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::product_handler::invalidate_product_cache;
use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::OrderResponse;
use crate::errors::AppResult;
use crate::types::Created;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddToCartRequest {
    /// Product to add one unit of
    pub id: Uuid,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub address_id: Uuid,
}

/// Authenticated routes under `/user`.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart/me", get(get_cart))
        .route("/cart/add-to-cart", post(add_to_cart))
        .route("/cart/delete-from-cart/:product_id", delete(remove_from_cart))
        .route("/order", post(place_order))
        .route("/orders/me", get(order_history))
}

/// The caller's cart, or `null` when they have none
#[utoipa::path(
    get,
    path = "/api/v1/user/cart/me",
    tag = "Cart",
    responses((status = 200, description = "Current cart or null", body = OrderResponse)),
    security(("bearer_auth" = []))
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Option<OrderResponse>>> {
    let cart = state.cart_service.get_cart(current_user.id).await?;
    Ok(Json(cart.map(OrderResponse::from)))
}

/// Add one unit of a product to the cart
#[utoipa::path(
    post,
    path = "/api/v1/user/cart/add-to-cart",
    tag = "Cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Updated cart", body = OrderResponse),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<AddToCartRequest>,
) -> AppResult<Json<OrderResponse>> {
    let cart = state
        .cart_service
        .add_to_cart(current_user.id, payload.id)
        .await?;

    Ok(Json(cart.into()))
}

/// Remove one unit of a product from the cart
#[utoipa::path(
    delete,
    path = "/api/v1/user/cart/delete-from-cart/{productId}",
    tag = "Cart",
    params(("productId" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Updated cart", body = OrderResponse),
        (status = 404, description = "No cart, or product not in cart")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<OrderResponse>> {
    let cart = state
        .cart_service
        .remove_from_cart(current_user.id, product_id)
        .await?;

    Ok(Json(cart.into()))
}

/// Check out the cart
#[utoipa::path(
    post,
    path = "/api/v1/user/order",
    tag = "Orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Cart is empty or a product is out of stock"),
        (status = 404, description = "No cart or unknown address")
    ),
    security(("bearer_auth" = []))
)]
pub async fn place_order(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<PlaceOrderRequest>,
) -> AppResult<Created<OrderResponse>> {
    let order = state
        .cart_service
        .place_order(current_user.id, payload.address_id)
        .await?;

    // Cached listings carry stock levels
    invalidate_product_cache(&state).await;

    Ok(Created(order.into()))
}

/// The caller's orders, newest first
#[utoipa::path(
    get,
    path = "/api/v1/user/orders/me",
    tag = "Orders",
    responses((status = 200, description = "Order history", body = Vec<OrderResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn order_history(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<OrderResponse>>> {
    let orders = state.cart_service.order_history(current_user.id).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}
