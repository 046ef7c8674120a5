//! Router-level tests.
//!
//! Requests go through the full middleware stack. Auth and cart run on
//! in-memory fakes; every other service sits on a mock database with no
//! rows queued, so any query it makes fails. The health check sees a
//! disconnected database and Redis is disabled.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use shop_api::api::{create_router, AppState};
use shop_api::config::Config;
use shop_api::domain::OrderDetails;
use shop_api::errors::{AppError, AppResult};
use shop_api::infra::{Cache, Database};
use shop_api::services::{
    AuthService, CartService, Claims, MockServiceContainer, NewAccount, ServiceContainer,
    Services, TokenResponse,
};

const CUSTOMER_TOKEN: &str = "customer-token";
const ADMIN_TOKEN: &str = "admin-token";

struct FakeAuth;

#[async_trait]
impl AuthService for FakeAuth {
    async fn signup(&self, account: NewAccount) -> AppResult<TokenResponse> {
        Ok(TokenResponse {
            jwt: format!("Bearer token-for-{}", account.email),
            access_token: format!("token-for-{}", account.email),
            token_type: "Bearer".to_string(),
            expires_in: 86400,
        })
    }

    async fn signin(&self, _email: String, _password: String) -> AppResult<TokenResponse> {
        Err(AppError::InvalidCredentials)
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let role = match token {
            CUSTOMER_TOKEN => "customer",
            ADMIN_TOKEN => "admin",
            _ => return Err(AppError::Unauthorized),
        };
        let now = Utc::now().timestamp();

        Ok(Claims {
            sub: Uuid::new_v4(),
            email: format!("{}@example.com", role),
            role: role.to_string(),
            name: "Asha Rao".to_string(),
            exp: now + 3600,
            iat: now,
        })
    }
}

/// A user who never added anything.
struct EmptyCart;

#[async_trait]
impl CartService for EmptyCart {
    async fn get_cart(&self, _user_id: Uuid) -> AppResult<Option<OrderDetails>> {
        Ok(None)
    }

    async fn add_to_cart(&self, _user_id: Uuid, _product_id: Uuid) -> AppResult<OrderDetails> {
        Err(AppError::not_found("Product"))
    }

    async fn remove_from_cart(
        &self,
        _user_id: Uuid,
        _product_id: Uuid,
    ) -> AppResult<OrderDetails> {
        Err(AppError::not_found("Cart"))
    }

    async fn place_order(&self, _user_id: Uuid, _address_id: Uuid) -> AppResult<OrderDetails> {
        Err(AppError::EmptyCart)
    }

    async fn order_history(&self, _user_id: Uuid) -> AppResult<Vec<OrderDetails>> {
        Ok(Vec::new())
    }
}

fn app() -> Router {
    let config = Config::build(
        "test-secret-key-for-testing-only-32chars",
        "postgres://unused",
        None,
    )
    .unwrap();
    let offline = Services::from_connection(
        MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        config,
    );

    let mut container = MockServiceContainer::new();
    container
        .expect_auth()
        .return_const(Arc::new(FakeAuth) as Arc<dyn AuthService>);
    container
        .expect_cart()
        .return_const(Arc::new(EmptyCart) as Arc<dyn CartService>);
    container.expect_users().return_const(offline.users());
    container.expect_addresses().return_const(offline.addresses());
    container.expect_catalog().return_const(offline.catalog());
    container.expect_admin().return_const(offline.admin());

    let state = AppState::from_container(
        &container,
        Arc::new(Cache::disabled()),
        Arc::new(Database::from_connection(DatabaseConnection::Disconnected)),
    );

    create_router(state, &[])
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

// =============================================================================
// Public endpoints
// =============================================================================

#[tokio::test]
async fn test_root_reports_running() {
    let response = app().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"Shop API is running");
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let (status, body) = send(get("/health", None)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["services"]["database"]["status"], "unhealthy");
    assert_eq!(body["services"]["redis"]["status"], "disabled");
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let (status, body) = send(get("/api-docs/openapi.json", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/user/order"].is_object());
}

#[tokio::test]
async fn test_signup_returns_created_token() {
    let (status, body) = send(post_json(
        "/api/v1/user/signup",
        None,
        json!({
            "email": "asha@example.com",
            "password": "SecurePass123",
            "firstname": "Asha",
            "lastname": "Rao",
            "phone": "9876543210"
        }),
    ))
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["jwt"], "Bearer token-for-asha@example.com");
}

#[tokio::test]
async fn test_signup_rejects_invalid_payload() {
    let (status, body) = send(post_json(
        "/api/v1/user/signup",
        None,
        json!({
            "email": "not-an-email",
            "password": "short",
            "firstname": "Asha",
            "lastname": "Rao",
            "phone": "12"
        }),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("Invalid email format"));
    assert!(message.contains("Password must be at least 8 characters"));
}

#[tokio::test]
async fn test_signin_with_bad_credentials() {
    let (status, body) = send(post_json(
        "/api/v1/user/signin",
        None,
        json!({ "email": "asha@example.com", "password": "wrong-password" }),
    ))
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
}

// =============================================================================
// Authentication and roles
// =============================================================================

#[tokio::test]
async fn test_cart_requires_token() {
    let (status, body) = send(get("/api/v1/user/cart/me", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_token_is_rejected() {
    let (status, _) = send(get("/api/v1/products", Some("forged"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_customer_cannot_reach_admin_routes() {
    let (status, body) = send(get("/api/v1/admin/orders", Some(CUSTOMER_TOKEN))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_admin_passes_role_check() {
    // The admin service reaches a database with nothing to return
    let (status, body) = send(get("/api/v1/admin/orders", Some(ADMIN_TOKEN))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
}

// =============================================================================
// Cart and checkout
// =============================================================================

#[tokio::test]
async fn test_missing_cart_is_null() {
    let (status, body) = send(get("/api/v1/user/cart/me", Some(CUSTOMER_TOKEN))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());
}

#[tokio::test]
async fn test_checkout_of_empty_cart() {
    let (status, body) = send(post_json(
        "/api/v1/user/order",
        Some(CUSTOMER_TOKEN),
        json!({ "addressId": Uuid::new_v4() }),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "EMPTY_CART");
}

#[tokio::test]
async fn test_checkout_requires_address_id() {
    let (status, body) = send(post_json(
        "/api/v1/user/order",
        Some(CUSTOMER_TOKEN),
        json!({}),
    ))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_add_unknown_product_to_cart() {
    let (status, body) = send(post_json(
        "/api/v1/user/cart/add-to-cart",
        Some(CUSTOMER_TOKEN),
        json!({ "id": Uuid::new_v4() }),
    ))
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Product not found");
}

#[tokio::test]
async fn test_order_history_is_a_list() {
    let (status, body) = send(get("/api/v1/user/orders/me", Some(CUSTOMER_TOKEN))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

