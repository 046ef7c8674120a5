//! Signup and signin handlers.

use axum::{extract::State, response::Json, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::{validation::PHONE_RE, ValidatedJson};
use crate::api::AppState;
use crate::errors::AppResult;
use crate::services::{NewAccount, TokenResponse};
use crate::types::Created;

/// Account registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "asha@example.com")]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123", min_length = 8)]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    #[schema(example = "Asha")]
    pub firstname: String,
    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    #[schema(example = "Rao")]
    pub lastname: String,
    #[validate(regex(path = *PHONE_RE, message = "Phone must be 10 to 15 digits"))]
    #[schema(example = "9876543210")]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "asha@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "SecurePass123")]
    pub password: String,
}

/// Public routes, mounted under `/user`.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}

/// Create a customer account
#[utoipa::path(
    post,
    path = "/api/v1/user/signup",
    tag = "Authentication",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email or phone already registered")
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> AppResult<Created<TokenResponse>> {
    let token = state
        .auth_service
        .signup(NewAccount {
            email: payload.email,
            password: payload.password,
            firstname: payload.firstname,
            lastname: payload.lastname,
            phone: payload.phone,
        })
        .await?;

    Ok(Created(token))
}

/// Sign in and receive a JWT
#[utoipa::path(
    post,
    path = "/api/v1/user/signin",
    tag = "Authentication",
    request_body = SigninRequest,
    responses(
        (status = 200, description = "Signed in", body = TokenResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn signin(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SigninRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .auth_service
        .signin(payload.email, payload.password)
        .await?;

    Ok(Json(token))
}
