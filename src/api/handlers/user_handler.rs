//! Profile and address book handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post, put},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::validation::{PHONE_RE, ZIP_CODE_RE};
use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{Address, AddressChanges, NewAddress, ProfileChanges, UserProfile, UserResponse};
use crate::errors::AppResult;
use crate::types::{Created, MessageResponse};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    #[schema(example = "Asha")]
    pub firstname: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub lastname: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Phone must be 10 to 15 digits"))]
    #[schema(example = "9876543210")]
    pub phone: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileChanges {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            firstname: req.firstname.map(|v| v.trim().to_string()),
            lastname: req.lastname.map(|v| v.trim().to_string()),
            phone: req.phone,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 100, message = "Recipient name is required"))]
    #[schema(example = "Asha Rao")]
    pub recipient_name: String,
    #[validate(regex(path = *PHONE_RE, message = "Phone must be 10 to 15 digits"))]
    #[schema(example = "9876543210")]
    pub recipient_phone: String,
    #[validate(length(min = 1, max = 255, message = "Street is required"))]
    #[schema(example = "12 MG Road")]
    pub street: String,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(regex(path = *ZIP_CODE_RE, message = "Invalid zip code"))]
    #[schema(example = "560001")]
    pub zip_code: String,
}

impl From<AddressRequest> for NewAddress {
    fn from(req: AddressRequest) -> Self {
        Self {
            recipient_name: req.recipient_name,
            recipient_phone: req.recipient_phone,
            street: req.street,
            city: req.city,
            state: req.state,
            zip_code: req.zip_code,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    #[validate(length(min = 1, max = 100))]
    pub recipient_name: Option<String>,
    #[validate(regex(path = *PHONE_RE, message = "Phone must be 10 to 15 digits"))]
    pub recipient_phone: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub street: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(regex(path = *ZIP_CODE_RE, message = "Invalid zip code"))]
    pub zip_code: Option<String>,
}

impl From<UpdateAddressRequest> for AddressChanges {
    fn from(req: UpdateAddressRequest) -> Self {
        Self {
            recipient_name: req.recipient_name,
            recipient_phone: req.recipient_phone,
            street: req.street,
            city: req.city,
            state: req.state,
            zip_code: req.zip_code,
        }
    }
}

/// Authenticated routes under `/user`.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/update", put(update_profile))
        .route("/:id", get(get_user))
        .route("/address/all", get(list_addresses))
        .route("/address/add", post(add_address))
        .route("/address/update/:id", put(update_address))
        .route("/address/delete/:id", delete(delete_address))
}

/// Update the caller's profile
#[utoipa::path(
    put,
    path = "/api/v1/user/update",
    tag = "Users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Phone already registered")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .user_service
        .update_profile(current_user.id, payload.into())
        .await?;

    Ok(Json(UserResponse::from(user)))
}

/// Get a user with addresses and orders (self or admin)
#[utoipa::path(
    get,
    path = "/api/v1/user/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 403, description = "Another user's profile"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserProfile>> {
    current_user.require_self_or_admin(id)?;

    let profile = state.user_service.get_profile(id).await?;
    Ok(Json(profile))
}

/// List the caller's addresses
#[utoipa::path(
    get,
    path = "/api/v1/user/address/all",
    tag = "Addresses",
    responses((status = 200, description = "Addresses", body = Vec<Address>)),
    security(("bearer_auth" = []))
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Address>>> {
    let addresses = state.address_service.list(current_user.id).await?;
    Ok(Json(addresses))
}

/// Add an address
#[utoipa::path(
    post,
    path = "/api/v1/user/address/add",
    tag = "Addresses",
    request_body = AddressRequest,
    responses(
        (status = 201, description = "Address added", body = Address),
        (status = 400, description = "Validation error")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_address(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    ValidatedJson(payload): ValidatedJson<AddressRequest>,
) -> AppResult<Created<Address>> {
    let address = state
        .address_service
        .add(current_user.id, payload.into())
        .await?;

    Ok(Created(address))
}

/// Update one of the caller's addresses
#[utoipa::path(
    put,
    path = "/api/v1/user/address/update/{id}",
    tag = "Addresses",
    params(("id" = Uuid, Path, description = "Address ID")),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Address updated", body = Address),
        (status = 404, description = "Address not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_address(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateAddressRequest>,
) -> AppResult<Json<Address>> {
    let address = state
        .address_service
        .update(current_user.id, id, payload.into())
        .await?;

    Ok(Json(address))
}

/// Delete one of the caller's addresses
#[utoipa::path(
    delete,
    path = "/api/v1/user/address/delete/{id}",
    tag = "Addresses",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address deleted", body = MessageResponse),
        (status = 404, description = "Address not found"),
        (status = 409, description = "Address used by a placed order")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_address(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    state.address_service.delete(current_user.id, id).await?;
    Ok(Json(MessageResponse::new("Address deleted")))
}
