//! JWT authentication and role middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::UserRole;
use crate::errors::AppError;

/// Authenticated caller, taken from the token claims.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Allow the user themselves or any admin.
    pub fn require_self_or_admin(&self, user_id: Uuid) -> Result<(), AppError> {
        if self.id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// Validate the Bearer token and insert [`CurrentUser`] into the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::Unauthorized)?;

    let claims = state.auth_service.verify_token(bearer.token())?;

    request.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        email: claims.email,
        role: UserRole::from(claims.role.as_str()),
    });

    Ok(next.run(request).await)
}

/// Reject non-admins with 403. Runs after [`auth_middleware`].
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AppError::Unauthorized)?;

    if !user.is_admin() {
        tracing::warn!(user_id = %user.id, path = %request.uri().path(), "Admin route denied");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "asha@example.com".into(),
            role,
        }
    }

    #[test]
    fn test_self_or_admin() {
        let customer = caller(UserRole::Customer);
        assert!(customer.require_self_or_admin(customer.id).is_ok());
        assert!(matches!(
            customer.require_self_or_admin(Uuid::new_v4()),
            Err(AppError::Forbidden)
        ));

        let admin = caller(UserRole::Admin);
        assert!(admin.require_self_or_admin(Uuid::new_v4()).is_ok());
    }
}
