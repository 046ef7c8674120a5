//! Authentication service: account signup, signin and token handling.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{Config, BEARER_TOKEN_PREFIX, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{NewUser, Password, User, DUMMY_HASH};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

/// JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    /// Display name at the time the token was issued
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after signup or signin
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    /// Ready-to-use Authorization header value
    #[schema(example = "Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub jwt: String,
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token lifetime in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

/// Signup input
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: String,
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create a customer account and sign it in.
    async fn signup(&self, account: NewAccount) -> AppResult<TokenResponse>;

    async fn signin(&self, email: String, password: String) -> AppResult<TokenResponse>;

    /// Verify a JWT and extract its claims.
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        name: user.full_name(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        jwt: format!("{}{}", BEARER_TOKEN_PREFIX, token),
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

fn verify_token_internal(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, config: Config) -> Self {
        Self { uow, config }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn signup(&self, account: NewAccount) -> AppResult<TokenResponse> {
        let email = normalize_email(&account.email);
        let phone = account.phone.trim().to_string();
        let users = self.uow.users();

        if users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }
        if users.find_by_phone(&phone).await?.is_some() {
            return Err(AppError::conflict("Phone already registered"));
        }

        let password_hash = Password::new(&account.password)?.into_string();
        let user = users
            .create(NewUser {
                email,
                phone,
                firstname: account.firstname.trim().to_string(),
                lastname: account.lastname.trim().to_string(),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "Account created");
        generate_token(&user, &self.config)
    }

    async fn signin(&self, email: String, password: String) -> AppResult<TokenResponse> {
        let user = self.uow.users().find_by_email(&normalize_email(&email)).await?;

        // Unknown accounts still pay for one Argon2 verification
        let stored = Password::from_hash(
            user.as_ref()
                .map(|u| u.password_hash.as_str())
                .unwrap_or(DUMMY_HASH),
        );
        let password_valid = stored.verify(&password);

        match user {
            Some(user) if password_valid => generate_token(&user, &self.config),
            _ => {
                tracing::debug!("Rejected signin attempt");
                Err(AppError::InvalidCredentials)
            }
        }
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        verify_token_internal(token, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_DATABASE_URL;
    use crate::domain::UserRole;
    use crate::services::test_support::{user, TestUnitOfWork};
    use mockall::predicate::eq;

    fn config() -> Config {
        Config::build("unit-test-secret-that-is-long-enough", DEFAULT_DATABASE_URL, None).unwrap()
    }

    fn account() -> NewAccount {
        NewAccount {
            email: " Asha@Example.com ".to_string(),
            password: "SecurePass123".to_string(),
            firstname: "Asha".to_string(),
            lastname: "Rao".to_string(),
            phone: "9876543210".to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_issues_token_for_new_customer() {
        let mut uow = TestUnitOfWork::default();
        uow.users
            .expect_find_by_email()
            .with(eq("asha@example.com"))
            .returning(|_| Ok(None));
        uow.users.expect_find_by_phone().returning(|_| Ok(None));
        uow.users.expect_create().returning(|new_user| {
            assert_eq!(new_user.email, "asha@example.com");
            assert_ne!(new_user.password_hash, "SecurePass123");
            let mut created = user(UserRole::Customer);
            created.email = new_user.email;
            Ok(created)
        });

        let service = Authenticator::new(uow.into_arc(), config());
        let token = service.signup(account()).await.unwrap();

        assert_eq!(token.jwt, format!("Bearer {}", token.access_token));
        assert_eq!(token.token_type, "Bearer");
        let claims = service.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.role, "customer");
        assert_eq!(claims.name, "Asha Rao");
    }

    #[tokio::test]
    async fn test_signup_rejects_taken_email() {
        let mut uow = TestUnitOfWork::default();
        uow.users
            .expect_find_by_email()
            .returning(|_| Ok(Some(user(UserRole::Customer))));

        let service = Authenticator::new(uow.into_arc(), config());
        let err = service.signup(account()).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref m) if m.contains("Email")));
    }

    #[tokio::test]
    async fn test_signup_rejects_taken_phone() {
        let mut uow = TestUnitOfWork::default();
        uow.users.expect_find_by_email().returning(|_| Ok(None));
        uow.users
            .expect_find_by_phone()
            .with(eq("9876543210"))
            .returning(|_| Ok(Some(user(UserRole::Customer))));

        let service = Authenticator::new(uow.into_arc(), config());
        let err = service.signup(account()).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref m) if m.contains("Phone")));
    }

    #[tokio::test]
    async fn test_signin_with_valid_password() {
        let hash = Password::new("SecurePass123").unwrap().into_string();
        let mut uow = TestUnitOfWork::default();
        uow.users.expect_find_by_email().returning(move |_| {
            let mut existing = user(UserRole::Admin);
            existing.password_hash = hash.clone();
            Ok(Some(existing))
        });

        let service = Authenticator::new(uow.into_arc(), config());
        let token = service
            .signin("asha@example.com".into(), "SecurePass123".into())
            .await
            .unwrap();

        let claims = service.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.role, "admin");
    }

    #[tokio::test]
    async fn test_signin_failures_look_the_same() {
        let hash = Password::new("SecurePass123").unwrap().into_string();
        let mut uow = TestUnitOfWork::default();
        uow.users
            .expect_find_by_email()
            .with(eq("known@example.com"))
            .returning(move |_| {
                let mut existing = user(UserRole::Customer);
                existing.password_hash = hash.clone();
                Ok(Some(existing))
            });
        uow.users
            .expect_find_by_email()
            .with(eq("nobody@example.com"))
            .returning(|_| Ok(None));

        let service = Authenticator::new(uow.into_arc(), config());
        let wrong_password = service
            .signin("known@example.com".into(), "WrongPass123".into())
            .await
            .unwrap_err();
        let unknown_user = service
            .signin("nobody@example.com".into(), "SecurePass123".into())
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_user, AppError::InvalidCredentials));
    }

    #[test]
    fn test_verify_rejects_foreign_token() {
        let other = Config::build("another-secret-that-is-long-enough!!", DEFAULT_DATABASE_URL, None)
            .unwrap();
        let token = generate_token(&user(UserRole::Customer), &other).unwrap();

        let service = Authenticator::new(TestUnitOfWork::default().into_arc(), config());
        assert!(matches!(
            service.verify_token(&token.access_token),
            Err(AppError::Jwt(_))
        ));
    }
}
