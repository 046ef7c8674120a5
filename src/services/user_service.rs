//! User service - profile reads and updates, role management.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::container::parallel;
use crate::domain::{OrderResponse, ProfileChanges, User, UserProfile, UserResponse, UserRole};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, id: Uuid) -> AppResult<User>;

    /// The user together with their addresses and every order.
    async fn get_profile(&self, id: Uuid) -> AppResult<UserProfile>;

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User>;

    /// Change the role of the account registered under `email`.
    async fn set_role(&self, email: &str, role: UserRole) -> AppResult<User>;
}

pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_user(&self, id: Uuid) -> AppResult<User> {
        self.uow.users().find_by_id(id).await?.ok_or_not_found("User")
    }

    async fn get_profile(&self, id: Uuid) -> AppResult<UserProfile> {
        let (user, addresses, orders) = parallel::join3(
            self.get_user(id),
            self.uow.addresses().list_for_user(id),
            self.uow.orders().list_for_user(id),
        )
        .await?;

        Ok(UserProfile {
            user: UserResponse::from(user),
            addresses,
            orders: orders.into_iter().map(OrderResponse::from).collect(),
        })
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> AppResult<User> {
        if changes.is_empty() {
            return self.get_user(id).await;
        }

        if let Some(phone) = changes.phone.as_deref() {
            if let Some(owner) = self.uow.users().find_by_phone(phone).await? {
                if owner.id != id {
                    return Err(AppError::conflict("Phone already registered"));
                }
            }
        }

        self.uow.users().update_profile(id, changes).await
    }

    async fn set_role(&self, email: &str, role: UserRole) -> AppResult<User> {
        let user = self
            .uow
            .users()
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_not_found("User")?;

        if user.role == role {
            return Ok(user);
        }

        let updated = self.uow.users().set_role(user.id, role).await?;
        tracing::info!(user_id = %updated.id, role = %role, "User role changed");
        Ok(updated)
    }
}
