//! Address repository implementation.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::entities::address::{self, ActiveModel, Entity as AddressEntity};
use super::entities::order;
use crate::config::STATUS_PENDING;
use crate::domain::{Address, AddressChanges, NewAddress};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Address book access. Lookups are always scoped to an owner.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Address>>;

    /// Find an address only if `user_id` owns it.
    async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Address>>;

    async fn create(&self, user_id: Uuid, address: NewAddress) -> AppResult<Address>;

    async fn update(&self, id: Uuid, changes: AddressChanges) -> AppResult<Address>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Whether any placed order ships to this address.
    async fn is_used_by_placed_order(&self, id: Uuid) -> AppResult<bool>;
}

pub struct AddressStore {
    db: DatabaseConnection,
}

impl AddressStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AddressRepository for AddressStore {
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Address>> {
        let models = AddressEntity::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_asc(address::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Address::from).collect())
    }

    async fn find_for_user(&self, user_id: Uuid, id: Uuid) -> AppResult<Option<Address>> {
        let result = AddressEntity::find_by_id(id)
            .filter(address::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        Ok(result.map(Address::from))
    }

    async fn create(&self, user_id: Uuid, address: NewAddress) -> AppResult<Address> {
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            recipient_name: Set(address.recipient_name),
            recipient_phone: Set(address.recipient_phone),
            street: Set(address.street),
            city: Set(address.city),
            state: Set(address.state),
            zip_code: Set(address.zip_code),
            created_at: Set(chrono::Utc::now()),
        };

        let model = active_model.insert(&self.db).await?;
        Ok(Address::from(model))
    }

    async fn update(&self, id: Uuid, changes: AddressChanges) -> AppResult<Address> {
        let model = AddressEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Address"))?;

        let mut active: ActiveModel = model.into();
        if let Some(recipient_name) = changes.recipient_name {
            active.recipient_name = Set(recipient_name);
        }
        if let Some(recipient_phone) = changes.recipient_phone {
            active.recipient_phone = Set(recipient_phone);
        }
        if let Some(street) = changes.street {
            active.street = Set(street);
        }
        if let Some(city) = changes.city {
            active.city = Set(Some(city));
        }
        if let Some(state) = changes.state {
            active.state = Set(Some(state));
        }
        if let Some(zip_code) = changes.zip_code {
            active.zip_code = Set(zip_code);
        }

        let model = active.update(&self.db).await?;
        Ok(Address::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = AddressEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("Address"));
        }

        Ok(())
    }

    async fn is_used_by_placed_order(&self, id: Uuid) -> AppResult<bool> {
        let count = order::Entity::find()
            .filter(order::Column::AddressId.eq(id))
            .filter(order::Column::Status.ne(STATUS_PENDING))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}
