//! Address book management, always scoped to the owning user.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Address, AddressChanges, NewAddress};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait AddressService: Send + Sync {
    async fn list(&self, user_id: Uuid) -> AppResult<Vec<Address>>;

    async fn add(&self, user_id: Uuid, address: NewAddress) -> AppResult<Address>;

    async fn update(&self, user_id: Uuid, id: Uuid, changes: AddressChanges)
        -> AppResult<Address>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()>;
}

pub struct AddressBook<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> AddressBook<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Someone else's address is reported as missing.
    async fn owned(&self, user_id: Uuid, id: Uuid) -> AppResult<Address> {
        self.uow
            .addresses()
            .find_for_user(user_id, id)
            .await?
            .ok_or_not_found("Address")
    }
}

#[async_trait]
impl<U: UnitOfWork> AddressService for AddressBook<U> {
    async fn list(&self, user_id: Uuid) -> AppResult<Vec<Address>> {
        self.uow.addresses().list_for_user(user_id).await
    }

    async fn add(&self, user_id: Uuid, address: NewAddress) -> AppResult<Address> {
        self.uow.addresses().create(user_id, address).await
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: AddressChanges,
    ) -> AppResult<Address> {
        let current = self.owned(user_id, id).await?;
        if changes.is_empty() {
            return Ok(current);
        }

        self.uow.addresses().update(id, changes).await
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> AppResult<()> {
        self.owned(user_id, id).await?;

        if self.uow.addresses().is_used_by_placed_order(id).await? {
            return Err(AppError::conflict("Address is used by a placed order"));
        }

        self.uow.addresses().delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::TestUnitOfWork;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn address(user_id: Uuid) -> Address {
        Address {
            id: Uuid::new_v4(),
            user_id,
            recipient_name: "Asha Rao".into(),
            recipient_phone: "9876543210".into(),
            street: "12 MG Road".into(),
            city: Some("Bengaluru".into()),
            state: None,
            zip_code: "560001".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_update_foreign_address_is_not_found() {
        let mut uow = TestUnitOfWork::default();
        uow.addresses.expect_find_for_user().returning(|_, _| Ok(None));
        uow.addresses.expect_update().never();

        let err = AddressBook::new(uow.into_arc())
            .update(
                Uuid::new_v4(),
                Uuid::new_v4(),
                AddressChanges {
                    street: Some("1 Elsewhere".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(ref e) if e == "Address"));
    }

    #[tokio::test]
    async fn test_delete_address_used_by_order_conflicts() {
        let user_id = Uuid::new_v4();
        let existing = address(user_id);
        let id = existing.id;

        let mut uow = TestUnitOfWork::default();
        uow.addresses
            .expect_find_for_user()
            .with(eq(user_id), eq(id))
            .returning(move |_, _| Ok(Some(existing.clone())));
        uow.addresses
            .expect_is_used_by_placed_order()
            .with(eq(id))
            .returning(|_| Ok(true));
        uow.addresses.expect_delete().never();

        let err = AddressBook::new(uow.into_arc())
            .delete(user_id, id)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_owned_address() {
        let user_id = Uuid::new_v4();
        let existing = address(user_id);
        let id = existing.id;

        let mut uow = TestUnitOfWork::default();
        uow.addresses
            .expect_find_for_user()
            .returning(move |_, _| Ok(Some(existing.clone())));
        uow.addresses
            .expect_is_used_by_placed_order()
            .returning(|_| Ok(false));
        uow.addresses
            .expect_delete()
            .with(eq(id))
            .times(1)
            .returning(|_| Ok(()));

        AddressBook::new(uow.into_arc())
            .delete(user_id, id)
            .await
            .unwrap();
    }
}
