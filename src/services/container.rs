//! Service container and small concurrency helpers.
//!
//! Every service is built over the same [`Persistence`] unit of work and
//! exposed as a trait object, so the HTTP layer never sees a concrete type.

use std::future::Future;
use std::sync::Arc;

use super::{
    AddressBook, AddressService, AdminService, AuthService, Authenticator, Backoffice, Catalog,
    CatalogService, CartService, Checkout, UserManager, UserService,
};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::Persistence;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn users(&self) -> Arc<dyn UserService>;

    fn addresses(&self) -> Arc<dyn AddressService>;

    fn catalog(&self) -> Arc<dyn CatalogService>;

    fn cart(&self) -> Arc<dyn CartService>;

    fn admin(&self) -> Arc<dyn AdminService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    address_service: Arc<dyn AddressService>,
    catalog_service: Arc<dyn CatalogService>,
    cart_service: Arc<dyn CartService>,
    admin_service: Arc<dyn AdminService>,
}

impl Services {
    /// Wire every service over one database connection.
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: Config) -> Self {
        let uow = Arc::new(Persistence::new(db));

        Self {
            auth_service: Arc::new(Authenticator::new(uow.clone(), config)),
            user_service: Arc::new(UserManager::new(uow.clone())),
            address_service: Arc::new(AddressBook::new(uow.clone())),
            catalog_service: Arc::new(Catalog::new(uow.clone())),
            cart_service: Arc::new(Checkout::new(uow.clone())),
            admin_service: Arc::new(Backoffice::new(uow)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn addresses(&self) -> Arc<dyn AddressService> {
        self.address_service.clone()
    }

    fn catalog(&self) -> Arc<dyn CatalogService> {
        self.catalog_service.clone()
    }

    fn cart(&self) -> Arc<dyn CartService> {
        self.cart_service.clone()
    }

    fn admin(&self) -> Arc<dyn AdminService> {
        self.admin_service.clone()
    }
}

/// Run independent lookups concurrently on the current task.
pub mod parallel {
    use super::*;
    use tokio::try_join;

    /// Await both futures; the first error wins.
    pub async fn join2<F1, F2, T1, T2>(f1: F1, f2: F2) -> AppResult<(T1, T2)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
    {
        try_join!(f1, f2)
    }

    pub async fn join3<F1, F2, F3, T1, T2, T3>(
        f1: F1,
        f2: F2,
        f3: F3,
    ) -> AppResult<(T1, T2, T3)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
        F3: Future<Output = AppResult<T3>>,
    {
        try_join!(f1, f2, f3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[tokio::test]
    async fn test_join2_returns_both_values() {
        let (a, b) = parallel::join2(async { Ok(1) }, async { Ok("two") })
            .await
            .unwrap();

        assert_eq!(a, 1);
        assert_eq!(b, "two");
    }

    #[tokio::test]
    async fn test_join3_fails_fast() {
        let result: AppResult<(i32, i32, i32)> = parallel::join3(
            async { Ok(1) },
            async { Err(AppError::not_found("User")) },
            async { Ok(3) },
        )
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_container_hands_out_shared_services() {
        let config = Config::build(
            "unit-test-secret-that-is-long-enough",
            crate::config::DEFAULT_DATABASE_URL,
            None,
        )
        .unwrap();
        let services =
            Services::from_connection(sea_orm::DatabaseConnection::Disconnected, config);

        assert!(Arc::ptr_eq(&services.cart(), &services.cart()));
    }
}
