//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Cache, Database};
use crate::services::{
    AddressService, AdminService, AuthService, CartService, CatalogService, ServiceContainer,
    Services, UserService,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pub address_service: Arc<dyn AddressService>,
    pub catalog_service: Arc<dyn CatalogService>,
    pub cart_service: Arc<dyn CartService>,
    pub admin_service: Arc<dyn AdminService>,
    /// Product listing cache and rate-limit counters
    pub cache: Arc<Cache>,
    pub database: Arc<Database>,
    /// Whether rate limiting keys on proxy headers instead of the peer
    pub trust_proxy_headers: bool,
}

impl AppState {
    /// Build every service over the database connection.
    pub fn from_config(database: Arc<Database>, cache: Arc<Cache>, config: Config) -> Self {
        let trust_proxy_headers = config.trust_proxy_headers;
        let services = Services::from_connection(database.get_connection(), config);
        Self {
            trust_proxy_headers,
            ..Self::from_container(&services, cache, database)
        }
    }

    /// Take the services out of any container, e.g. a mocked one in tests.
    ///
    /// Proxy headers are not trusted.
    pub fn from_container(
        services: &dyn ServiceContainer,
        cache: Arc<Cache>,
        database: Arc<Database>,
    ) -> Self {
        Self {
            auth_service: services.auth(),
            user_service: services.users(),
            address_service: services.addresses(),
            catalog_service: services.catalog(),
            cart_service: services.cart(),
            admin_service: services.admin(),
            cache,
            database,
            trust_proxy_headers: false,
        }
    }
}
