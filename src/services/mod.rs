//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure through the
//! Unit of Work and are consumed as trait objects.

mod address_service;
mod admin_service;
mod auth_service;
mod cart_service;
mod catalog_service;
pub mod container;
mod user_service;

#[cfg(test)]
mod test_support;

// Service Container
pub use container::{parallel, ServiceContainer, Services};

// Service traits and implementations
pub use address_service::{AddressBook, AddressService};
pub use admin_service::{AdminService, Backoffice};
pub use auth_service::{AuthService, Authenticator, Claims, NewAccount, TokenResponse};
pub use cart_service::{CartService, Checkout};
pub use catalog_service::{Catalog, CatalogService};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
