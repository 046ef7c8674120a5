//! Repository layer - Data access abstraction
//!
//! One trait per aggregate, each with a SeaORM-backed `*Store`. Traits are
//! mockable under `test` or the `test-utils` feature.

mod address_repository;
mod category_repository;
pub(crate) mod entities;
mod order_repository;
mod product_repository;
pub(crate) mod queries;
mod user_repository;

pub use address_repository::{AddressRepository, AddressStore};
pub use category_repository::{CategoryRepository, CategoryStore};
pub use order_repository::{OrderRepository, OrderStore};
pub use product_repository::{ProductRepository, ProductStore};
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use address_repository::MockAddressRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use category_repository::MockCategoryRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use order_repository::MockOrderRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use product_repository::MockProductRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
