//! Domain layer - Core business entities and logic
//!
//! Entities and value objects for accounts, the catalog and orders, plus
//! the pure cart arithmetic. Nothing here touches the database.

pub mod address;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod password;
pub mod user;

pub use address::{Address, AddressChanges, NewAddress};
pub use cart::{CartMutation, LineChange};
pub use catalog::{
    Category, CategoryRef, CategoryWithCount, NewProduct, Product, ProductChanges, ProductFilter,
    ProductImage, ProductSummary,
};
pub use order::{
    round_money, AdminOrder, AdminOrderResponse, CategoryRevenue, Order, OrderDetails, OrderItem,
    OrderItemResponse, OrderLine, OrderResponse, OrderStatus, SalesAnalytics,
};
pub use password::{Password, DUMMY_HASH};
pub use user::{NewUser, ProfileChanges, User, UserProfile, UserResponse, UserRole, UserSummary};
