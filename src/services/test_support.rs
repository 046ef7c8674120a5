//! Hand-written UnitOfWork over mockall repositories for service tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{
    CategoryRef, Order, OrderDetails, OrderItem, OrderLine, OrderStatus, Product, ProductSummary,
    User, UserRole,
};
use crate::errors::{AppError, AppResult};
use crate::infra::repositories::{
    MockAddressRepository, MockCategoryRepository, MockOrderRepository, MockProductRepository,
    MockUserRepository,
};
use crate::infra::{
    AddressRepository, CategoryRepository, OrderRepository, ProductRepository,
    TransactionContext, UnitOfWork, UserRepository,
};

/// Repositories default to mocks with no expectations, so any
/// unexpected call fails the test.
#[derive(Default)]
pub struct TestUnitOfWork {
    pub users: MockUserRepository,
    pub addresses: MockAddressRepository,
    pub categories: MockCategoryRepository,
    pub products: MockProductRepository,
    pub orders: MockOrderRepository,
}

impl TestUnitOfWork {
    pub fn into_arc(self) -> Arc<FrozenUnitOfWork> {
        Arc::new(FrozenUnitOfWork {
            users: Arc::new(self.users),
            addresses: Arc::new(self.addresses),
            categories: Arc::new(self.categories),
            products: Arc::new(self.products),
            orders: Arc::new(self.orders),
        })
    }
}

/// The configured mocks, shared behind `Arc`s.
pub struct FrozenUnitOfWork {
    users: Arc<MockUserRepository>,
    addresses: Arc<MockAddressRepository>,
    categories: Arc<MockCategoryRepository>,
    products: Arc<MockProductRepository>,
    orders: Arc<MockOrderRepository>,
}

#[async_trait]
impl UnitOfWork for FrozenUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn addresses(&self) -> Arc<dyn AddressRepository> {
        self.addresses.clone()
    }

    fn categories(&self) -> Arc<dyn CategoryRepository> {
        self.categories.clone()
    }

    fn products(&self) -> Arc<dyn ProductRepository> {
        self.products.clone()
    }

    fn orders(&self) -> Arc<dyn OrderRepository> {
        self.orders.clone()
    }

    async fn transaction<F, T>(&self, _f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        Err(AppError::internal("transactions need a database"))
    }
}

pub fn user(role: UserRole) -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        email: "asha@example.com".to_string(),
        phone: "9876543210".to_string(),
        firstname: "Asha".to_string(),
        lastname: "Rao".to_string(),
        password_hash: "hashed".to_string(),
        role,
        created_at: now,
        updated_at: now,
    }
}

pub fn product(name: &str, price_cents: i64, stock: i32) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: None,
        price: Decimal::new(price_cents, 2),
        stock,
        quantity: Some("1 kg".to_string()),
        weight: None,
        category: CategoryRef {
            id: Uuid::new_v4(),
            name: "Groceries".to_string(),
        },
        images: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn order(user_id: Uuid, status: OrderStatus, lines: Vec<(Product, i32)>) -> OrderDetails {
    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let lines: Vec<OrderLine> = lines
        .into_iter()
        .map(|(product, quantity)| OrderLine {
            item: OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: product.id,
                category_id: product.category.id,
                quantity,
                total_price: product.price * Decimal::from(quantity),
            },
            product: ProductSummary::from(&product),
        })
        .collect();

    OrderDetails {
        order: Order {
            id: order_id,
            user_id,
            status,
            total_price: lines.iter().map(|l| l.item.total_price).sum(),
            address_id: None,
            created_at: now,
            updated_at: now,
            placed_at: status.is_placed().then_some(now),
        },
        lines,
    }
}
