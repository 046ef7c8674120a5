//! Unit of Work pattern implementation.
//!
//! Centralizes repository access and runs cart mutations and checkout
//! inside a single database transaction.

use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, AccessMode, ActiveModelTrait, ColumnTrait, DatabaseConnection,
    DatabaseTransaction, EntityTrait, IsolationLevel, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use super::repositories::entities::{order, order_item, product};
use super::repositories::queries::{order_with_lines, pending_order};
use super::repositories::{
    AddressRepository, AddressStore, CategoryRepository, CategoryStore, OrderRepository,
    OrderStore, ProductRepository, ProductStore, UserRepository, UserStore,
};
use crate::config::STATUS_PENDING;
use crate::domain::{
    CartMutation, LineChange, Order, OrderDetails, OrderStatus, ProductSummary,
};
use crate::errors::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
///
/// Not mockable directly because of the generic `transaction` method; tests
/// provide a small hand-written implementation instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn addresses(&self) -> Arc<dyn AddressRepository>;

    fn categories(&self) -> Arc<dyn CategoryRepository>;

    fn products(&self) -> Arc<dyn ProductRepository>;

    fn orders(&self) -> Arc<dyn OrderRepository>;

    /// Execute a closure within a transaction.
    ///
    /// Commits when the closure succeeds and rolls back when it fails.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send;
}

/// Repository access bound to one open transaction.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub fn orders(&self) -> TxOrderRepository<'_> {
        TxOrderRepository { txn: self.txn }
    }

    pub fn products(&self) -> TxProductRepository<'_> {
        TxProductRepository { txn: self.txn }
    }
}

/// SeaORM-backed UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    address_repo: Arc<AddressStore>,
    category_repo: Arc<CategoryStore>,
    product_repo: Arc<ProductStore>,
    order_repo: Arc<OrderStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            user_repo: Arc::new(UserStore::new(db.clone())),
            address_repo: Arc::new(AddressStore::new(db.clone())),
            category_repo: Arc::new(CategoryStore::new(db.clone())),
            product_repo: Arc::new(ProductStore::new(db.clone())),
            order_repo: Arc::new(OrderStore::new(db.clone())),
            db,
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn addresses(&self) -> Arc<dyn AddressRepository> {
        self.address_repo.clone()
    }

    fn categories(&self) -> Arc<dyn CategoryRepository> {
        self.category_repo.clone()
    }

    fn products(&self) -> Arc<dyn ProductRepository> {
        self.product_repo.clone()
    }

    fn orders(&self) -> Arc<dyn OrderRepository> {
        self.order_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            )
            .await?;

        match f(TransactionContext::new(&txn)).await {
            Ok(result) => {
                txn.commit().await?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// Cart and checkout writes against the user's orders.
pub struct TxOrderRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxOrderRepository<'a> {
    /// Load the user's cart and lock its order row until commit.
    pub async fn find_pending_for_update(&self, user_id: Uuid) -> AppResult<Option<OrderDetails>> {
        let model = pending_order(user_id)
            .lock_exclusive()
            .one(self.txn)
            .await?;

        order_with_lines(self.txn, model).await
    }

    /// Open an empty cart for the user.
    pub async fn create_pending(&self, user_id: Uuid) -> AppResult<OrderDetails> {
        let now = chrono::Utc::now();
        let model = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            status: Set(STATUS_PENDING.to_string()),
            total_price: Set(rust_decimal::Decimal::ZERO),
            address_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            placed_at: Set(None),
        }
        .insert(self.txn)
        .await?;

        Ok(OrderDetails {
            order: Order::try_from(model)?,
            lines: Vec::new(),
        })
    }

    /// Persist a computed cart mutation for `product` on `order_id`.
    pub async fn apply(
        &self,
        order_id: Uuid,
        product: &ProductSummary,
        mutation: CartMutation,
    ) -> AppResult<()> {
        match mutation.line {
            LineChange::Insert {
                quantity,
                total_price,
            } => {
                order_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    order_id: Set(order_id),
                    product_id: Set(product.id),
                    category_id: Set(product.category_id),
                    quantity: Set(quantity),
                    total_price: Set(total_price),
                }
                .insert(self.txn)
                .await?;
            }
            LineChange::Update {
                item_id,
                quantity,
                total_price,
            } => {
                order_item::Entity::update_many()
                    .col_expr(order_item::Column::Quantity, Expr::value(quantity))
                    .col_expr(order_item::Column::TotalPrice, Expr::value(total_price))
                    .filter(order_item::Column::Id.eq(item_id))
                    .exec(self.txn)
                    .await?;
            }
            LineChange::Delete { item_id } => {
                order_item::Entity::delete_by_id(item_id)
                    .exec(self.txn)
                    .await?;
            }
        }

        order::Entity::update_many()
            .col_expr(order::Column::TotalPrice, Expr::value(mutation.order_total))
            .col_expr(order::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(order::Column::Id.eq(order_id))
            .exec(self.txn)
            .await?;

        Ok(())
    }

    /// Turn a pending cart into a placed order shipping to `address_id`.
    pub async fn mark_placed(&self, order_id: Uuid, address_id: Uuid) -> AppResult<()> {
        let now = chrono::Utc::now();
        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(OrderStatus::Processing.as_str()))
            .col_expr(order::Column::AddressId, Expr::value(address_id))
            .col_expr(order::Column::PlacedAt, Expr::value(now))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::Status.eq(STATUS_PENDING))
            .exec(self.txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("Cart"));
        }

        Ok(())
    }

    pub async fn find_details(&self, order_id: Uuid) -> AppResult<OrderDetails> {
        let model = order::Entity::find_by_id(order_id).one(self.txn).await?;

        order_with_lines(self.txn, model)
            .await?
            .ok_or_else(|| AppError::not_found("Order"))
    }
}

/// Product reads and stock changes inside a transaction.
pub struct TxProductRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxProductRepository<'a> {
    pub async fn find_summary(&self, id: Uuid) -> AppResult<Option<ProductSummary>> {
        let model = product::Entity::find_by_id(id).one(self.txn).await?;
        Ok(model.map(ProductSummary::from))
    }

    /// Take `quantity` units out of stock unless fewer remain.
    ///
    /// Returns `false` when the guard rejected the update.
    pub async fn decrement_stock(&self, id: Uuid, quantity: i32) -> AppResult<bool> {
        let result = product::Entity::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).sub(quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(product::Column::Id.eq(id))
            .filter(product::Column::Stock.gte(quantity))
            .exec(self.txn)
            .await?;

        Ok(result.rows_affected == 1)
    }
}

/// Run a block inside `$uow.transaction`, binding the context to `$ctx`.
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}
