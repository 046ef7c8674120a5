//! Order repository: read models and admin status changes.
//!
//! Cart mutations and checkout go through the transaction-scoped
//! repositories in `unit_of_work` instead.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use super::entities::order::{self, Entity as OrderEntity};
use super::entities::{category, order_item};
use super::queries::{order_with_lines, orders_with_lines, pending_order};
use crate::config::{STATUS_DELIVERED, STATUS_PENDING};
use crate::domain::{CategoryRevenue, Order, OrderDetails, OrderStatus};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// The user's cart, if they have one.
    async fn find_pending(&self, user_id: Uuid) -> AppResult<Option<OrderDetails>>;

    /// All of a user's orders, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<OrderDetails>>;

    /// One page of non-pending orders, newest first, with the total count.
    async fn list_placed(&self, params: PaginationParams)
        -> AppResult<(Vec<OrderDetails>, u64)>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<OrderDetails>>;

    /// Move the order from `from` to `to`. Conflict when it is no longer
    /// in `from`.
    async fn update_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> AppResult<Order>;

    /// Sum of totals of delivered orders.
    async fn delivered_revenue(&self) -> AppResult<Decimal>;

    /// Item revenue of placed orders per category, ordered by category id.
    async fn revenue_by_category(&self) -> AppResult<Vec<CategoryRevenue>>;
}

pub struct OrderStore {
    db: DatabaseConnection,
}

impl OrderStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderRepository for OrderStore {
    async fn find_pending(&self, user_id: Uuid) -> AppResult<Option<OrderDetails>> {
        let model = pending_order(user_id).one(&self.db).await?;
        order_with_lines(&self.db, model).await
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<OrderDetails>> {
        let models = OrderEntity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.db)
            .await?;

        orders_with_lines(&self.db, models).await
    }

    async fn list_placed(
        &self,
        params: PaginationParams,
    ) -> AppResult<(Vec<OrderDetails>, u64)> {
        let paginator = OrderEntity::find()
            .filter(order::Column::Status.ne(STATUS_PENDING))
            .order_by_desc(order::Column::PlacedAt)
            .order_by_desc(order::Column::CreatedAt)
            .paginate(&self.db, params.limit());

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(params.page_index()).await?;

        Ok((orders_with_lines(&self.db, models).await?, total))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<OrderDetails>> {
        let model = OrderEntity::find_by_id(id).one(&self.db).await?;
        order_with_lines(&self.db, model).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> AppResult<Order> {
        let updated = OrderEntity::update_many()
            .col_expr(order::Column::Status, Expr::value(to.as_str()))
            .col_expr(order::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::Status.eq(from.as_str()))
            .exec_with_returning(&self.db)
            .await?;

        let model = updated.into_iter().next().ok_or_else(|| {
            AppError::conflict(format!("Order is no longer {}", from))
        })?;
        Order::try_from(model)
    }

    async fn delivered_revenue(&self) -> AppResult<Decimal> {
        let total: Option<Option<Decimal>> = OrderEntity::find()
            .select_only()
            .column_as(order::Column::TotalPrice.sum(), "revenue")
            .filter(order::Column::Status.eq(STATUS_DELIVERED))
            .into_tuple()
            .one(&self.db)
            .await?;

        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    async fn revenue_by_category(&self) -> AppResult<Vec<CategoryRevenue>> {
        let rows: Vec<(Uuid, String, Option<Decimal>)> = order_item::Entity::find()
            .select_only()
            .column(order_item::Column::CategoryId)
            .column_as(category::Column::Name, "category_name")
            .column_as(order_item::Column::TotalPrice.sum(), "revenue")
            .join(JoinType::InnerJoin, order_item::Relation::Order.def())
            .join(JoinType::InnerJoin, order_item::Relation::Category.def())
            .filter(order::Column::Status.ne(STATUS_PENDING))
            .group_by(order_item::Column::CategoryId)
            .group_by(category::Column::Name)
            .order_by_asc(order_item::Column::CategoryId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(category_id, category_name, revenue)| CategoryRevenue {
                category_id,
                category_name,
                revenue: revenue.unwrap_or(Decimal::ZERO),
            })
            .collect())
    }
}
