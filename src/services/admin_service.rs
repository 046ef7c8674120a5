//! Back-office operations on placed orders.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use super::container::parallel;
use crate::domain::{AdminOrder, OrderDetails, OrderStatus, SalesAnalytics, UserSummary};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

#[async_trait]
pub trait AdminService: Send + Sync {
    /// Placed orders with their customers, newest first.
    async fn list_orders(&self, params: PaginationParams) -> AppResult<Paginated<AdminOrder>>;

    async fn get_order(&self, id: Uuid) -> AppResult<AdminOrder>;

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> AppResult<AdminOrder>;

    async fn analytics(&self) -> AppResult<SalesAnalytics>;
}

pub struct Backoffice<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> Backoffice<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    /// Carts are invisible to admins.
    async fn placed_order(&self, id: Uuid) -> AppResult<OrderDetails> {
        self.uow
            .orders()
            .find_by_id(id)
            .await?
            .filter(|details| details.order.status.is_placed())
            .ok_or_not_found("Order")
    }

    async fn with_customer(&self, details: OrderDetails) -> AppResult<AdminOrder> {
        let user = self
            .uow
            .users()
            .find_by_id(details.order.user_id)
            .await?
            .ok_or_not_found("User")?;

        Ok(AdminOrder {
            user: UserSummary::from(&user),
            details,
        })
    }
}

#[async_trait]
impl<U: UnitOfWork> AdminService for Backoffice<U> {
    async fn list_orders(&self, params: PaginationParams) -> AppResult<Paginated<AdminOrder>> {
        let (orders, total) = self.uow.orders().list_placed(params).await?;

        let mut user_ids: Vec<Uuid> = orders.iter().map(|d| d.order.user_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let customers: HashMap<Uuid, UserSummary> = self
            .uow
            .users()
            .find_many(user_ids)
            .await?
            .iter()
            .map(|user| (user.id, UserSummary::from(user)))
            .collect();

        let data = orders
            .into_iter()
            .map(|details| {
                let user = customers
                    .get(&details.order.user_id)
                    .cloned()
                    .ok_or_not_found("User")?;
                Ok(AdminOrder { details, user })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Paginated::new(data, params, total))
    }

    async fn get_order(&self, id: Uuid) -> AppResult<AdminOrder> {
        let details = self.placed_order(id).await?;
        self.with_customer(details).await
    }

    async fn update_order_status(&self, id: Uuid, status: OrderStatus) -> AppResult<AdminOrder> {
        let current = self.placed_order(id).await?.order.status;
        if status == OrderStatus::Pending {
            return Err(AppError::InvalidTransition {
                from: current.to_string(),
                to: status.to_string(),
            });
        }
        current.transition_to(status)?;

        self.uow.orders().update_status(id, current, status).await?;
        tracing::info!(order_id = %id, from = %current, to = %status, "Order status changed");

        self.get_order(id).await
    }

    async fn analytics(&self) -> AppResult<SalesAnalytics> {
        let orders = self.uow.orders();
        let (delivered_revenue, revenue_by_category) =
            parallel::join2(orders.delivered_revenue(), orders.revenue_by_category()).await?;

        Ok(SalesAnalytics {
            delivered_revenue,
            revenue_by_category,
        })
    }
}
