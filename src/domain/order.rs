//! Orders, order lines and the order status lifecycle.
//!
//! A user's single `pending` order doubles as their cart. Placing it moves
//! the order to `processing`; from there an admin drives it through
//! `shipped` and `delivered`, or cancels it before delivery.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::catalog::ProductSummary;
use super::user::UserSummary;
use crate::config::{
    MONEY_SCALE, STATUS_CANCELLED, STATUS_DELIVERED, STATUS_PENDING, STATUS_PROCESSING,
    STATUS_SHIPPED,
};
use crate::errors::{AppError, AppResult};

/// Round an amount to cents, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => STATUS_PENDING,
            OrderStatus::Processing => STATUS_PROCESSING,
            OrderStatus::Shipped => STATUS_SHIPPED,
            OrderStatus::Delivered => STATUS_DELIVERED,
            OrderStatus::Cancelled => STATUS_CANCELLED,
        }
    }

    /// Anything but `pending` has left the cart stage.
    pub fn is_placed(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Delivered)
                | (Shipped, Cancelled)
        )
    }

    /// Validate a move to `next`, returning it on success.
    pub fn transition_to(&self, next: OrderStatus) -> AppResult<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            STATUS_PENDING => Ok(OrderStatus::Pending),
            STATUS_PROCESSING => Ok(OrderStatus::Processing),
            STATUS_SHIPPED => Ok(OrderStatus::Shipped),
            STATUS_DELIVERED => Ok(OrderStatus::Delivered),
            STATUS_CANCELLED => Ok(OrderStatus::Cancelled),
            other => Err(AppError::validation(format!("Unknown order status: {}", other))),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub total_price: Decimal,
    pub address_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub placed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    /// Category of the product when the line was created
    pub category_id: Uuid,
    pub quantity: i32,
    pub total_price: Decimal,
}

/// An order line joined with its product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub item: OrderItem,
    pub product: ProductSummary,
}

/// An order with all of its lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDetails {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl OrderDetails {
    pub fn line_for(&self, product_id: Uuid) -> Option<&OrderLine> {
        self.lines.iter().find(|line| line.item.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// An order as listed on the admin dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminOrder {
    pub details: OrderDetails,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    #[schema(example = 2)]
    pub quantity: i32,
    #[schema(value_type = String, example = "498.00")]
    pub total_price: Decimal,
    pub product: ProductSummary,
}

impl From<OrderLine> for OrderItemResponse {
    fn from(line: OrderLine) -> Self {
        Self {
            id: line.item.id,
            product_id: line.item.product_id,
            quantity: line.item.quantity,
            total_price: line.item.total_price,
            product: line.product,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub status: OrderStatus,
    #[schema(value_type = String, example = "498.00")]
    pub total_price: Decimal,
    pub address_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub placed_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        let OrderDetails { order, lines } = details;
        Self {
            id: order.id,
            status: order.status,
            total_price: order.total_price,
            address_id: order.address_id,
            created_at: order.created_at,
            placed_at: order.placed_at,
            items: lines.into_iter().map(OrderItemResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub user: UserSummary,
}

impl From<AdminOrder> for AdminOrderResponse {
    fn from(admin_order: AdminOrder) -> Self {
        Self {
            order: admin_order.details.into(),
            user: admin_order.user,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRevenue {
    pub category_id: Uuid,
    pub category_name: String,
    #[schema(value_type = String, example = "1200.50")]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesAnalytics {
    /// Sum of totals of delivered orders
    #[schema(value_type = String, example = "5400.00")]
    pub delivered_revenue: Decimal,
    pub revenue_by_category: Vec<CategoryRevenue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lifecycle() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Cancelled));

        assert!(!Processing.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Processing.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(Cancelled));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Delivered.can_transition_to(next));
            assert!(!OrderStatus::Cancelled.can_transition_to(next));
        }
        assert!(OrderStatus::Delivered.is_terminal());
    }

    #[test]
    fn test_transition_error_names_both_states() {
        let err = OrderStatus::Delivered
            .transition_to(OrderStatus::Pending)
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot move order from delivered to pending");
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(" cancelled ".parse::<OrderStatus>().unwrap(), OrderStatus::Cancelled);
        assert!("returned".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(Decimal::new(10005, 3)), Decimal::new(1001, 2));
        assert_eq!(round_money(Decimal::new(10004, 3)), Decimal::new(1000, 2));
        assert_eq!(round_money(Decimal::new(-10005, 3)), Decimal::new(-1001, 2));
    }
}
