//! Cart arithmetic.
//!
//! These functions compute what a cart mutation should write without
//! touching storage. The cart service applies the resulting
//! [`CartMutation`] inside a transaction.

use rust_decimal::Decimal;
use uuid::Uuid;

use super::order::{round_money, OrderItem, OrderLine};
use crate::errors::{AppError, AppResult};

/// What happens to the affected order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineChange {
    Insert {
        quantity: i32,
        total_price: Decimal,
    },
    Update {
        item_id: Uuid,
        quantity: i32,
        total_price: Decimal,
    },
    Delete {
        item_id: Uuid,
    },
}

/// A line change plus the order's new running total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartMutation {
    pub line: LineChange,
    pub order_total: Decimal,
}

/// Price of a single unit on an existing line.
pub fn unit_price(item: &OrderItem) -> Decimal {
    if item.quantity <= 0 {
        return Decimal::ZERO;
    }
    round_money(item.total_price / Decimal::from(item.quantity))
}

/// Add one unit of a product priced at `unit_price`.
pub fn add_unit(
    order_total: Decimal,
    existing: Option<&OrderItem>,
    unit_price: Decimal,
) -> CartMutation {
    let line = match existing {
        Some(item) => LineChange::Update {
            item_id: item.id,
            quantity: item.quantity + 1,
            total_price: round_money(item.total_price + unit_price),
        },
        None => LineChange::Insert {
            quantity: 1,
            total_price: round_money(unit_price),
        },
    };

    CartMutation {
        line,
        order_total: round_money(order_total + unit_price),
    }
}

/// Remove one unit from `item`, dropping the line when it was the last.
pub fn remove_unit(order_total: Decimal, item: &OrderItem) -> CartMutation {
    let (line, removed) = if item.quantity > 1 {
        let price = unit_price(item);
        (
            LineChange::Update {
                item_id: item.id,
                quantity: item.quantity - 1,
                total_price: round_money(item.total_price - price).max(Decimal::ZERO),
            },
            price,
        )
    } else {
        (LineChange::Delete { item_id: item.id }, item.total_price)
    };

    CartMutation {
        line,
        order_total: round_money(order_total - removed).max(Decimal::ZERO),
    }
}

/// Every line must fit in its product's current stock.
pub fn check_stock(lines: &[OrderLine]) -> AppResult<()> {
    match lines
        .iter()
        .find(|line| line.item.quantity > line.product.stock)
    {
        Some(line) => Err(AppError::OutOfStock(line.product.name.clone())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductSummary;

    fn money(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    fn item(quantity: i32, total_cents: i64) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            quantity,
            total_price: money(total_cents),
        }
    }

    fn line(name: &str, quantity: i32, stock: i32) -> OrderLine {
        let item = item(quantity, 1000 * i64::from(quantity));
        OrderLine {
            product: ProductSummary {
                id: item.product_id,
                name: name.to_string(),
                price: money(1000),
                stock,
                quantity: None,
                weight: None,
                category_id: item.category_id,
            },
            item,
        }
    }

    #[test]
    fn test_add_unit_creates_line() {
        let mutation = add_unit(Decimal::ZERO, None, money(24900));

        assert_eq!(
            mutation.line,
            LineChange::Insert {
                quantity: 1,
                total_price: money(24900)
            }
        );
        assert_eq!(mutation.order_total, money(24900));
    }

    #[test]
    fn test_add_unit_increments_existing_line() {
        let existing = item(2, 500);
        let mutation = add_unit(money(800), Some(&existing), money(250));

        assert_eq!(
            mutation.line,
            LineChange::Update {
                item_id: existing.id,
                quantity: 3,
                total_price: money(750)
            }
        );
        assert_eq!(mutation.order_total, money(1050));
    }

    #[test]
    fn test_remove_unit_decrements_by_unit_price() {
        let existing = item(3, 999);
        let mutation = remove_unit(money(1500), &existing);

        assert_eq!(
            mutation.line,
            LineChange::Update {
                item_id: existing.id,
                quantity: 2,
                total_price: money(666)
            }
        );
        assert_eq!(mutation.order_total, money(1167));
    }

    #[test]
    fn test_remove_last_unit_deletes_line() {
        let existing = item(1, 499);
        let mutation = remove_unit(money(499), &existing);

        assert_eq!(mutation.line, LineChange::Delete { item_id: existing.id });
        assert_eq!(mutation.order_total, Decimal::ZERO);
    }

    #[test]
    fn test_remove_never_goes_negative() {
        let existing = item(1, 499);
        let mutation = remove_unit(money(100), &existing);

        assert_eq!(mutation.order_total, Decimal::ZERO);
    }

    #[test]
    fn test_add_then_remove_restores_total() {
        let start = money(1234);
        let added = add_unit(start, None, money(333));
        assert_eq!(added.order_total, money(1567));

        let removed = remove_unit(added.order_total, &item(1, 333));

        assert_eq!(removed.order_total, start);
    }

    #[test]
    fn test_unit_price_rounds() {
        assert_eq!(unit_price(&item(3, 1000)), money(333));
        assert_eq!(unit_price(&item(0, 1000)), Decimal::ZERO);
    }

    #[test]
    fn test_check_stock_reports_first_shortage() {
        let lines = vec![
            line("Basmati Rice", 2, 5),
            line("Mango Pickle", 4, 3),
            line("Green Tea", 9, 1),
        ];

        let err = check_stock(&lines).unwrap_err();
        assert!(matches!(err, AppError::OutOfStock(ref name) if name == "Mango Pickle"));
    }

    #[test]
    fn test_check_stock_allows_exact_stock() {
        assert!(check_stock(&[line("Basmati Rice", 5, 5)]).is_ok());
        assert!(check_stock(&[]).is_ok());
    }
}
