//! Shopping cart and checkout.
//!
//! A user's cart is their single `pending` order. Mutations lock that order
//! row for the duration of the transaction, so concurrent requests from the
//! same user are applied one after the other. Checkout decrements stock with
//! a guarded update and never lets it go negative.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{cart, OrderDetails, ProductSummary};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait CartService: Send + Sync {
    /// The pending order, if the user has one.
    async fn get_cart(&self, user_id: Uuid) -> AppResult<Option<OrderDetails>>;

    async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid) -> AppResult<OrderDetails>;

    async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid) -> AppResult<OrderDetails>;

    /// Check out the cart, shipping to one of the user's addresses.
    async fn place_order(&self, user_id: Uuid, address_id: Uuid) -> AppResult<OrderDetails>;

    /// Every order of the user, newest first.
    async fn order_history(&self, user_id: Uuid) -> AppResult<Vec<OrderDetails>>;
}

pub struct Checkout<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> Checkout<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

fn placeable(cart: Option<OrderDetails>) -> AppResult<OrderDetails> {
    let cart = cart.ok_or_not_found("Cart")?;
    if cart.is_empty() {
        return Err(AppError::EmptyCart);
    }
    cart::check_stock(&cart.lines)?;
    Ok(cart)
}

fn line_product(cart: Option<&OrderDetails>, product_id: Uuid) -> AppResult<ProductSummary> {
    let cart = cart.ok_or_not_found("Cart")?;
    cart.line_for(product_id)
        .map(|line| line.product.clone())
        .ok_or_not_found("Cart item")
}

#[async_trait]
impl<U: UnitOfWork> CartService for Checkout<U> {
    async fn get_cart(&self, user_id: Uuid) -> AppResult<Option<OrderDetails>> {
        self.uow.orders().find_pending(user_id).await
    }

    async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid) -> AppResult<OrderDetails> {
        self.uow
            .products()
            .find_by_id(product_id)
            .await?
            .ok_or_not_found("Product")?;

        let details = crate::with_transaction!(self.uow, |ctx| {
            // Price as of this transaction
            let product = ctx
                .products()
                .find_summary(product_id)
                .await?
                .ok_or_not_found("Product")?;

            let orders = ctx.orders();
            let current = match orders.find_pending_for_update(user_id).await? {
                Some(current) => current,
                None => orders.create_pending(user_id).await?,
            };

            let existing = current.line_for(product.id).map(|line| &line.item);
            let mutation = cart::add_unit(current.order.total_price, existing, product.price);
            orders.apply(current.order.id, &product, mutation).await?;

            orders.find_details(current.order.id).await
        })?;

        tracing::debug!(%user_id, %product_id, total = %details.order.total_price, "Added to cart");
        Ok(details)
    }

    async fn remove_from_cart(&self, user_id: Uuid, product_id: Uuid) -> AppResult<OrderDetails> {
        let pending = self.uow.orders().find_pending(user_id).await?;
        line_product(pending.as_ref(), product_id)?;

        let details = crate::with_transaction!(self.uow, |ctx| {
            let orders = ctx.orders();
            let current = orders
                .find_pending_for_update(user_id)
                .await?
                .ok_or_not_found("Cart")?;
            let line = current
                .line_for(product_id)
                .cloned()
                .ok_or_not_found("Cart item")?;

            let mutation = cart::remove_unit(current.order.total_price, &line.item);
            orders.apply(current.order.id, &line.product, mutation).await?;

            orders.find_details(current.order.id).await
        })?;

        tracing::debug!(%user_id, %product_id, total = %details.order.total_price, "Removed from cart");
        Ok(details)
    }

    async fn place_order(&self, user_id: Uuid, address_id: Uuid) -> AppResult<OrderDetails> {
        self.uow
            .addresses()
            .find_for_user(user_id, address_id)
            .await?
            .ok_or_not_found("Address")?;
        placeable(self.uow.orders().find_pending(user_id).await?)?;

        let placed = crate::with_transaction!(self.uow, |ctx| {
            let current = placeable(ctx.orders().find_pending_for_update(user_id).await?)?;

            let products = ctx.products();
            for line in &current.lines {
                if !products
                    .decrement_stock(line.product.id, line.item.quantity)
                    .await?
                {
                    return Err(AppError::OutOfStock(line.product.name.clone()));
                }
            }

            let orders = ctx.orders();
            orders.mark_placed(current.order.id, address_id).await?;
            orders.find_details(current.order.id).await
        })?;

        tracing::info!(
            order_id = %placed.order.id,
            %user_id,
            total = %placed.order.total_price,
            items = placed.lines.len(),
            "Order placed"
        );
        Ok(placed)
    }

    async fn order_history(&self, user_id: Uuid) -> AppResult<Vec<OrderDetails>> {
        self.uow.orders().list_for_user(user_id).await
    }
}


#[cfg(test)]
mod transaction_tests {
    use super::*;
    use crate::config::STATUS_PENDING;
    use crate::domain::OrderStatus;
    use crate::infra::repositories::entities::{
        address, category, order, order_item, product, product_image,
    };
    use crate::infra::Persistence;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};

    fn groceries() -> category::Model {
        let now = Utc::now();
        category::Model {
            id: Uuid::new_v4(),
            name: "Groceries".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn product_row(category: &category::Model, name: &str, cents: i64, stock: i32) -> product::Model {
        let now = Utc::now();
        product::Model {
            id: Uuid::new_v4(),
            category_id: category.id,
            name: name.into(),
            description: None,
            price: Decimal::new(cents, 2),
            stock,
            quantity: Some("1 kg".into()),
            weight: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn cart_row(user_id: Uuid, total_cents: i64) -> order::Model {
        let now = Utc::now();
        order::Model {
            id: Uuid::new_v4(),
            user_id,
            status: STATUS_PENDING.into(),
            total_price: Decimal::new(total_cents, 2),
            address_id: None,
            created_at: now,
            updated_at: now,
            placed_at: None,
        }
    }

    fn with_total(cart: &order::Model, total_cents: i64) -> order::Model {
        order::Model {
            total_price: Decimal::new(total_cents, 2),
            ..cart.clone()
        }
    }

    fn line_row(cart: &order::Model, product: &product::Model, quantity: i32) -> order_item::Model {
        order_item::Model {
            id: Uuid::new_v4(),
            order_id: cart.id,
            product_id: product.id,
            category_id: product.category_id,
            quantity,
            total_price: product.price * Decimal::from(quantity),
        }
    }

    fn home(user_id: Uuid) -> address::Model {
        address::Model {
            id: Uuid::new_v4(),
            user_id,
            recipient_name: "Asha Rao".into(),
            recipient_phone: "9876543210".into(),
            street: "12 MG Road".into(),
            city: Some("Bengaluru".into()),
            state: None,
            zip_code: "560001".into(),
            created_at: Utc::now(),
        }
    }

    fn affected(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    fn checkout(conn: &DatabaseConnection) -> Checkout<Persistence> {
        Checkout::new(Arc::new(Persistence::new(conn.clone())))
    }

    /// Statements of the BEGIN..COMMIT/ROLLBACK block, values inlined.
    fn transaction_sql(conn: DatabaseConnection) -> Vec<String> {
        conn.into_transaction_log()
            .into_iter()
            .map(|t| t.statements().iter().map(|s| s.to_string()).collect::<Vec<_>>())
            .find(|stmts| stmts.first().map(String::as_str) == Some("BEGIN"))
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_first_add_opens_cart_and_inserts_line() {
        let user_id = Uuid::new_v4();
        let category = groceries();
        let rice = product_row(&category, "Basmati Rice", 24900, 5);
        let cart = cart_row(user_id, 0);
        let line = line_row(&cart, &rice, 1);

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            // product lookup outside the transaction
            .append_query_results([vec![rice.clone()]])
            .append_query_results([vec![category]])
            .append_query_results([Vec::<product_image::Model>::new()])
            // inside: re-read price, no cart yet, create it, insert line
            .append_query_results([vec![rice.clone()]])
            .append_query_results([Vec::<order::Model>::new()])
            .append_query_results([vec![cart.clone()]])
            .append_query_results([vec![line.clone()]])
            .append_query_results([vec![with_total(&cart, 24900)]])
            .append_query_results([vec![line]])
            .append_query_results([vec![rice.clone()]])
            .append_exec_results([affected(1)])
            .into_connection();

        let details = checkout(&conn).add_to_cart(user_id, rice.id).await.unwrap();
        assert_eq!(details.order.total_price, Decimal::new(24900, 2));
        assert_eq!(details.lines.len(), 1);
        assert_eq!(details.lines[0].item.quantity, 1);

        let sql = transaction_sql(conn);
        assert!(sql
            .iter()
            .any(|s| s.starts_with(r#"INSERT INTO "orders""#) && s.contains("'pending'")));
        assert!(sql.iter().any(|s| s.starts_with(r#"INSERT INTO "order_items""#)));
        let total = sql
            .iter()
            .find(|s| s.starts_with(r#"UPDATE "orders""#))
            .unwrap();
        assert!(total.contains(r#""total_price" = 249.00"#));
        assert_eq!(sql.last().map(String::as_str), Some("COMMIT"));
    }

    #[tokio::test]
    async fn test_adding_again_bumps_existing_line() {
        let user_id = Uuid::new_v4();
        let category = groceries();
        let rice = product_row(&category, "Basmati Rice", 24900, 5);
        let cart = cart_row(user_id, 24900);
        let line = line_row(&cart, &rice, 1);
        let bumped = order_item::Model {
            quantity: 2,
            total_price: Decimal::new(49800, 2),
            ..line.clone()
        };

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![rice.clone()]])
            .append_query_results([vec![category]])
            .append_query_results([Vec::<product_image::Model>::new()])
            .append_query_results([vec![rice.clone()]])
            .append_query_results([vec![cart.clone()]])
            .append_query_results([vec![line]])
            .append_query_results([vec![rice.clone()]])
            .append_query_results([vec![with_total(&cart, 49800)]])
            .append_query_results([vec![bumped]])
            .append_query_results([vec![rice.clone()]])
            .append_exec_results([affected(1), affected(1)])
            .into_connection();

        let details = checkout(&conn).add_to_cart(user_id, rice.id).await.unwrap();
        assert_eq!(details.lines[0].item.quantity, 2);

        let sql = transaction_sql(conn);
        assert!(!sql.iter().any(|s| s.starts_with("INSERT")));
        let line_update = sql
            .iter()
            .find(|s| s.starts_with(r#"UPDATE "order_items""#))
            .unwrap();
        assert!(line_update.contains(r#""quantity" = 2"#));
        assert!(line_update.contains(r#""total_price" = 498.00"#));
        assert!(sql
            .iter()
            .any(|s| s.starts_with(r#"UPDATE "orders""#) && s.contains(r#""total_price" = 498.00"#)));
    }

    #[tokio::test]
    async fn test_removing_last_unit_deletes_line() {
        let user_id = Uuid::new_v4();
        let category = groceries();
        let rice = product_row(&category, "Basmati Rice", 24900, 5);
        let cart = cart_row(user_id, 24900);
        let line = line_row(&cart, &rice, 1);

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            // cart lookup outside the transaction
            .append_query_results([vec![cart.clone()]])
            .append_query_results([vec![line.clone()]])
            .append_query_results([vec![rice.clone()]])
            // locked re-read
            .append_query_results([vec![cart.clone()]])
            .append_query_results([vec![line.clone()]])
            .append_query_results([vec![rice.clone()]])
            .append_query_results([vec![with_total(&cart, 0)]])
            .append_query_results([Vec::<order_item::Model>::new()])
            .append_query_results([Vec::<product::Model>::new()])
            .append_exec_results([affected(1), affected(1)])
            .into_connection();

        let details = checkout(&conn)
            .remove_from_cart(user_id, rice.id)
            .await
            .unwrap();
        assert!(details.lines.is_empty());
        assert_eq!(details.order.total_price, Decimal::ZERO);

        let sql = transaction_sql(conn);
        let delete = sql
            .iter()
            .find(|s| s.starts_with(r#"DELETE FROM "order_items""#))
            .unwrap();
        assert!(delete.contains(&line.id.to_string()));
        assert!(!sql.iter().any(|s| s.starts_with(r#"UPDATE "order_items""#)));
        assert!(sql
            .iter()
            .any(|s| s.starts_with(r#"UPDATE "orders""#) && s.contains(r#""total_price" = 0"#)));
    }

    fn checkout_db(
        user_id: Uuid,
        decrements: [MockExecResult; 2],
        extra_exec: Option<MockExecResult>,
    ) -> (DatabaseConnection, address::Model, order::Model) {
        let category = groceries();
        let rice = product_row(&category, "Basmati Rice", 24900, 5);
        let tea = product_row(&category, "Green Tea", 19900, 3);
        let cart = cart_row(user_id, 69700);
        let lines = vec![line_row(&cart, &rice, 2), line_row(&cart, &tea, 1)];
        let address = home(user_id);
        let placed = order::Model {
            status: OrderStatus::Processing.as_str().into(),
            address_id: Some(address.id),
            placed_at: Some(Utc::now()),
            ..cart.clone()
        };

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![address.clone()]])
            .append_query_results([vec![cart.clone()]])
            .append_query_results([lines.clone()])
            .append_query_results([vec![rice.clone(), tea.clone()]])
            .append_query_results([vec![cart.clone()]])
            .append_query_results([lines.clone()])
            .append_query_results([vec![rice.clone(), tea.clone()]])
            .append_query_results([vec![placed]])
            .append_query_results([lines])
            .append_query_results([vec![rice, tea]])
            .append_exec_results(decrements.into_iter().chain(extra_exec))
            .into_connection();

        (conn, address, cart)
    }

    #[tokio::test]
    async fn test_place_order_takes_stock_and_marks_processing() {
        let user_id = Uuid::new_v4();
        let (conn, address, cart) =
            checkout_db(user_id, [affected(1), affected(1)], Some(affected(1)));

        let placed = checkout(&conn)
            .place_order(user_id, address.id)
            .await
            .unwrap();
        assert_eq!(placed.order.status, OrderStatus::Processing);
        assert_eq!(placed.order.address_id, Some(address.id));
        assert!(placed.order.placed_at.is_some());

        let sql = transaction_sql(conn);
        let decrements: Vec<&String> = sql
            .iter()
            .filter(|s| s.starts_with(r#"UPDATE "products""#))
            .collect();
        assert_eq!(decrements.len(), 2);
        assert!(decrements[0].contains(r#""stock" = "stock" - 2"#));
        assert!(decrements[0].contains(r#""stock" >= 2"#));
        assert!(decrements[1].contains(r#""stock" = "stock" - 1"#));

        let mark = sql
            .iter()
            .find(|s| s.starts_with(r#"UPDATE "orders""#))
            .unwrap();
        assert!(mark.contains(r#""status" = 'processing'"#));
        assert!(mark.contains(&address.id.to_string()));
        assert!(mark.contains(r#""placed_at" = "#));
        assert!(mark.contains(&cart.id.to_string()));
        assert_eq!(sql.last().map(String::as_str), Some("COMMIT"));
    }

    #[tokio::test]
    async fn test_place_order_rolls_back_when_stock_ran_out() {
        let user_id = Uuid::new_v4();
        // Another checkout took the last tea between the read and the update
        let (conn, address, _) = checkout_db(user_id, [affected(1), affected(0)], None);

        let err = checkout(&conn)
            .place_order(user_id, address.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OutOfStock(ref name) if name == "Green Tea"));

        let sql = transaction_sql(conn);
        assert!(!sql.iter().any(|s| s.contains("'processing'")));
        assert_eq!(sql.last().map(String::as_str), Some("ROLLBACK"));
    }
}
