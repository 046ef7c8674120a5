//! Query helpers shared by the connection-backed stores and the
//! transaction-scoped repositories.

use std::collections::{HashMap, HashSet};

use sea_orm::{
    sea_query::{extension::postgres::PgExpr, Expr, SimpleExpr},
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Select, SqlErr,
};
use uuid::Uuid;

use super::entities::{category, order, order_item, product, product_image};
use crate::config::STATUS_PENDING;
use crate::domain::{CategoryRef, Order, OrderDetails, OrderLine, Product, ProductFilter};
use crate::errors::{AppError, AppResult};

/// Map a unique-constraint violation to `Conflict(message)`.
pub(crate) fn conflict_on_unique(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(%detail, "Unique constraint violated");
            AppError::conflict(message)
        }
        _ => AppError::from(err),
    }
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards escaped.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let escaped = needle
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn ilike(column: impl ColumnTrait, needle: &str) -> SimpleExpr {
    Expr::col(column.as_column_ref()).ilike(contains_pattern(needle))
}

/// Products query narrowed by `filter`, ordered by name.
pub(crate) fn filtered_products(filter: &ProductFilter) -> Select<product::Entity> {
    let mut query = product::Entity::find();

    if let Some(name) = filter.name.as_deref().filter(|n| !n.trim().is_empty()) {
        query = query.filter(ilike(product::Column::Name, name));
    }

    if let Some(category) = filter.category.as_deref().filter(|c| !c.trim().is_empty()) {
        query = query
            .inner_join(category::Entity)
            .filter(ilike(category::Column::Name, category));
    }

    query.order_by_asc(product::Column::Name)
}

/// Attach categories and ordered images to product rows.
pub(crate) async fn products_with_details<C: ConnectionTrait>(
    conn: &C,
    models: Vec<product::Model>,
) -> AppResult<Vec<Product>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let category_ids: HashSet<Uuid> = models.iter().map(|m| m.category_id).collect();
    let categories: HashMap<Uuid, CategoryRef> = category::Entity::find()
        .filter(category::Column::Id.is_in(category_ids))
        .all(conn)
        .await?
        .iter()
        .map(|c| (c.id, CategoryRef::from(c)))
        .collect();

    let mut images: HashMap<Uuid, Vec<product_image::Model>> = HashMap::new();
    for image in product_image::Entity::find()
        .filter(product_image::Column::ProductId.is_in(models.iter().map(|m| m.id)))
        .order_by_asc(product_image::Column::Position)
        .all(conn)
        .await?
    {
        images.entry(image.product_id).or_default().push(image);
    }

    models
        .into_iter()
        .map(|model| {
            let category = categories.get(&model.category_id).cloned().ok_or_else(|| {
                AppError::internal(format!("Product {} has no category", model.id))
            })?;
            let images = images.remove(&model.id).unwrap_or_default();
            Ok(model.into_product(category, images))
        })
        .collect()
}

pub(crate) async fn product_with_details<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<Option<Product>> {
    let Some(model) = product::Entity::find_by_id(id).one(conn).await? else {
        return Ok(None);
    };

    Ok(products_with_details(conn, vec![model]).await?.pop())
}

/// The user's pending order row.
pub(crate) fn pending_order(user_id: Uuid) -> Select<order::Entity> {
    order::Entity::find()
        .filter(order::Column::UserId.eq(user_id))
        .filter(order::Column::Status.eq(STATUS_PENDING))
}

/// Attach lines (with their products) to order rows, keeping row order.
pub(crate) async fn orders_with_lines<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<order::Model>,
) -> AppResult<Vec<OrderDetails>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let items = order_item::Entity::find()
        .filter(order_item::Column::OrderId.is_in(orders.iter().map(|o| o.id)))
        .all(conn)
        .await?;

    let product_ids: HashSet<Uuid> = items.iter().map(|i| i.product_id).collect();
    let products: HashMap<Uuid, product::Model> = product::Entity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut lines_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for item in items {
        let product = products.get(&item.product_id).cloned().ok_or_else(|| {
            AppError::internal(format!("Order item {} has no product", item.id))
        })?;
        lines_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderLine {
                item: item.into(),
                product: product.into(),
            });
    }

    orders
        .into_iter()
        .map(|model| {
            let mut lines = lines_by_order.remove(&model.id).unwrap_or_default();
            lines.sort_by(|a, b| a.product.name.cmp(&b.product.name));
            Ok(OrderDetails {
                order: Order::try_from(model)?,
                lines,
            })
        })
        .collect()
}

pub(crate) async fn order_with_lines<C: ConnectionTrait>(
    conn: &C,
    model: Option<order::Model>,
) -> AppResult<Option<OrderDetails>> {
    match model {
        Some(model) => Ok(orders_with_lines(conn, vec![model]).await?.pop()),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("rice"), "%rice%");
        assert_eq!(contains_pattern(" 100%_pure "), "%100\\%\\_pure%");
    }

    #[test]
    fn test_non_unique_errors_stay_database_errors() {
        let err = conflict_on_unique(DbErr::Custom("boom".into()), "Email already registered");
        assert!(matches!(err, AppError::Database(_)));
    }
}
