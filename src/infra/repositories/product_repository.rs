//! Product repository implementation.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use super::entities::product::{ActiveModel, Entity as ProductEntity};
use super::entities::{order_item, product_image};
use super::queries::{filtered_products, product_with_details, products_with_details};
use crate::domain::{NewProduct, Product, ProductChanges, ProductFilter};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Products matching `filter`, ordered by name.
    async fn list(&self, filter: ProductFilter) -> AppResult<Vec<Product>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// Insert a product and its images atomically.
    async fn create(&self, product: NewProduct) -> AppResult<Product>;

    /// Apply a partial update; a present image list replaces the old one.
    async fn update(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Whether any order line (cart or placed) points at this product.
    async fn is_referenced_by_orders(&self, id: Uuid) -> AppResult<bool>;
}

pub struct ProductStore {
    db: DatabaseConnection,
}

impl ProductStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load(&self, id: Uuid) -> AppResult<Product> {
        product_with_details(&self.db, id)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))
    }
}

async fn replace_images<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    urls: Vec<String>,
) -> AppResult<()> {
    product_image::Entity::delete_many()
        .filter(product_image::Column::ProductId.eq(product_id))
        .exec(conn)
        .await?;

    if urls.is_empty() {
        return Ok(());
    }

    let images = urls
        .into_iter()
        .enumerate()
        .map(|(position, url)| product_image::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            image_url: Set(url),
            position: Set(position as i32),
        });

    product_image::Entity::insert_many(images).exec(conn).await?;
    Ok(())
}

#[async_trait]
impl ProductRepository for ProductStore {
    async fn list(&self, filter: ProductFilter) -> AppResult<Vec<Product>> {
        let models = filtered_products(&filter).all(&self.db).await?;
        products_with_details(&self.db, models).await
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Product>> {
        product_with_details(&self.db, id).await
    }

    async fn create(&self, new_product: NewProduct) -> AppResult<Product> {
        let now = chrono::Utc::now();
        let id = Uuid::new_v4();
        let active_model = ActiveModel {
            id: Set(id),
            category_id: Set(new_product.category_id),
            name: Set(new_product.name),
            description: Set(new_product.description),
            price: Set(new_product.price),
            stock: Set(new_product.stock),
            quantity: Set(new_product.quantity),
            weight: Set(new_product.weight),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let txn = self.db.begin().await?;
        active_model.insert(&txn).await?;
        replace_images(&txn, id, new_product.images).await?;
        txn.commit().await?;

        self.load(id).await
    }

    async fn update(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product> {
        let txn = self.db.begin().await?;

        let model = ProductEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))?;

        let mut active: ActiveModel = model.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(price) = changes.price {
            active.price = Set(price);
        }
        if let Some(stock) = changes.stock {
            active.stock = Set(stock);
        }
        if let Some(quantity) = changes.quantity {
            active.quantity = Set(Some(quantity));
        }
        if let Some(weight) = changes.weight {
            active.weight = Set(Some(weight));
        }
        if let Some(category_id) = changes.category_id {
            active.category_id = Set(category_id);
        }
        active.updated_at = Set(chrono::Utc::now());
        active.update(&txn).await?;

        if let Some(images) = changes.images {
            replace_images(&txn, id, images).await?;
        }

        txn.commit().await?;
        self.load(id).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ProductEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("Product"));
        }

        Ok(())
    }

    async fn is_referenced_by_orders(&self, id: Uuid) -> AppResult<bool> {
        let count = order_item::Entity::find()
            .filter(order_item::Column::ProductId.eq(id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}
