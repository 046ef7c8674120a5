//! Catalog service: products and categories.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{
    round_money, Category, CategoryWithCount, NewProduct, Product, ProductChanges, ProductFilter,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[async_trait]
pub trait CatalogService: Send + Sync {
    async fn list_products(&self, filter: ProductFilter) -> AppResult<Vec<Product>>;

    async fn get_product(&self, id: Uuid) -> AppResult<Product>;

    async fn create_product(&self, product: NewProduct) -> AppResult<Product>;

    /// Partial update; a present `images` list replaces the stored one.
    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Product>;

    async fn delete_product(&self, id: Uuid) -> AppResult<()>;

    async fn list_categories(&self) -> AppResult<Vec<CategoryWithCount>>;

    async fn create_category(&self, name: String) -> AppResult<Category>;

    async fn update_category(&self, id: Uuid, name: String) -> AppResult<Category>;

    async fn delete_category(&self, id: Uuid) -> AppResult<()>;
}

pub struct Catalog<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> Catalog<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn ensure_category(&self, id: Uuid) -> AppResult<Category> {
        self.uow
            .categories()
            .find_by_id(id)
            .await?
            .ok_or_not_found("Category")
    }

    /// Fail when another category already uses `name`.
    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> AppResult<()> {
        match self.uow.categories().find_by_name(name).await? {
            Some(existing) if Some(existing.id) != except => Err(AppError::conflict(format!(
                "Category '{}' already exists",
                existing.name
            ))),
            _ => Ok(()),
        }
    }
}

fn check_price(price: Decimal) -> AppResult<Decimal> {
    if price <= Decimal::ZERO {
        return Err(AppError::validation("Price must be greater than zero"));
    }
    Ok(round_money(price))
}

fn check_stock(stock: i32) -> AppResult<i32> {
    if stock < 0 {
        return Err(AppError::validation("Stock cannot be negative"));
    }
    Ok(stock)
}

fn category_name(name: String) -> AppResult<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::validation("Category name is required"));
    }
    Ok(name)
}

#[async_trait]
impl<U: UnitOfWork> CatalogService for Catalog<U> {
    async fn list_products(&self, filter: ProductFilter) -> AppResult<Vec<Product>> {
        self.uow.products().list(filter).await
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Product> {
        self.uow
            .products()
            .find_by_id(id)
            .await?
            .ok_or_not_found("Product")
    }

    async fn create_product(&self, mut product: NewProduct) -> AppResult<Product> {
        product.price = check_price(product.price)?;
        product.stock = check_stock(product.stock)?;
        product.weight = product.weight.map(round_money);
        self.ensure_category(product.category_id).await?;

        let created = self.uow.products().create(product).await?;
        tracing::info!(product_id = %created.id, name = %created.name, "Product created");
        Ok(created)
    }

    async fn update_product(&self, id: Uuid, mut changes: ProductChanges) -> AppResult<Product> {
        self.get_product(id).await?;

        changes.price = changes.price.map(check_price).transpose()?;
        changes.stock = changes.stock.map(check_stock).transpose()?;
        changes.weight = changes.weight.map(round_money);
        if let Some(category_id) = changes.category_id {
            self.ensure_category(category_id).await?;
        }

        self.uow.products().update(id, changes).await
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<()> {
        self.get_product(id).await?;

        if self.uow.products().is_referenced_by_orders(id).await? {
            return Err(AppError::conflict(
                "Product is part of existing orders and cannot be deleted",
            ));
        }

        self.uow.products().delete(id).await?;
        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn list_categories(&self) -> AppResult<Vec<CategoryWithCount>> {
        self.uow.categories().list_with_counts().await
    }

    async fn create_category(&self, name: String) -> AppResult<Category> {
        let name = category_name(name)?;
        self.ensure_name_free(&name, None).await?;

        self.uow.categories().create(name).await
    }

    async fn update_category(&self, id: Uuid, name: String) -> AppResult<Category> {
        let name = category_name(name)?;
        let current = self.ensure_category(id).await?;
        if current.name == name {
            return Ok(current);
        }
        self.ensure_name_free(&name, Some(id)).await?;

        self.uow.categories().rename(id, name).await
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<()> {
        self.ensure_category(id).await?;

        let products = self.uow.categories().count_products(id).await?;
        if products > 0 {
            return Err(AppError::conflict(format!(
                "Category still has {} product(s)",
                products
            )));
        }
        if self.uow.categories().is_referenced_by_orders(id).await? {
            return Err(AppError::conflict(
                "Category is referenced by existing orders",
            ));
        }

        self.uow.categories().delete(id).await
    }
}
