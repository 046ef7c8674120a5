//! Category repository implementation.

use async_trait::async_trait;
use sea_orm::{
    sea_query::{Expr, Func}, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use uuid::Uuid;

use super::entities::category::{self, ActiveModel, Entity as CategoryEntity};
use super::entities::{order_item, product};
use super::queries::conflict_on_unique;
use crate::domain::{Category, CategoryWithCount};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Every category with its product count, ordered by name.
    async fn list_with_counts(&self) -> AppResult<Vec<CategoryWithCount>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Category>>;

    /// Case-insensitive exact name lookup.
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Category>>;

    async fn create(&self, name: String) -> AppResult<Category>;

    async fn rename(&self, id: Uuid, name: String) -> AppResult<Category>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    async fn count_products(&self, id: Uuid) -> AppResult<u64>;

    /// Whether any order line was recorded under this category.
    async fn is_referenced_by_orders(&self, id: Uuid) -> AppResult<bool>;
}

pub struct CategoryStore {
    db: DatabaseConnection,
}

impl CategoryStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryRepository for CategoryStore {
    async fn list_with_counts(&self) -> AppResult<Vec<CategoryWithCount>> {
        let rows: Vec<(Uuid, String, i64)> = CategoryEntity::find()
            .select_only()
            .column(category::Column::Id)
            .column(category::Column::Name)
            .column_as(product::Column::Id.count(), "product_count")
            .join(JoinType::LeftJoin, category::Relation::Product.def())
            .group_by(category::Column::Id)
            .group_by(category::Column::Name)
            .order_by_asc(category::Column::Name)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, count)| CategoryWithCount {
                id,
                name,
                product_count: count.max(0) as u64,
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Category>> {
        let result = CategoryEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(Category::from))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        let result = CategoryEntity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(category::Column::Name)))
                    .eq(name.trim().to_lowercase()),
            )
            .one(&self.db)
            .await?;

        Ok(result.map(Category::from))
    }

    async fn create(&self, name: String) -> AppResult<Category> {
        let now = chrono::Utc::now();
        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| conflict_on_unique(e, "Category already exists"))?;

        Ok(Category::from(model))
    }

    async fn rename(&self, id: Uuid, name: String) -> AppResult<Category> {
        let model = CategoryEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))?;

        let mut active: ActiveModel = model.into();
        active.name = Set(name);
        active.updated_at = Set(chrono::Utc::now());

        let model = active
            .update(&self.db)
            .await
            .map_err(|e| conflict_on_unique(e, "Category already exists"))?;

        Ok(Category::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = CategoryEntity::delete_by_id(id).exec(&self.db).await?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found("Category"));
        }

        Ok(())
    }

    async fn count_products(&self, id: Uuid) -> AppResult<u64> {
        let count = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;

        Ok(count)
    }

    async fn is_referenced_by_orders(&self, id: Uuid) -> AppResult<bool> {
        let count = order_item::Entity::find()
            .filter(order_item::Column::CategoryId.eq(id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}
