//! Catalog entities: categories, products and their images.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(example = "Groceries")]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category listing row for the admin dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    pub id: Uuid,
    pub name: String,
    pub product_count: u64,
}

/// Category as embedded in a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    #[schema(example = "https://cdn.example.com/rice.png")]
    pub image_url: String,
}

/// Product with its category and ordered image list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Basmati Rice")]
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "249.00")]
    pub price: Decimal,
    #[schema(example = 40)]
    pub stock: i32,
    /// Pack-size label, e.g. "1 kg"
    #[schema(example = "1 kg")]
    pub quantity: Option<String>,
    #[schema(value_type = Option<String>, example = "1.00")]
    pub weight: Option<Decimal>,
    pub category: CategoryRef,
    pub images: Vec<ProductImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The scalar product fields carried alongside cart and order lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = String, example = "249.00")]
    pub price: Decimal,
    pub stock: i32,
    pub quantity: Option<String>,
    #[schema(value_type = Option<String>)]
    pub weight: Option<Decimal>,
    pub category_id: Uuid,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            stock: product.stock,
            quantity: product.quantity.clone(),
            weight: product.weight,
            category_id: product.category.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub quantity: Option<String>,
    pub weight: Option<Decimal>,
    pub category_id: Uuid,
    pub images: Vec<String>,
}

/// Partial product update. `images`, when present, replaces the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub quantity: Option<String>,
    pub weight: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub images: Option<Vec<String>>,
}

/// Case-insensitive substring filters for product listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub name: Option<String>,
}

impl ProductFilter {
    pub fn by_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            name: None,
        }
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            category: None,
            name: Some(name.into()),
        }
    }

    /// Stable cache key suffix for this filter.
    pub fn cache_key(&self) -> String {
        match (&self.category, &self.name) {
            (None, None) => "all".to_string(),
            (category, name) => format!(
                "category={}&name={}",
                category.as_deref().unwrap_or_default().to_lowercase(),
                name.as_deref().unwrap_or_default().to_lowercase()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_cache_keys() {
        assert_eq!(ProductFilter::default().cache_key(), "all");
        assert_eq!(
            ProductFilter::by_category("Groceries").cache_key(),
            "category=groceries&name="
        );
        assert_eq!(
            ProductFilter::by_name("RICE").cache_key(),
            ProductFilter::by_name("rice").cache_key()
        );
    }

    #[test]
    fn test_price_serializes_as_string() {
        let summary = ProductSummary {
            id: Uuid::nil(),
            name: "Basmati Rice".into(),
            price: Decimal::new(24900, 2),
            stock: 3,
            quantity: Some("1 kg".into()),
            weight: None,
            category_id: Uuid::nil(),
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["price"], "249.00");
        assert_eq!(json["categoryId"], Uuid::nil().to_string());
    }
}
