use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

// Product row joined with its brand so callers don't need a second lookup
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ProductDisplay {
    pub id: Uuid,
    pub name: String,
    pub brand_id: Uuid,
    pub brand_name: String,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub brand_id: Uuid,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub brand_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
    pub brand: String,
    pub price: f64,
    pub effective_price: f64,
    pub discount_percent: u32,
    pub stock: i32,
}
