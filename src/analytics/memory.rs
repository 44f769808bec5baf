use std::collections::BTreeSet;
use std::str::FromStr;

use axum::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::aggregator::{SalesAggregate, SalesByProduct, SalesSource, SalesWindow};
use crate::error::{AppError, AppResult};

struct StoredProduct {
    id: Uuid,
    name: String,
    brand: String,
    stock: i32,
    price: Decimal,
}

struct StoredOrder {
    product_id: Uuid,
    quantity: i64,
    total_price: Decimal,
    created_at: DateTime<Utc>,
}

/// In-process order history used by the report tests.
#[derive(Default)]
pub struct MemorySource {
    products: Vec<StoredProduct>,
    orders: Vec<StoredOrder>,
    fail: bool,
}

impl MemorySource {
    /// A source whose every call fails like an unreachable store.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn add_product(&mut self, name: &str, brand: &str, stock: i32, price: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.products.push(StoredProduct {
            id,
            name: name.to_string(),
            brand: brand.to_string(),
            stock,
            price: Decimal::from_str(price).unwrap(),
        });
        id
    }

    pub fn add_order(&mut self, product_id: Uuid, quantity: i64, created_at: DateTime<Utc>) {
        let price = self
            .products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.price)
            .unwrap();
        self.orders.push(StoredOrder {
            product_id,
            quantity,
            total_price: price * Decimal::from(quantity),
            created_at,
        });
    }

    fn check(&self) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl SalesSource for MemorySource {
    async fn sales(&self, window: SalesWindow) -> AppResult<SalesByProduct> {
        self.check()?;
        let mut out = SalesByProduct::new();
        for order in self.orders.iter().filter(|o| window.contains(o.created_at)) {
            let Some(product) = self.products.iter().find(|p| p.id == order.product_id) else {
                continue;
            };
            let entry = out.entry(product.id).or_insert_with(|| SalesAggregate {
                product_id: product.id,
                name: product.name.clone(),
                brand: product.brand.clone(),
                stock: product.stock,
                price: product.price,
                total_qty: 0,
                revenue: Decimal::ZERO,
            });
            entry.total_qty += order.quantity;
            entry.revenue += order.total_price;
        }
        Ok(out)
    }

    async fn product_count(&self) -> AppResult<i64> {
        self.check()?;
        Ok(self.products.len() as i64)
    }

    async fn brand_count(&self) -> AppResult<i64> {
        self.check()?;
        let brands: BTreeSet<&str> = self.products.iter().map(|p| p.brand.as_str()).collect();
        Ok(brands.len() as i64)
    }

    async fn order_count(&self, window: SalesWindow) -> AppResult<i64> {
        self.check()?;
        Ok(self.orders.iter().filter(|o| window.contains(o.created_at)).count() as i64)
    }
}
