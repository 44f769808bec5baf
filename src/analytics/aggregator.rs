use std::collections::BTreeMap;

use axum::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{database::Database, error::AppResult};

/// Per-product sales totals over one window, with the product's current
/// catalog state attached.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SalesAggregate {
    pub product_id: Uuid,
    pub name: String,
    pub brand: String,
    pub stock: i32,
    pub price: Decimal,
    pub total_qty: i64,
    pub revenue: Decimal,
}

/// Products with no qualifying order lines are absent, never zero-filled.
pub type SalesByProduct = BTreeMap<Uuid, SalesAggregate>;

/// Half-open range `[since, until)`; `until = None` means "through now".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesWindow {
    pub since: DateTime<Utc>,
    pub until: Option<DateTime<Utc>>,
}

impl SalesWindow {
    /// Saturates at the earliest representable instant instead of
    /// overflowing.
    pub fn trailing(now: DateTime<Utc>, days: u32) -> Self {
        Self {
            since: now
                .checked_sub_signed(Duration::days(i64::from(days)))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            until: None,
        }
    }

    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since,
            until: Some(until),
        }
    }

    #[cfg(test)]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.since && self.until.map_or(true, |until| ts < until)
    }
}

/// Read access to order history and catalog counts.
#[async_trait]
pub trait SalesSource: Sync {
    async fn sales(&self, window: SalesWindow) -> AppResult<SalesByProduct>;

    async fn product_count(&self) -> AppResult<i64>;

    /// Distinct brands that carry at least one product.
    async fn brand_count(&self) -> AppResult<i64>;

    async fn order_count(&self, window: SalesWindow) -> AppResult<i64>;

    async fn quantities(&self, window: SalesWindow) -> AppResult<BTreeMap<Uuid, i64>> {
        Ok(self
            .sales(window)
            .await?
            .into_iter()
            .map(|(id, agg)| (id, agg.total_qty))
            .collect())
    }
}

#[async_trait]
impl SalesSource for Database {
    async fn sales(&self, window: SalesWindow) -> AppResult<SalesByProduct> {
        let rows = sqlx::query_as::<_, SalesAggregate>(
            r#"
            SELECT
                p.id AS product_id,
                p.name,
                COALESCE(b.name, 'Unknown') AS brand,
                p.stock,
                p.price,
                SUM(o.quantity)::BIGINT AS total_qty,
                SUM(o.total_price) AS revenue
            FROM orders o
            JOIN products p ON p.id = o.product_id
            LEFT JOIN brands b ON b.id = p.brand_id
            WHERE o.created_at >= $1
              AND ($2::timestamptz IS NULL OR o.created_at < $2)
            GROUP BY p.id, p.name, b.name, p.stock, p.price
            "#,
        )
        .bind(window.since)
        .bind(window.until)
        .fetch_all(self)
        .await?;

        Ok(rows.into_iter().map(|row| (row.product_id, row)).collect())
    }

    async fn product_count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(self)
            .await?;
        Ok(count)
    }

    async fn brand_count(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT brand_id) FROM products")
            .fetch_one(self)
            .await?;
        Ok(count)
    }

    async fn order_count(&self, window: SalesWindow) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE created_at >= $1 AND ($2::timestamptz IS NULL OR created_at < $2)",
        )
        .bind(window.since)
        .bind(window.until)
        .fetch_one(self)
        .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::memory::MemorySource;

    #[test]
    fn window_is_half_open() {
        let now = Utc::now();
        let window = SalesWindow::between(now - Duration::days(14), now - Duration::days(7));
        assert!(window.contains(now - Duration::days(14)));
        assert!(window.contains(now - Duration::days(8)));
        assert!(!window.contains(now - Duration::days(7)));
        assert!(SalesWindow::trailing(now, 7).contains(now));
    }

    #[test]
    fn trailing_window_saturates() {
        let now = Utc::now();
        let window = SalesWindow::trailing(now, u32::MAX);
        assert!(window.since < now - Duration::days(36_500));
        assert!(window.contains(now - Duration::days(365 * 200)));
    }

    #[tokio::test]
    async fn products_without_sales_are_absent() {
        let now = Utc::now();
        let mut source = MemorySource::default();
        let acme = source.add_product("Widget", "Acme", 10, "2.50");
        source.add_product("Gadget", "Acme", 4, "9.99");
        source.add_order(acme, 3, now - Duration::days(2));
        source.add_order(acme, 2, now - Duration::days(40));

        let sales = source.sales(SalesWindow::trailing(now, 30)).await.unwrap();
        assert_eq!(sales.len(), 1);
        let agg = &sales[&acme];
        assert_eq!(agg.total_qty, 3);
        assert_eq!(agg.revenue, Decimal::new(750, 2));
        assert_eq!(agg.brand, "Acme");
    }

    #[tokio::test]
    async fn sub_windows_sum_to_union() {
        let now = Utc::now();
        let mut source = MemorySource::default();
        let id = source.add_product("Widget", "Acme", 10, "1.00");
        for day in [0, 3, 6, 7, 9, 13, 20] {
            source.add_order(id, day + 1, now - Duration::days(day as i64) - Duration::hours(1));
        }

        let split = now - Duration::days(7);
        let older = source.quantities(SalesWindow::between(now - Duration::days(30), split)).await.unwrap();
        let newer = source.quantities(SalesWindow::between(split, now)).await.unwrap();
        let union = source.quantities(SalesWindow::between(now - Duration::days(30), now)).await.unwrap();

        assert_eq!(older[&id] + newer[&id], union[&id]);
    }

    #[tokio::test]
    async fn empty_history_yields_empty_mapping() {
        let mut source = MemorySource::default();
        source.add_product("Widget", "Acme", 10, "1.00");
        let sales = source.sales(SalesWindow::trailing(Utc::now(), 30)).await.unwrap();
        assert!(sales.is_empty());
    }
}
