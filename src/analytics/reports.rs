//! Ranked replenishment and forecast reports.
//!
//! Both reports rank by urgency on the unrounded days-to-stockout and only
//! round values for display.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use uuid::Uuid;

use super::aggregator::{SalesAggregate, SalesSource, SalesWindow};
use super::estimator::{estimate, round_to, urgency_order, DemandInputs, Estimate, RiskClass};
use super::params::ReportParams;
use crate::error::AppResult;

const TREND_WEEK_DAYS: i64 = 7;

#[derive(Debug, Serialize)]
pub struct InsightSummary {
    pub total_skus: i64,
    pub tracked_skus: usize,
}

#[derive(Debug, Serialize)]
pub struct InsightItem {
    pub product_id: Uuid,
    pub name: String,
    pub brand: String,
    pub stock: i32,
    pub price: f64,
    pub daily_rate: f64,
    pub days_to_oos: Option<f64>,
    pub recommended_restock: i64,
}

#[derive(Debug, Serialize)]
pub struct InventoryInsights {
    pub window_days: u32,
    pub horizon_days: u32,
    pub summary: InsightSummary,
    pub items: Vec<InsightItem>,
}

#[derive(Debug, Serialize)]
pub struct ForecastSummary {
    pub total_skus: i64,
    pub tracked_skus: usize,
    pub avg_daily_units: f64,
    pub high_risk: usize,
    pub medium_risk: usize,
}

#[derive(Debug, Serialize)]
pub struct ForecastItem {
    pub product_id: Uuid,
    pub name: String,
    pub brand: String,
    pub stock: i32,
    pub daily_rate: f64,
    pub trend: f64,
    pub forecast_qty: i64,
    pub days_to_oos: Option<f64>,
    pub risk: RiskClass,
}

#[derive(Debug, Serialize)]
pub struct DemandForecast {
    pub window_days: u32,
    pub horizon_days: u32,
    pub generated_at: DateTime<Utc>,
    pub summary: ForecastSummary,
    pub items: Vec<ForecastItem>,
}

pub(crate) fn estimate_for(
    agg: &SalesAggregate,
    window_days: u32,
    horizon_days: u32,
    recent_qty: i64,
    previous_qty: i64,
) -> Estimate {
    estimate(DemandInputs {
        total_qty: agg.total_qty,
        window_days,
        recent_qty,
        previous_qty,
        stock: i64::from(agg.stock),
        horizon_days,
    })
}

fn rank<T>(mut rows: Vec<(Estimate, T)>) -> Vec<(Estimate, T)> {
    rows.sort_by(|(a, _), (b, _)| urgency_order(a.days_to_oos, b.days_to_oos));
    rows
}

pub async fn inventory_insights<S>(
    source: &S,
    params: ReportParams,
    now: DateTime<Utc>,
) -> AppResult<InventoryInsights>
where
    S: SalesSource + ?Sized,
{
    let sales = source
        .sales(SalesWindow::trailing(now, params.window_days))
        .await?;
    let total_skus = source.product_count().await?;
    let tracked_skus = sales.len();

    let rows = sales
        .into_values()
        .map(|agg| (estimate_for(&agg, params.window_days, params.horizon_days, 0, 0), agg))
        .collect();

    let items: Vec<InsightItem> = rank(rows)
        .into_iter()
        .take(params.limit)
        .map(|(est, agg)| InsightItem {
            product_id: agg.product_id,
            name: agg.name,
            brand: agg.brand,
            stock: agg.stock,
            price: agg.price.to_f64().unwrap_or_default(),
            daily_rate: round_to(est.daily_rate, 2),
            days_to_oos: est.days_to_oos.map(|d| round_to(d, 1)),
            recommended_restock: est.recommended_restock,
        })
        .collect();

    log::debug!("inventory insights: {} of {} tracked SKUs returned", items.len(), tracked_skus);

    Ok(InventoryInsights {
        window_days: params.window_days,
        horizon_days: params.horizon_days,
        summary: InsightSummary {
            total_skus,
            tracked_skus,
        },
        items,
    })
}

pub async fn demand_forecast<S>(
    source: &S,
    params: ReportParams,
    now: DateTime<Utc>,
) -> AppResult<DemandForecast>
where
    S: SalesSource + ?Sized,
{
    let sales = source
        .sales(SalesWindow::trailing(now, params.window_days))
        .await?;
    let total_skus = source.product_count().await?;

    if sales.is_empty() {
        return Ok(DemandForecast {
            window_days: params.window_days,
            horizon_days: params.horizon_days,
            generated_at: now,
            summary: ForecastSummary {
                total_skus,
                tracked_skus: 0,
                avg_daily_units: 0.0,
                high_risk: 0,
                medium_risk: 0,
            },
            items: Vec::new(),
        });
    }

    let recent_since = now - Duration::days(TREND_WEEK_DAYS);
    let recent = source
        .quantities(SalesWindow::trailing(now, TREND_WEEK_DAYS as u32))
        .await?;
    let previous = source
        .quantities(SalesWindow::between(
            recent_since - Duration::days(TREND_WEEK_DAYS),
            recent_since,
        ))
        .await?;

    let tracked_skus = sales.len();
    let rows: Vec<(Estimate, SalesAggregate)> = sales
        .into_values()
        .map(|agg| {
            let recent_qty = recent.get(&agg.product_id).copied().unwrap_or(0);
            let previous_qty = previous.get(&agg.product_id).copied().unwrap_or(0);
            let est = estimate_for(&agg, params.window_days, params.horizon_days, recent_qty, previous_qty);
            (est, agg)
        })
        .collect();

    let total_daily_units: f64 = rows.iter().map(|(est, _)| est.daily_rate).sum();
    let high_risk = rows.iter().filter(|(est, _)| est.risk == RiskClass::High).count();
    let medium_risk = rows.iter().filter(|(est, _)| est.risk == RiskClass::Medium).count();

    let items = rank(rows)
        .into_iter()
        .map(|(est, agg)| ForecastItem {
            product_id: agg.product_id,
            name: agg.name,
            brand: agg.brand,
            stock: agg.stock,
            daily_rate: round_to(est.daily_rate, 2),
            trend: round_to(est.trend, 2),
            forecast_qty: est.forecast_qty,
            days_to_oos: est.days_to_oos.map(|d| round_to(d, 1)),
            risk: est.risk,
        })
        .collect();

    Ok(DemandForecast {
        window_days: params.window_days,
        horizon_days: params.horizon_days,
        generated_at: now,
        summary: ForecastSummary {
            total_skus,
            tracked_skus,
            avg_daily_units: round_to(total_daily_units, 1),
            high_risk,
            medium_risk,
        },
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::memory::MemorySource;
    use crate::analytics::params::{ReportQuery, MAX_DAYS};
    use crate::error::AppError;

    fn params(window_days: u32, horizon_days: u32, limit: usize) -> ReportParams {
        ReportParams {
            window_days,
            horizon_days,
            limit,
        }
    }

    fn assert_urgency_sorted(days: &[Option<f64>]) {
        let first_none = days.iter().position(Option::is_none).unwrap_or(days.len());
        assert!(days[first_none..].iter().all(Option::is_none));
        let defined: Vec<f64> = days[..first_none].iter().map(|d| d.unwrap()).collect();
        assert!(defined.windows(2).all(|w| w[0] <= w[1]), "{defined:?}");
    }

    #[tokio::test]
    async fn forecast_matches_worked_example() {
        let now = Utc::now();
        let mut source = MemorySource::default();
        let id = source.add_product("Widget", "Acme", 10, "4.00");
        // 25 units in the last week, 20 the week before, 45 earlier in the window
        source.add_order(id, 25, now - Duration::days(2));
        source.add_order(id, 20, now - Duration::days(10));
        source.add_order(id, 45, now - Duration::days(20));

        let report = demand_forecast(&source, params(30, 30, 50), now).await.unwrap();
        assert_eq!(report.summary.tracked_skus, 1);
        assert_eq!(report.summary.high_risk, 1);
        assert_eq!(report.summary.avg_daily_units, 3.0);

        let item = &report.items[0];
        assert_eq!(item.daily_rate, 3.0);
        assert_eq!(item.trend, 0.25);
        assert_eq!(item.forecast_qty, 101);
        assert_eq!(item.days_to_oos, Some(3.3));
        assert_eq!(item.risk, RiskClass::High);
    }

    #[tokio::test]
    async fn forecast_short_circuits_on_empty_window() {
        let now = Utc::now();
        let mut source = MemorySource::default();
        let id = source.add_product("Widget", "Acme", 10, "1.00");
        source.add_product("Gadget", "Bolt", 3, "1.00");
        source.add_order(id, 9, now - Duration::days(45));

        let report = demand_forecast(&source, params(30, 30, 50), now).await.unwrap();
        assert_eq!(report.summary.total_skus, 2);
        assert_eq!(report.summary.tracked_skus, 0);
        assert_eq!(report.summary.avg_daily_units, 0.0);
        assert_eq!(report.summary.high_risk, 0);
        assert_eq!(report.summary.medium_risk, 0);
        assert!(report.items.is_empty());
    }

    #[tokio::test]
    async fn forecast_buckets_and_orders_by_urgency() {
        let now = Utc::now();
        let mut source = MemorySource::default();
        let slow = source.add_product("Slow", "Acme", 500, "1.00");
        let medium = source.add_product("Medium", "Acme", 40, "1.00");
        let empty = source.add_product("Empty", "Bolt", 0, "1.00");
        let fresh = source.add_product("Fresh", "Bolt", 200, "1.00");
        source.add_order(slow, 30, now - Duration::days(20));
        source.add_order(medium, 60, now - Duration::days(3));
        source.add_order(empty, 5, now - Duration::days(10));
        source.add_order(fresh, 6, now - Duration::days(1));

        let report = demand_forecast(&source, params(30, 30, 50), now).await.unwrap();
        let names: Vec<&str> = report.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Empty", "Medium", "Slow", "Fresh"]);
        assert_eq!(report.summary.high_risk, 1);
        assert_eq!(report.summary.medium_risk, 1);

        let fresh_item = report.items.iter().find(|i| i.name == "Fresh").unwrap();
        // sold this week with no prior week
        assert_eq!(fresh_item.trend, 0.5);
        assert_eq!(fresh_item.risk, RiskClass::Low);

        let days: Vec<Option<f64>> = report.items.iter().map(|i| i.days_to_oos).collect();
        assert_urgency_sorted(&days);
    }

    #[tokio::test]
    async fn insights_rank_truncate_and_count() {
        let now = Utc::now();
        let mut source = MemorySource::default();
        for (i, stock) in [50, 5, 0, 20].into_iter().enumerate() {
            let id = source.add_product(&format!("P{i}"), "Acme", stock, "2.00");
            source.add_order(id, 30, now - Duration::days(5));
        }
        source.add_product("Idle", "Acme", 7, "2.00");

        let report = inventory_insights(&source, params(30, 30, 3), now).await.unwrap();
        assert_eq!(report.summary.total_skus, 5);
        assert_eq!(report.summary.tracked_skus, 4);
        assert_eq!(report.items.len(), 3);

        let first = &report.items[0];
        assert_eq!(first.name, "P2");
        assert_eq!(first.days_to_oos, Some(0.0));
        assert_eq!(first.recommended_restock, 30);
        assert_eq!(first.price, 2.0);
        assert_eq!(report.items[1].name, "P1");
        assert_eq!(report.items[2].name, "P3");

        let days: Vec<Option<f64>> = report.items.iter().map(|i| i.days_to_oos).collect();
        assert_urgency_sorted(&days);
    }

    #[tokio::test]
    async fn insights_restock_covers_horizon() {
        let now = Utc::now();
        let mut source = MemorySource::default();
        let id = source.add_product("Widget", "Acme", 10, "1.00");
        source.add_order(id, 14, now - Duration::days(1));

        let report = inventory_insights(&source, params(7, 14, 50), now).await.unwrap();
        let item = &report.items[0];
        assert_eq!(item.daily_rate, 2.0);
        assert_eq!(item.days_to_oos, Some(5.0));
        assert_eq!(item.recommended_restock, 18);
    }

    #[tokio::test]
    async fn oversized_window_is_capped_not_fatal() {
        let now = Utc::now();
        let mut source = MemorySource::default();
        let id = source.add_product("Widget", "Acme", 10, "1.00");
        source.add_order(id, 5, now - Duration::days(3));

        let query = ReportQuery {
            window: Some("999999999".to_string()),
            ..Default::default()
        };
        let params = ReportParams::from(&query);
        assert_eq!(params.window_days, MAX_DAYS);

        let report = inventory_insights(&source, params, now).await.unwrap();
        assert_eq!(report.window_days, MAX_DAYS);
        assert_eq!(report.summary.tracked_skus, 1);

        let forecast = demand_forecast(&source, params, now).await.unwrap();
        assert_eq!(forecast.summary.tracked_skus, 1);
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let source = MemorySource::failing();
        let err = demand_forecast(&source, ReportParams::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
