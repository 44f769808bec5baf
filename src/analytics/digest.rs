use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::aggregator::{SalesSource, SalesWindow};
use super::estimator::{HIGH_RISK_DAYS, MEDIUM_RISK_DAYS};
use super::reports::estimate_for;
use crate::error::AppResult;

pub const DIGEST_WINDOW_DAYS: u32 = 30;
pub const DIGEST_HORIZON_DAYS: u32 = 30;
const MAX_PRESSURE_BRANDS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestMeta {
    pub products: i64,
    pub brands: i64,
    pub orders_last_window: i64,
    pub at_risk_7: usize,
    pub at_risk_30: usize,
    pub recommended_total: i64,
    pub pressure_brands: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ExecutiveDigest {
    pub window_days: u32,
    pub horizon_days: u32,
    pub bullets: Vec<String>,
    pub meta: DigestMeta,
}

pub async fn executive_digest<S>(source: &S, now: DateTime<Utc>) -> AppResult<ExecutiveDigest>
where
    S: SalesSource + ?Sized,
{
    let window = SalesWindow::trailing(now, DIGEST_WINDOW_DAYS);

    let products = source.product_count().await?;
    let brands = source.brand_count().await?;
    let orders_last_window = source.order_count(window).await?;
    let sales = source.sales(window).await?;

    let mut at_risk_7 = 0;
    let mut at_risk_30 = 0;
    let mut recommended_total = 0;
    // BTreeSet keeps brand names sorted for rendering
    let mut pressure = BTreeSet::new();

    for agg in sales.values() {
        let est = estimate_for(agg, DIGEST_WINDOW_DAYS, DIGEST_HORIZON_DAYS, 0, 0);
        let Some(days) = est.days_to_oos else {
            continue;
        };

        if days <= HIGH_RISK_DAYS {
            at_risk_7 += 1;
        }
        if days <= MEDIUM_RISK_DAYS {
            at_risk_30 += 1;
        }
        if est.recommended_restock > 0 {
            recommended_total += est.recommended_restock;
            pressure.insert(agg.brand.clone());
        }
    }

    let meta = DigestMeta {
        products,
        brands,
        orders_last_window,
        at_risk_7,
        at_risk_30,
        recommended_total,
        pressure_brands: pressure.into_iter().collect(),
    };

    Ok(ExecutiveDigest {
        window_days: DIGEST_WINDOW_DAYS,
        horizon_days: DIGEST_HORIZON_DAYS,
        bullets: render_bullets(&meta),
        meta,
    })
}

pub fn render_bullets(meta: &DigestMeta) -> Vec<String> {
    let mut bullets = vec![format!(
        "{} products active across {} brands – {} orders placed in the last {} days.",
        meta.products, meta.brands, meta.orders_last_window, DIGEST_WINDOW_DAYS
    )];

    if meta.at_risk_7 > 0 {
        bullets.push(format!(
            "{} SKUs may run out within a week ({} within 30 days).",
            meta.at_risk_7, meta.at_risk_30
        ));
    } else {
        bullets.push("No SKUs expected to run out within the next 7 days.".to_string());
    }

    if meta.recommended_total > 0 {
        bullets.push(format!(
            "Suggested replenishment for the next {} days: around {} total units.",
            DIGEST_HORIZON_DAYS, meta.recommended_total
        ));
    }

    if !meta.pressure_brands.is_empty() {
        let named: Vec<&str> = meta
            .pressure_brands
            .iter()
            .take(MAX_PRESSURE_BRANDS)
            .map(String::as_str)
            .collect();
        bullets.push(format!("Supply may tighten for: {}.", named.join(", ")));
    }

    bullets
}
