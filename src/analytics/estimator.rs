//! Demand and stock-out heuristics shared by every inventory report.
//!
//! All arithmetic is `f64`. Rounding is half away from zero (`f64::round`)
//! for every integer quantity and display value.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

pub const TREND_FLOOR: f64 = -0.8;
pub const TREND_CEILING: f64 = 1.5;
/// Trend assigned when a product sells this week with no sales the week before.
pub const NEW_DEMAND_TREND: f64 = 0.5;
pub const HIGH_RISK_DAYS: f64 = 7.0;
pub const MEDIUM_RISK_DAYS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskClass {
    None,
    Low,
    Medium,
    High,
}

/// Everything the estimator needs to know about one product.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemandInputs {
    pub total_qty: i64,
    pub window_days: u32,
    pub recent_qty: i64,
    pub previous_qty: i64,
    pub stock: i64,
    pub horizon_days: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub daily_rate: f64,
    pub trend: f64,
    pub forecast_qty: i64,
    /// `None` when the product is not selling at all.
    pub days_to_oos: Option<f64>,
    pub risk: RiskClass,
    pub recommended_restock: i64,
}

pub fn estimate(inputs: DemandInputs) -> Estimate {
    let rate = daily_rate(inputs.total_qty, inputs.window_days);
    let trend = trend(inputs.recent_qty, inputs.previous_qty);
    let days_to_oos = days_to_stockout(inputs.stock, rate);

    Estimate {
        daily_rate: rate,
        trend,
        forecast_qty: forecast_qty(rate, inputs.horizon_days, trend),
        days_to_oos,
        risk: classify_risk(days_to_oos),
        recommended_restock: recommended_restock(rate, inputs.horizon_days, inputs.stock),
    }
}

pub fn daily_rate(total_qty: i64, window_days: u32) -> f64 {
    total_qty.max(0) as f64 / f64::from(window_days.max(1))
}

pub fn trend(recent_qty: i64, previous_qty: i64) -> f64 {
    let recent = recent_qty as f64;
    let previous = previous_qty as f64;

    let raw = if previous > 0.0 {
        (recent - previous) / previous
    } else if recent > 0.0 {
        NEW_DEMAND_TREND
    } else {
        0.0
    };

    raw.clamp(TREND_FLOOR, TREND_CEILING)
}

pub fn forecast_qty(daily_rate: f64, horizon_days: u32, trend: f64) -> i64 {
    let projected = daily_rate * f64::from(horizon_days) * (1.0 + 0.5 * trend);
    (projected.round() as i64).max(0)
}

pub fn days_to_stockout(stock: i64, daily_rate: f64) -> Option<f64> {
    if daily_rate <= 0.0 {
        return None;
    }
    if stock <= 0 {
        return Some(0.0);
    }
    Some(stock as f64 / daily_rate)
}

pub fn classify_risk(days_to_oos: Option<f64>) -> RiskClass {
    match days_to_oos {
        None => RiskClass::None,
        Some(days) if days <= HIGH_RISK_DAYS => RiskClass::High,
        Some(days) if days <= MEDIUM_RISK_DAYS => RiskClass::Medium,
        Some(_) => RiskClass::Low,
    }
}

pub fn recommended_restock(daily_rate: f64, horizon_days: u32, stock: i64) -> i64 {
    let shortfall = f64::from(horizon_days) * daily_rate - stock as f64;
    (shortfall.round() as i64).max(0)
}

/// Most urgent first: defined days ascending, undefined last.
pub fn urgency_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
