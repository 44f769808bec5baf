use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;

use crate::{
    analytics::{
        demand_forecast as build_forecast, executive_digest, inventory_insights as build_insights,
        digest::ExecutiveDigest,
        reports::{DemandForecast, InventoryInsights},
        ReportParams, ReportQuery,
    },
    database::Database,
    error::AppResult,
    middleware::CurrentUser,
};

pub async fn inventory_insights(
    _user: CurrentUser,
    State(db): State<Database>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<InventoryInsights>> {
    let params = ReportParams::from(&query);
    Ok(Json(build_insights(&db, params, Utc::now()).await?))
}

pub async fn demand_forecast(
    _user: CurrentUser,
    State(db): State<Database>,
    Query(query): Query<ReportQuery>,
) -> AppResult<Json<DemandForecast>> {
    let params = ReportParams::from(&query);
    Ok(Json(build_forecast(&db, params, Utc::now()).await?))
}

pub async fn ai_summary(
    _user: CurrentUser,
    State(db): State<Database>,
) -> AppResult<Json<ExecutiveDigest>> {
    Ok(Json(executive_digest(&db, Utc::now()).await?))
}
