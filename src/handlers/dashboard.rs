use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{
    analytics::{ChartQuery, SalesWindow},
    database::Database,
    error::AppResult,
};

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct BrandCount {
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub products: i64,
    pub brands: i64,
    pub orders: i64,
    pub by_brand: Vec<BrandCount>,
}

/// One bar or point on a dashboard chart.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ChartPoint {
    pub label: String,
    pub metric: f64,
}

fn since(query: &ChartQuery) -> Option<DateTime<Utc>> {
    query
        .days()
        .map(|days| SalesWindow::trailing(Utc::now(), days).since)
}

// Snapshot the dashboard cards are built from
pub async fn summary(State(db): State<Database>) -> AppResult<Json<Summary>> {
    let products = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
        .fetch_one(&db)
        .await?;
    let brands = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM brands")
        .fetch_one(&db)
        .await?;
    let orders = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
        .fetch_one(&db)
        .await?;

    let by_brand = sqlx::query_as::<_, BrandCount>(
        r#"
        SELECT COALESCE(b.name, 'Unknown') AS name, COUNT(p.id) AS count
        FROM products p
        LEFT JOIN brands b ON b.id = p.brand_id
        GROUP BY b.name
        ORDER BY b.name
        "#,
    )
    .fetch_all(&db)
    .await?;

    Ok(Json(Summary {
        products,
        brands,
        orders,
        by_brand,
    }))
}

pub async fn top_products(
    State(db): State<Database>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<Vec<ChartPoint>>> {
    let points = sqlx::query_as::<_, ChartPoint>(
        r#"
        SELECT p.name AS label, SUM(o.quantity)::FLOAT8 AS metric
        FROM orders o
        JOIN products p ON p.id = o.product_id
        WHERE ($1::timestamptz IS NULL OR o.created_at >= $1)
        GROUP BY p.id, p.name
        ORDER BY metric DESC, p.name
        LIMIT $2
        "#,
    )
    .bind(since(&query))
    .bind(query.limit())
    .fetch_all(&db)
    .await?;

    Ok(Json(points))
}

pub async fn monthly_revenue(
    State(db): State<Database>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<Vec<ChartPoint>>> {
    let points = sqlx::query_as::<_, ChartPoint>(
        r#"
        SELECT TO_CHAR(DATE_TRUNC('month', o.created_at), 'YYYY-MM') AS label,
               SUM(o.total_price)::FLOAT8 AS metric
        FROM orders o
        WHERE ($1::timestamptz IS NULL OR o.created_at >= $1)
        GROUP BY DATE_TRUNC('month', o.created_at)
        ORDER BY DATE_TRUNC('month', o.created_at)
        "#,
    )
    .bind(since(&query))
    .fetch_all(&db)
    .await?;

    Ok(Json(points))
}

pub async fn daily_orders(
    State(db): State<Database>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<Vec<ChartPoint>>> {
    let points = sqlx::query_as::<_, ChartPoint>(
        r#"
        SELECT TO_CHAR(DATE_TRUNC('day', o.created_at), 'YYYY-MM-DD') AS label,
               COUNT(o.id)::FLOAT8 AS metric
        FROM orders o
        WHERE ($1::timestamptz IS NULL OR o.created_at >= $1)
        GROUP BY DATE_TRUNC('day', o.created_at)
        ORDER BY DATE_TRUNC('day', o.created_at)
        "#,
    )
    .bind(since(&query))
    .fetch_all(&db)
    .await?;

    Ok(Json(points))
}

pub async fn brand_revenue(
    State(db): State<Database>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<Vec<ChartPoint>>> {
    let points = sqlx::query_as::<_, ChartPoint>(
        r#"
        SELECT COALESCE(b.name, 'Unknown') AS label, SUM(o.total_price)::FLOAT8 AS metric
        FROM orders o
        JOIN products p ON p.id = o.product_id
        LEFT JOIN brands b ON b.id = p.brand_id
        WHERE ($1::timestamptz IS NULL OR o.created_at >= $1)
        GROUP BY b.name
        ORDER BY metric DESC
        "#,
    )
    .bind(since(&query))
    .fetch_all(&db)
    .await?;

    Ok(Json(points))
}

// Everything at or under the threshold, emptiest first
pub async fn low_stock(
    State(db): State<Database>,
    Query(query): Query<ChartQuery>,
) -> AppResult<Json<Vec<ChartPoint>>> {
    let points = sqlx::query_as::<_, ChartPoint>(
        r#"
        SELECT p.name AS label, p.stock::FLOAT8 AS metric
        FROM products p
        WHERE p.stock <= $1
        ORDER BY p.stock, p.name
        "#,
    )
    .bind(query.threshold())
    .fetch_all(&db)
    .await?;

    Ok(Json(points))
}
