use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde_json::{json, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    handlers::{orders::place_order, products::parse_amount},
    middleware::CurrentUser,
    models::{CatalogEntry, CustomerOrder},
};

#[derive(FromRow)]
struct CatalogRow {
    id: Uuid,
    name: String,
    brand: String,
    price: Decimal,
    stock: i32,
}

/// Loyalty discount in percent by account age.
pub fn loyalty_discount_percent(joined: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    match (now - joined).num_days() {
        d if d > 90 => 10,
        d if d > 30 => 5,
        _ => 0,
    }
}

pub fn discounted_price(price: Decimal, discount_percent: u32) -> Decimal {
    (price * Decimal::from(100 - discount_percent.min(100)) / Decimal::from(100))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Valid `(product_id, quantity)` pairs from an order request body.
/// `None` when `lines` is missing, not a list, or empty; individual
/// malformed lines are dropped.
pub fn parse_lines(body: &Value) -> Option<Vec<(Uuid, i32)>> {
    let lines = body.get("lines")?.as_array().filter(|l| !l.is_empty())?;

    Some(
        lines
            .iter()
            .filter_map(|line| {
                let product_id = match line.get("product_id")? {
                    Value::String(s) => Uuid::parse_str(s.trim()).ok()?,
                    _ => return None,
                };
                let quantity = i32::try_from(parse_amount(line.get("quantity")?)?).ok()?;
                (quantity > 0).then_some((product_id, quantity))
            })
            .collect(),
    )
}

pub async fn catalog(
    user: CurrentUser,
    State(db): State<Database>,
) -> AppResult<Json<Value>> {
    let discount = loyalty_discount_percent(user.date_joined, Utc::now());

    let rows = sqlx::query_as::<_, CatalogRow>(
        r#"
        SELECT p.id, p.name, COALESCE(b.name, 'Unknown') AS brand, p.price, p.stock
        FROM products p
        LEFT JOIN brands b ON b.id = p.brand_id
        ORDER BY p.name
        "#,
    )
    .fetch_all(&db)
    .await?;

    let results: Vec<CatalogEntry> = rows
        .into_iter()
        .map(|row| CatalogEntry {
            id: row.id,
            name: row.name,
            brand: row.brand,
            price: row.price.to_f64().unwrap_or_default(),
            effective_price: discounted_price(row.price, discount).to_f64().unwrap_or_default(),
            discount_percent: discount,
            stock: row.stock,
        })
        .collect();

    Ok(Json(json!({ "results": results })))
}

pub async fn my_orders(
    user: CurrentUser,
    State(db): State<Database>,
) -> AppResult<Json<Vec<CustomerOrder>>> {
    let orders = sqlx::query_as::<_, CustomerOrder>(
        r#"
        SELECT o.id, p.name AS product, COALESCE(b.name, 'Unknown') AS brand,
               o.quantity, o.total_price, o.created_at
        FROM orders o
        JOIN products p ON p.id = o.product_id
        LEFT JOIN brands b ON b.id = p.brand_id
        WHERE o.user_id = $1
        ORDER BY o.created_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&db)
    .await?;

    Ok(Json(orders))
}

pub async fn place_orders(
    user: CurrentUser,
    State(db): State<Database>,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let lines = parse_lines(&body).ok_or_else(|| {
        AppError::BadRequest("Provide 'lines': [ {product_id, quantity} ]".to_string())
    })?;

    let mut created_ids = Vec::with_capacity(lines.len());
    let mut tx = db.begin().await?;
    for (product_id, quantity) in lines {
        // unknown products are skipped
        if let Some(order) = place_order(&mut tx, user.id, product_id, quantity).await? {
            created_ids.push(order.id);
        }
    }
    tx.commit().await?;

    log::info!("{} placed {} order line(s)", user.username, created_ids.len());
    Ok((StatusCode::CREATED, Json(json!({ "created_order_ids": created_ids }))))
}
