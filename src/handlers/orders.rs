use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{CreateOrder, Order, OrderDisplay, UpdateOrder},
};

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.user_id, o.product_id, p.name AS product_name,
           o.quantity, o.total_price, o.created_at
    FROM orders o
    JOIN products p ON p.id = o.product_id
"#;

/// Records one order line at the product's current price and takes the
/// quantity out of stock (never below zero). `None` if the product is gone.
pub(crate) async fn place_order(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<Option<Order>> {
    let price = sqlx::query_scalar::<_, Decimal>("SELECT price FROM products WHERE id = $1 FOR UPDATE")
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;

    let Some(price) = price else {
        return Ok(None);
    };

    let order = sqlx::query_as::<_, Order>(
        r#"
        INSERT INTO orders (id, user_id, product_id, quantity, total_price)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(price * Decimal::from(quantity))
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query("UPDATE products SET stock = GREATEST(0, stock - $2) WHERE id = $1")
        .bind(product_id)
        .bind(quantity)
        .execute(&mut **tx)
        .await?;

    Ok(Some(order))
}

pub async fn list_orders(
    _user: CurrentUser,
    State(db): State<Database>,
) -> AppResult<Json<Vec<OrderDisplay>>> {
    let orders = sqlx::query_as::<_, OrderDisplay>(&format!(
        "{} ORDER BY o.created_at DESC, o.id DESC",
        ORDER_SELECT
    ))
    .fetch_all(&db)
    .await?;

    Ok(Json(orders))
}

pub async fn get_order(
    _user: CurrentUser,
    State(db): State<Database>,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<OrderDisplay>> {
    Ok(Json(fetch_order(&db, order_id).await?))
}

pub async fn create_order(
    user: CurrentUser,
    State(db): State<Database>,
    Json(input): Json<CreateOrder>,
) -> AppResult<(StatusCode, Json<OrderDisplay>)> {
    if input.quantity <= 0 {
        return Err(AppError::BadRequest("Quantity must be positive".to_string()));
    }

    let mut tx = db.begin().await?;
    let order = place_order(&mut tx, user.id, input.product_id, input.quantity)
        .await?
        .ok_or_else(|| AppError::BadRequest("Product does not exist".to_string()))?;
    tx.commit().await?;

    log::info!("Order {} placed by {}", order.id, user.username);
    Ok((StatusCode::CREATED, Json(fetch_order(&db, order.id).await?)))
}

// Reprices the line at the product's current price; stock is left alone
pub async fn update_order(
    _user: CurrentUser,
    State(db): State<Database>,
    Path(order_id): Path<Uuid>,
    Json(input): Json<UpdateOrder>,
) -> AppResult<Json<OrderDisplay>> {
    if input.quantity <= 0 {
        return Err(AppError::BadRequest("Quantity must be positive".to_string()));
    }

    let result = sqlx::query(
        r#"
        UPDATE orders o SET quantity = $2, total_price = p.price * $2
        FROM products p
        WHERE o.id = $1 AND p.id = o.product_id
        "#,
    )
    .bind(order_id)
    .bind(input.quantity)
    .execute(&db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Order not found".to_string()));
    }
    Ok(Json(fetch_order(&db, order_id).await?))
}

pub async fn delete_order(
    _user: CurrentUser,
    State(db): State<Database>,
    Path(order_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(order_id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Order not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_order(db: &Database, order_id: Uuid) -> AppResult<OrderDisplay> {
    sqlx::query_as::<_, OrderDisplay>(&format!("{} WHERE o.id = $1", ORDER_SELECT))
        .bind(order_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}
