use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{CreateProduct, ProductDisplay, UpdateProduct},
};

const PRODUCT_SELECT: &str = r#"
    SELECT p.id, p.name, p.brand_id, b.name AS brand_name, p.price, p.stock, p.created_at
    FROM products p
    JOIN brands b ON b.id = p.brand_id
"#;

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilters {
    #[serde(default)]
    search: String,
    #[serde(default)]
    brand: String,
    ordering: Option<String>,
}

/// Maps an `ordering` value onto a whitelisted ORDER BY clause.
/// Unknown fields fall back to newest first.
pub fn order_clause(ordering: Option<&str>) -> &'static str {
    match ordering.map(str::trim) {
        Some("name") => "p.name ASC, p.id",
        Some("-name") => "p.name DESC, p.id",
        Some("price") => "p.price ASC, p.id",
        Some("-price") => "p.price DESC, p.id",
        Some("stock") => "p.stock ASC, p.id",
        Some("-stock") => "p.stock DESC, p.id",
        _ => "p.created_at DESC, p.id DESC",
    }
}

/// Accepts an integer or an integer-looking string.
pub fn parse_amount(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub async fn list_products(
    State(db): State<Database>,
    Query(filters): Query<ProductFilters>,
) -> AppResult<Json<Vec<ProductDisplay>>> {
    let mut query = QueryBuilder::<Postgres>::new(PRODUCT_SELECT);
    query.push(" WHERE TRUE");

    let search = filters.search.trim();
    if !search.is_empty() {
        let pattern = format!("%{}%", search);
        query
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR b.name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    let brand = filters.brand.trim();
    if !brand.is_empty() {
        let brand_id = Uuid::parse_str(brand)
            .map_err(|_| AppError::BadRequest("Invalid brand id".to_string()))?;
        query.push(" AND p.brand_id = ").push_bind(brand_id);
    }

    query.push(" ORDER BY ").push(order_clause(filters.ordering.as_deref()));

    let products = query
        .build_query_as::<ProductDisplay>()
        .fetch_all(&db)
        .await?;

    Ok(Json(products))
}

pub async fn get_product(
    State(db): State<Database>,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductDisplay>> {
    Ok(Json(fetch_product(&db, product_id).await?))
}

pub async fn create_product(
    _user: CurrentUser,
    State(db): State<Database>,
    Json(input): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<ProductDisplay>)> {
    validate_fields(Some(&input.name), Some(input.price), Some(input.stock))?;

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO products (id, name, brand_id, price, stock) VALUES ($1, $2, $3, $4, $5)")
        .bind(id)
        .bind(input.name.trim())
        .bind(input.brand_id)
        .bind(input.price)
        .bind(input.stock)
        .execute(&db)
        .await?;

    Ok((StatusCode::CREATED, Json(fetch_product(&db, id).await?)))
}

pub async fn update_product(
    _user: CurrentUser,
    State(db): State<Database>,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<Json<ProductDisplay>> {
    validate_fields(input.name.as_deref(), input.price, input.stock)?;

    let result = sqlx::query(
        r#"
        UPDATE products SET
            name = COALESCE($2, name),
            brand_id = COALESCE($3, brand_id),
            price = COALESCE($4, price),
            stock = COALESCE($5, stock)
        WHERE id = $1
        "#,
    )
    .bind(product_id)
    .bind(input.name.as_deref().map(str::trim))
    .bind(input.brand_id)
    .bind(input.price)
    .bind(input.stock)
    .execute(&db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    Ok(Json(fetch_product(&db, product_id).await?))
}

pub async fn delete_product(
    _user: CurrentUser,
    State(db): State<Database>,
    Path(product_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(product_id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

// Bumps stock up or down; stock never drops below zero
pub async fn adjust_stock(
    _user: CurrentUser,
    State(db): State<Database>,
    Path(product_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let amount = body
        .get("amount")
        .and_then(parse_amount)
        .and_then(|a| i32::try_from(a).ok())
        .ok_or_else(|| AppError::BadRequest("Amount must be integer".to_string()))?;

    let stock = sqlx::query_scalar::<_, i32>(
        "UPDATE products SET stock = GREATEST(0, stock::BIGINT + $2)::INTEGER WHERE id = $1 RETURNING stock",
    )
    .bind(product_id)
    .bind(i64::from(amount))
    .fetch_optional(&db)
    .await?
    .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(json!({ "stock": stock })))
}

async fn fetch_product(db: &Database, product_id: Uuid) -> AppResult<ProductDisplay> {
    sqlx::query_as::<_, ProductDisplay>(&format!("{} WHERE p.id = $1", PRODUCT_SELECT))
        .bind(product_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

fn validate_fields(
    name: Option<&str>,
    price: Option<rust_decimal::Decimal>,
    stock: Option<i32>,
) -> AppResult<()> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::BadRequest("Product name is required".to_string()));
    }
    if price.is_some_and(|p| p.is_sign_negative()) {
        return Err(AppError::BadRequest("Price cannot be negative".to_string()));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(AppError::BadRequest("Stock cannot be negative".to_string()));
    }
    Ok(())
}
