use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{Brand, BrandInput},
};

#[derive(Debug, Default, Deserialize)]
pub struct BrandFilters {
    #[serde(default)]
    search: String,
}

pub async fn list_brands(
    State(db): State<Database>,
    Query(filters): Query<BrandFilters>,
) -> AppResult<Json<Vec<Brand>>> {
    let search = filters.search.trim();

    let brands = if search.is_empty() {
        sqlx::query_as::<_, Brand>("SELECT * FROM brands ORDER BY created_at DESC, id DESC")
            .fetch_all(&db)
            .await?
    } else {
        sqlx::query_as::<_, Brand>(
            "SELECT * FROM brands WHERE name ILIKE $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(format!("%{}%", search))
        .fetch_all(&db)
        .await?
    };

    Ok(Json(brands))
}

pub async fn get_brand(
    State(db): State<Database>,
    Path(brand_id): Path<Uuid>,
) -> AppResult<Json<Brand>> {
    let brand = sqlx::query_as::<_, Brand>("SELECT * FROM brands WHERE id = $1")
        .bind(brand_id)
        .fetch_optional(&db)
        .await?
        .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

    Ok(Json(brand))
}

pub async fn create_brand(
    _user: CurrentUser,
    State(db): State<Database>,
    Json(input): Json<BrandInput>,
) -> AppResult<(StatusCode, Json<Brand>)> {
    let name = input
        .trimmed_name()
        .ok_or_else(|| AppError::BadRequest("Brand name is required".to_string()))?;

    let brand = sqlx::query_as::<_, Brand>(
        "INSERT INTO brands (id, name) VALUES ($1, $2) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(&db)
    .await
    .map_err(duplicate_name)?;

    Ok((StatusCode::CREATED, Json(brand)))
}

pub async fn update_brand(
    _user: CurrentUser,
    State(db): State<Database>,
    Path(brand_id): Path<Uuid>,
    Json(input): Json<BrandInput>,
) -> AppResult<Json<Brand>> {
    let name = input
        .trimmed_name()
        .ok_or_else(|| AppError::BadRequest("Brand name is required".to_string()))?;

    let brand = sqlx::query_as::<_, Brand>("UPDATE brands SET name = $2 WHERE id = $1 RETURNING *")
        .bind(brand_id)
        .bind(name)
        .fetch_optional(&db)
        .await
        .map_err(duplicate_name)?
        .ok_or_else(|| AppError::NotFound("Brand not found".to_string()))?;

    Ok(Json(brand))
}

pub async fn delete_brand(
    _user: CurrentUser,
    State(db): State<Database>,
    Path(brand_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("DELETE FROM brands WHERE id = $1")
        .bind(brand_id)
        .execute(&db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Brand not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn duplicate_name(err: sqlx::Error) -> AppError {
    match AppError::from(err) {
        AppError::Conflict(_) => AppError::Conflict("Brand with this name already exists".to_string()),
        other => other,
    }
}
