use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    database::Database,
    error::{AppError, AppResult},
    models::{Credentials, User, UserResponse},
    utils::{hash_password, verify_password, AuthKeys},
};

#[derive(Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub user: UserResponse,
}

pub async fn register(
    State(db): State<Database>,
    Json(form): Json<Credentials>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let (username, password) = form
        .complete()
        .ok_or_else(|| AppError::BadRequest("Username and password required".to_string()))?;

    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(&db)
        .await?;
    if exists {
        return Err(AppError::BadRequest("User already exists".to_string()));
    }

    let password_hash = hash_password(password)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;

    sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)")
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .execute(&db)
        .await
        .map_err(|e| match AppError::from(e) {
            // lost a race with a concurrent registration
            AppError::Conflict(_) => AppError::BadRequest("User already exists".to_string()),
            other => other,
        })?;

    log::info!("Registered user {}", username);
    Ok((StatusCode::CREATED, Json(json!({ "message": "User created successfully" }))))
}

pub async fn login(
    State(db): State<Database>,
    State(keys): State<AuthKeys>,
    Json(form): Json<Credentials>,
) -> AppResult<Json<LoginResponse>> {
    let invalid = || AppError::Unauthorized("Invalid username or password".to_string());
    let (username, password) = form.complete().ok_or_else(invalid)?;

    let user = authenticate_user(&db, username, password)
        .await?
        .ok_or_else(invalid)?;

    let access = keys
        .create_token(user.id, user.username.clone())
        .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;

    Ok(Json(LoginResponse {
        access,
        user: UserResponse::from(user),
    }))
}

async fn authenticate_user(
    db: &Database,
    username: &str,
    password: &str,
) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(db)
        .await?;

    Ok(user.filter(|u| verify_password(password, &u.password_hash).unwrap_or(false)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_body_without_password_is_rejected() {
        let form: Credentials = serde_json::from_value(json!({ "username": "admin" })).unwrap();
        assert!(form.complete().is_none());
    }

    #[test]
    fn login_response_shape() {
        let id = Uuid::new_v4();
        let body = serde_json::to_value(LoginResponse {
            access: "token".to_string(),
            user: UserResponse {
                id,
                username: "admin".to_string(),
            },
        })
        .unwrap();
        assert_eq!(body["access"], "token");
        assert_eq!(body["user"]["username"], "admin");
        assert_eq!(body["user"]["id"], id.to_string());
    }
}
