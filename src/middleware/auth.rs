use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    database::Database,
    error::AppError,
    models::User,
    utils::AuthKeys,
};

/// The authenticated caller, resolved from an `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub date_joined: DateTime<Utc>,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            date_joined: user.created_at,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Database: FromRef<S>,
    AuthKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| unauthorized())?;

        let claims = AuthKeys::from_ref(state)
            .verify_token(bearer.token())
            .map_err(|e| {
                log::warn!("Rejected bearer token: {}", e);
                unauthorized()
            })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| unauthorized())?;
        let db = Database::from_ref(state);

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&db)
            .await?
            .ok_or_else(unauthorized)?;

        Ok(CurrentUser::from(user))
    }
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("Authentication credentials were not provided or are invalid".to_string())
}
