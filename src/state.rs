use axum::extract::FromRef;

use crate::{database::Database, utils::AuthKeys};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub keys: AuthKeys,
}

impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for AuthKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}
