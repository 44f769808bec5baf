use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;

use crate::config::Config;
use crate::error::StartupError;

pub type Database = Pool<Postgres>;

pub async fn create_database_pool(config: &Config) -> Result<Database, StartupError> {
    let statement_timeout = config.query_timeout.as_millis().to_string();
    let options = PgConnectOptions::from_str(&config.database_url)?
        .options([("statement_timeout", statement_timeout.as_str())]);

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.query_timeout)
        .connect_with(options)
        .await?;

    // Test the connection
    sqlx::query("SELECT 1")
        .fetch_one(&pool)
        .await?;

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    log::info!("Connected to database successfully");
    Ok(pool)
}
