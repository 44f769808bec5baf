use std::env;
use std::time::Duration;

use crate::error::StartupError;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub request_timeout: Duration,
    // Applied as the Postgres statement_timeout on every pooled connection
    pub query_timeout: Duration,
    pub db_max_connections: u32,
    pub run_migrations: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, StartupError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        Ok(Self {
            database_url,
            jwt_secret,
            port: optional("PORT", 3000),
            request_timeout: Duration::from_secs(optional("REQUEST_TIMEOUT_SECS", 30)),
            query_timeout: Duration::from_millis(optional("QUERY_TIMEOUT_MS", 5000)),
            db_max_connections: optional("DB_MAX_CONNECTIONS", 10),
            run_migrations: optional("RUN_MIGRATIONS", true),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn required(name: &'static str) -> Result<String, StartupError> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(StartupError::MissingEnv(name))
}

fn optional<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_falls_back_on_garbage() {
        env::set_var("STOCKPULSE_TEST_PORT", "not-a-port");
        assert_eq!(optional::<u16>("STOCKPULSE_TEST_PORT", 3000), 3000);
        env::set_var("STOCKPULSE_TEST_PORT", " 8080 ");
        assert_eq!(optional::<u16>("STOCKPULSE_TEST_PORT", 3000), 8080);
        env::remove_var("STOCKPULSE_TEST_PORT");
    }

    #[test]
    fn required_rejects_blank_values() {
        env::set_var("STOCKPULSE_TEST_SECRET", "   ");
        assert!(matches!(
            required("STOCKPULSE_TEST_SECRET"),
            Err(StartupError::MissingEnv("STOCKPULSE_TEST_SECRET"))
        ));
        env::remove_var("STOCKPULSE_TEST_SECRET");
    }
}
