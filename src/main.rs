mod analytics;
mod config;
mod database;
mod error;
mod handlers;
mod middleware;
mod models;
mod state;
mod utils;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use dotenvy::dotenv;

use config::Config;
use database::create_database_pool;
use error::StartupError;
use state::AppState;
use utils::AuthKeys;

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::init();

    let config = Config::from_env()?;
    let db = create_database_pool(&config).await?;

    let state = AppState {
        db,
        keys: AuthKeys::new(&config.jwt_secret),
    };
    let app = create_router(state, config.request_timeout);

    let addr = config.bind_addr();
    log::info!("Stockpulse server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        // Accounts
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))

        // Catalog CRUD (reads are public, writes need a token)
        .route("/brands", get(handlers::brands::list_brands).post(handlers::brands::create_brand))
        .route(
            "/brands/:id",
            get(handlers::brands::get_brand)
                .put(handlers::brands::update_brand)
                .patch(handlers::brands::update_brand)
                .delete(handlers::brands::delete_brand),
        )
        .route("/products", get(handlers::products::list_products).post(handlers::products::create_product))
        .route(
            "/products/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .patch(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route("/products/:id/adjust_stock", post(handlers::products::adjust_stock))

        // Orders
        .route("/orders", get(handlers::orders::list_orders).post(handlers::orders::create_order))
        .route(
            "/orders/:id",
            get(handlers::orders::get_order)
                .put(handlers::orders::update_order)
                .patch(handlers::orders::update_order)
                .delete(handlers::orders::delete_order),
        )

        // Dashboard
        .route("/summary", get(handlers::dashboard::summary))
        .route("/analytics/top-products", get(handlers::dashboard::top_products))
        .route("/analytics/monthly-revenue", get(handlers::dashboard::monthly_revenue))
        .route("/analytics/daily-orders", get(handlers::dashboard::daily_orders))
        .route("/analytics/brand-revenue", get(handlers::dashboard::brand_revenue))
        .route("/analytics/low-stock", get(handlers::dashboard::low_stock))

        // Inventory intelligence
        .route("/inventory-insights", get(handlers::intelligence::inventory_insights))
        .route("/analytics/demand-forecast", get(handlers::intelligence::demand_forecast))
        .route("/ai-summary", get(handlers::intelligence::ai_summary))

        // Customer portal
        .route("/customer/catalog", get(handlers::customer::catalog))
        .route(
            "/customer/orders",
            get(handlers::customer::my_orders).post(handlers::customer::place_orders),
        );

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(request_timeout))
                .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
        )
        .with_state(state)
}
