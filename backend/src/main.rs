//! AutoQuote Backend
//!
//! REST backend for an automotive service quoting dashboard, with a payment
//! webhook that keeps user subscriptions in sync. SQLite persistence.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;
mod schedule;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{any, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting AutoQuote Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (AUTOQUOTE_API_PSK). Dashboard authentication is disabled!");
    }

    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();

    // Dashboard routes
    let api_routes = Router::new()
        // Datastore
        .route("/datastore", get(api::get_datastore))
        .route("/datastore/revision", get(api::get_revision))
        // Profiles
        .route("/profiles", get(api::list_profiles).post(api::create_profile))
        .route(
            "/profiles/{id}",
            get(api::get_profile).put(api::update_profile),
        )
        // Clients
        .route("/clients", get(api::list_clients).post(api::create_client))
        .route(
            "/clients/{id}",
            get(api::get_client)
                .put(api::update_client)
                .delete(api::delete_client),
        )
        // Catalog
        .route("/services", get(api::list_services).post(api::create_service))
        .route(
            "/services/{id}",
            get(api::get_service)
                .put(api::update_service)
                .delete(api::delete_service),
        )
        .route("/products", get(api::list_products).post(api::create_product))
        .route(
            "/products/{id}",
            get(api::get_product)
                .put(api::update_product)
                .delete(api::delete_product),
        )
        .route(
            "/payment-methods",
            get(api::list_payment_methods).post(api::create_payment_method),
        )
        .route(
            "/payment-methods/{id}",
            get(api::get_payment_method)
                .put(api::update_payment_method)
                .delete(api::delete_payment_method),
        )
        // Operational costs
        .route("/costs", get(api::list_costs).post(api::create_cost))
        .route("/costs/instances", get(api::list_expense_instances))
        .route(
            "/costs/instances/{instance_id}/pay",
            post(api::pay_expense_instance).delete(api::unpay_expense_instance),
        )
        .route(
            "/costs/{id}",
            get(api::get_cost)
                .put(api::update_cost)
                .delete(api::delete_cost),
        )
        // Quotes
        .route("/quotes", get(api::list_quotes).post(api::create_quote))
        .route(
            "/quotes/{id}",
            get(api::get_quote)
                .put(api::update_quote)
                .delete(api::delete_quote),
        )
        // Notifications
        .route("/notifications", get(api::list_notifications))
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Public routes: the processor cannot send our API key. The webhook
    // answers every method itself so non-POST calls get a JSON 405.
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/webhooks/payment", any(api::payment_webhook));

    Router::new()
        .nest("/api", api_routes)
        .merge(public_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
