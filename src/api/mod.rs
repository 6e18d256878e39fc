//! HTTP interface. Every route is mounted under `/api` and speaks JSON.

mod error;
mod handlers;
mod middleware;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::db::Database;

pub use error::{ApiError, ErrorBody};
pub use middleware::{RateLimiter, SecurityConfig};

/// Router with authentication disabled, for local use and tests.
pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, SecurityConfig::disabled())
}

/// Router with the given security settings. `/api/health` is always open;
/// every other route goes through the bearer-token check and, when
/// configured, the per-client rate limiter.
pub fn create_router_with_config(db: Database, security: SecurityConfig) -> Router {
    let mut protected = Router::new()
        // Missions
        .route("/missions", get(handlers::list_missions))
        .route("/missions", post(handlers::create_mission))
        .route("/missions/deadlocked", get(handlers::list_deadlocked))
        .route("/missions/{id}", get(handlers::get_mission))
        .route("/missions/{id}", put(handlers::update_mission))
        .route("/missions/{id}", delete(handlers::delete_mission))
        // Mission links
        .route("/missions/{id}/annotations", post(handlers::link_annotation))
        .route(
            "/missions/{id}/annotations/{annotation_id}",
            delete(handlers::unlink_annotation),
        )
        .route("/missions/{id}/paths", post(handlers::link_path))
        .route("/missions/{id}/paths/{path_id}", delete(handlers::unlink_path))
        // Dependencies
        .route("/missions/{id}/dependencies", get(handlers::list_dependencies))
        .route("/missions/{id}/dependencies", post(handlers::add_dependency))
        .route(
            "/missions/{id}/dependencies/{required_mission_id}",
            delete(handlers::remove_dependency),
        )
        .route("/missions/{id}/dependents", get(handlers::list_dependents))
        // Progression
        .route("/progression", get(handlers::get_progression))
        // Maps
        .route("/maps", get(handlers::list_maps))
        .route("/maps", post(handlers::create_map))
        .route("/maps/{id}", get(handlers::get_map))
        .route("/maps/{id}", delete(handlers::delete_map))
        .route("/maps/{id}/layers", get(handlers::list_layers))
        .route("/maps/{id}/layers", post(handlers::create_layer))
        .route("/maps/{id}/annotations", get(handlers::list_map_annotations))
        .route("/maps/{id}/shapes", get(handlers::list_map_shapes))
        .route("/maps/{id}/paths", get(handlers::list_map_paths))
        // Layers
        .route("/layers/{id}", delete(handlers::delete_layer))
        // Annotations
        .route("/annotations", post(handlers::create_annotation))
        .route("/annotations/{id}", put(handlers::update_annotation))
        .route("/annotations/{id}", delete(handlers::delete_annotation))
        .route("/annotations/{id}/media", get(handlers::list_media))
        .route("/annotations/{id}/media", post(handlers::create_media))
        // Shapes
        .route("/shapes", post(handlers::create_shape))
        .route("/shapes/{id}", put(handlers::update_shape))
        .route("/shapes/{id}", delete(handlers::delete_shape))
        // Paths
        .route("/paths", post(handlers::create_path))
        .route("/paths/{id}", put(handlers::update_path))
        .route("/paths/{id}", delete(handlers::delete_path))
        // Export / Import
        .route("/export", get(handlers::export_world))
        .route("/import", post(handlers::import_world))
        .route_layer(axum::middleware::from_fn_with_state(
            security.clone(),
            middleware::auth_middleware,
        ));

    if let Some(limiter) = security.rate_limiter.clone() {
        protected = protected.route_layer(axum::middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    let api = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security.cors_layer()),
        )
        .with_state(db)
}
