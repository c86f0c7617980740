use crate::{
    auth::require_api_key,
    handlers,
    AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Read-only surface: listing and point lookups.
pub fn create_public_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/memes", get(handlers::list_memes))
        .route("/memes/{id}", get(handlers::get_meme))
        .route("/health", get(handlers::health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Write surface. Every meme route requires a valid `Authorization` header.
pub fn create_private_router(state: Arc<AppState>) -> Router {
    let memes = Router::new()
        .route("/memes", post(handlers::create_meme))
        .route(
            "/memes/{id}",
            put(handlers::update_meme).delete(handlers::delete_meme),
        )
        .route_layer(middleware::from_fn_with_state(
            state.verifier.clone(),
            require_api_key,
        ));

    Router::new()
        .merge(memes)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
}
