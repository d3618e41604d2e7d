pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::services::ServeDir;

use crate::applications::handlers;
use crate::state::AppState;

/// Upper bound for a full intake body: five 5MB documents plus fields.
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.files.root());

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/applications",
            post(handlers::handle_submit)
                .get(handlers::handle_list)
                .delete(handlers::handle_clear_all),
        )
        .route("/api/applications/:id", get(handlers::handle_get))
        .route(
            "/api/applications/:id/status",
            put(handlers::handle_update_status),
        )
        .route(
            "/api/applications/:id/offer-letter",
            post(handlers::handle_upload_offer_letter)
                .delete(handlers::handle_remove_offer_letter),
        )
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
