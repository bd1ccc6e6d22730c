mod errors;
mod handlers;
mod state;

use axum::{Router, routing::get};

pub use state::HttpState;

pub fn router(state: HttpState) -> Router<()> {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/status", get(handlers::status))
        .route("/api/records", get(handlers::records))
        .with_state(state)
}
