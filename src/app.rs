use crate::handlers;
use crate::state::AppState;
use axum::{routing::{delete, get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/records", post(handlers::add_record_form))
        .route("/records/:id/delete", post(handlers::delete_record_form))
        .route("/photos/:name", get(handlers::photo))
        .route("/api/records", get(handlers::list_records).post(handlers::add_record))
        .route("/api/records/:id", delete(handlers::delete_record))
        .route("/api/day", get(handlers::get_day))
        .route("/api/summary", get(handlers::get_summary))
        .with_state(state)
}
