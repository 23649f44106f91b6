pub mod document;
pub mod events;
pub mod health;
pub mod sections;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Document and autosave
        .route("/api/v1/document", get(document::handle_get_document))
        .route(
            "/api/v1/document/sections/:key",
            get(document::handle_get_section).put(document::handle_put_section),
        )
        .route(
            "/api/v1/document/sections/:key/items",
            post(document::handle_add_item),
        )
        .route(
            "/api/v1/document/sections/:key/items/:id",
            put(document::handle_update_item).delete(document::handle_remove_item),
        )
        .route("/api/v1/validate/:key", post(document::handle_validate))
        .route("/api/v1/status", get(document::handle_status))
        .route("/api/v1/status/:key", get(document::handle_section_status))
        .route(
            "/api/v1/autosave",
            get(document::handle_get_autosave).put(document::handle_set_autosave),
        )
        // Section registry, template and composed view
        .route("/api/v1/sections", get(sections::handle_list_sections))
        .route("/api/v1/sections/order", put(sections::handle_reorder))
        .route("/api/v1/sections/:id", get(sections::handle_section_visibility))
        .route("/api/v1/sections/:id/toggle", post(sections::handle_toggle))
        .route(
            "/api/v1/template",
            get(sections::handle_get_template).put(sections::handle_set_template),
        )
        .route("/api/v1/preview", get(sections::handle_preview))
        // Cross-view change signals
        .route("/api/v1/events", get(events::handle_events))
        .with_state(state)
}
