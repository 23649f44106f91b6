//! Axum route handlers for section order/visibility, template and preview.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::sections::{SectionEntry, SectionId};
use crate::models::template::TemplateSettings;
use crate::preview::PreviewDocument;
use crate::registry::RegistryError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub order: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    pub id: SectionId,
    pub visible: bool,
}

/// GET /api/v1/sections
pub async fn handle_list_sections(State(state): State<AppState>) -> Json<Vec<SectionEntry>> {
    Json(state.registry.list().await)
}

/// PUT /api/v1/sections/order
pub async fn handle_reorder(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Result<Json<Vec<SectionEntry>>, AppError> {
    let order = req
        .order
        .iter()
        .map(|raw| raw.parse::<SectionId>().map_err(RegistryError::UnknownSection))
        .collect::<Result<Vec<_>, _>>()?;

    state.registry.reorder(&order).await?;
    Ok(Json(state.registry.list().await))
}

/// GET /api/v1/sections/:id
pub async fn handle_section_visibility(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VisibilityResponse>, AppError> {
    let id = parse_section_id(&id)?;
    let visible = state.registry.is_visible(id).await;
    Ok(Json(VisibilityResponse { id, visible }))
}

/// POST /api/v1/sections/:id/toggle
pub async fn handle_toggle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VisibilityResponse>, AppError> {
    let id = parse_section_id(&id)?;
    let visible = state.registry.toggle(id).await?;
    Ok(Json(VisibilityResponse { id, visible }))
}

fn parse_section_id(raw: &str) -> Result<SectionId, AppError> {
    raw.parse::<SectionId>()
        .map_err(|raw| AppError::NotFound(format!("Section {raw} not found")))
}

/// GET /api/v1/template
pub async fn handle_get_template(State(state): State<AppState>) -> Json<TemplateSettings> {
    Json(state.template.get())
}

/// PUT /api/v1/template
pub async fn handle_set_template(
    State(state): State<AppState>,
    Json(settings): Json<TemplateSettings>,
) -> Json<TemplateSettings> {
    state.template.set(settings);
    Json(settings)
}

/// GET /api/v1/preview
pub async fn handle_preview(State(state): State<AppState>) -> Json<PreviewDocument> {
    Json(state.preview.current().await)
}
