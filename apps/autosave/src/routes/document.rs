//! Axum route handlers for the resume document, its items and save status.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::autosave::{AutosaveScheduler, SaveSummary, ScheduleOutcome, SectionStatus};
use crate::editor::{validate, SectionEditor, Validate, ValidationReport};
use crate::errors::AppError;
use crate::models::resume::{
    Document, Education, ListSection, Projects, SectionItem, SectionKey, Skills, WorkExperience,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    pub key: SectionKey,
    pub outcome: ScheduleOutcome,
}

#[derive(Debug, Serialize)]
pub struct RemoveItemResponse {
    pub outcome: ScheduleOutcome,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AutosaveFlag {
    pub enabled: bool,
}

enum ItemOp {
    Add(Value),
    Update(String, Value),
    Remove(String),
}

fn parse_key(raw: &str) -> Result<SectionKey, AppError> {
    raw.parse::<SectionKey>()
        .map_err(|e| AppError::NotFound(e.to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/document
pub async fn handle_get_document(State(state): State<AppState>) -> Json<Document> {
    Json(state.store.read().await)
}

/// GET /api/v1/document/sections/:key
pub async fn handle_get_section(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    let key = parse_key(&key)?;
    let mut doc = state.store.read().await;
    doc.sections
        .remove(&key)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Section {key} has never been saved")))
}

/// PUT /api/v1/document/sections/:key
pub async fn handle_put_section(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(candidate): Json<Value>,
) -> Result<(StatusCode, Json<ScheduleResponse>), AppError> {
    let key = parse_key(&key)?;
    let outcome = state.scheduler.schedule(key, candidate);
    Ok((StatusCode::ACCEPTED, Json(ScheduleResponse { key, outcome })))
}

/// POST /api/v1/validate/:key
pub async fn handle_validate(
    Path(key): Path<String>,
    Json(candidate): Json<Value>,
) -> Result<Json<ValidationReport>, AppError> {
    let key = parse_key(&key)?;
    Ok(Json(validate(key, &candidate)))
}

/// POST /api/v1/document/sections/:key/items
pub async fn handle_add_item(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(item): Json<Value>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let key = parse_key(&key)?;
    let body = run_item_op(&state, key, ItemOp::Add(item)).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// PUT /api/v1/document/sections/:key/items/:id
pub async fn handle_update_item(
    State(state): State<AppState>,
    Path((key, id)): Path<(String, String)>,
    Json(item): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let key = parse_key(&key)?;
    Ok(Json(run_item_op(&state, key, ItemOp::Update(id, item)).await?))
}

/// DELETE /api/v1/document/sections/:key/items/:id
pub async fn handle_remove_item(
    State(state): State<AppState>,
    Path((key, id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let key = parse_key(&key)?;
    Ok(Json(run_item_op(&state, key, ItemOp::Remove(id)).await?))
}

/// GET /api/v1/status
pub async fn handle_status(State(state): State<AppState>) -> Json<SaveSummary> {
    Json(state.scheduler.summary().await)
}

/// GET /api/v1/status/:key
pub async fn handle_section_status(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SectionStatus>, AppError> {
    let key = parse_key(&key)?;
    Ok(Json(state.scheduler.status(key)))
}

/// GET /api/v1/autosave
pub async fn handle_get_autosave(State(state): State<AppState>) -> Json<AutosaveFlag> {
    Json(AutosaveFlag {
        enabled: state.autosave.is_enabled(),
    })
}

/// PUT /api/v1/autosave
pub async fn handle_set_autosave(
    State(state): State<AppState>,
    Json(req): Json<AutosaveFlag>,
) -> Json<AutosaveFlag> {
    state.autosave.set_enabled(req.enabled);
    tracing::info!("Autosave {}", if req.enabled { "enabled" } else { "disabled" });
    Json(req)
}

// ────────────────────────────────────────────────────────────────────────────
// Item editing through section editors
// ────────────────────────────────────────────────────────────────────────────

async fn run_item_op(state: &AppState, key: SectionKey, op: ItemOp) -> Result<Value, AppError> {
    let _guard = state.item_edits.lock().await;
    let scheduler = state.scheduler.clone();
    match key {
        SectionKey::WorkExperience => apply_item_op::<WorkExperience>(scheduler, op).await,
        SectionKey::Education => apply_item_op::<Education>(scheduler, op).await,
        SectionKey::Skills => apply_item_op::<Skills>(scheduler, op).await,
        SectionKey::Projects => apply_item_op::<Projects>(scheduler, op).await,
        other => Err(AppError::Validation(format!(
            "Section {other} does not hold a list of items"
        ))),
    }
}

async fn apply_item_op<S>(scheduler: AutosaveScheduler, op: ItemOp) -> Result<Value, AppError>
where
    S: ListSection,
    S::Item: Validate,
{
    let mut editor = SectionEditor::<S>::mount(scheduler).await?;
    let body = match op {
        ItemOp::Add(raw) => {
            let change = editor.add_item(decode_item::<S::Item>(raw)?)?;
            serde_json::to_value(change)
        }
        ItemOp::Update(id, raw) => {
            let mut item = decode_item::<S::Item>(raw)?;
            item.set_id(id);
            serde_json::to_value(editor.update_item(item)?)
        }
        ItemOp::Remove(id) => {
            let outcome = editor.remove_item(&id)?;
            serde_json::to_value(RemoveItemResponse { outcome })
        }
    };
    body.map_err(|e| AppError::Internal(e.into()))
}

fn decode_item<I: SectionItem>(raw: Value) -> Result<I, AppError> {
    serde_json::from_value(raw).map_err(|e| AppError::Validation(format!("Malformed item: {e}")))
}
