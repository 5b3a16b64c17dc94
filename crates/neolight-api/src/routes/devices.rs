//! Device document routes

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use neolight_services::{Document, DeviceDocument};

use crate::{ApiError, AppState};

/// Fetch the document for one device.
pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>, ApiError> {
    state
        .documents
        .find_one(&id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Device not found"))
}

/// Set the known fields present in the body, creating the document if needed.
///
/// Returns the document after the update.
pub async fn put_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Document>, ApiError> {
    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    let update = DeviceDocument::from_json(value).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let document = state
        .documents
        .set_fields(&id, update.into_fields())
        .await
        .map_err(|e| {
            tracing::error!("Failed to update device '{}': {}", id, e);
            ApiError::BadRequest(e.to_string())
        })?;

    tracing::debug!("Updated device '{}'", id);
    Ok(Json(document))
}
