/// Model type lookup
use crate::{
    api::{api_error, ApiError, AppState},
    gateway::{Selection, Table},
};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde_json::Value;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/model-types", get(list_model_types))
}

/// GET /api/model-types
///
/// Names only, sorted ascending.
async fn list_model_types(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let rows = state
        .gateway
        .select(Table::ModelTypes, &Selection::all().order_by("name"))
        .await
        .map_err(|e| {
            tracing::error!("Error fetching model types: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching model types")
        })?;

    let names = rows
        .iter()
        .filter_map(|row| row.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    Ok(Json(names))
}
