/// Model endpoints
///
/// Create and update persist the full model record; the list is ordered by name.
use crate::{
    api::{api_error, ApiError, AppState},
    gateway::GatewayError,
    pages,
    records::{Model, Record},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, put},
    Router,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/models", get(list_models).post(create_model))
        .route("/api/models/{id}", put(update_model))
}

/// GET /api/models
async fn list_models(State(state): State<AppState>) -> Json<Vec<Model>> {
    Json(pages::models(state.gateway.as_ref()).await)
}

/// POST /api/models
///
/// Any `id` in the body is ignored; the stored model is returned.
async fn create_model(
    State(state): State<AppState>,
    Json(mut model): Json<Model>,
) -> Result<Json<Model>, ApiError> {
    model.id = None;
    let stored = async {
        let row = model.to_row()?;
        let stored = state.gateway.insert(Model::TABLE, row).await?;
        Model::from_row(stored)
    }
    .await
    .map_err(|e| {
        tracing::error!("Error adding model: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error adding model")
    })?;

    tracing::info!("✅ Model created: {}", stored.name);
    Ok(Json(stored))
}

/// PUT /api/models/{id}
async fn update_model(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(model): Json<Model>,
) -> Result<Json<Model>, ApiError> {
    let stored = async {
        let patch = model.to_row()?;
        let stored = state.gateway.update(Model::TABLE, &id, patch).await?;
        Model::from_row(stored)
    }
    .await
    .map_err(|e| match e {
        GatewayError::NotFound { .. } => api_error(StatusCode::NOT_FOUND, "Model not found"),
        e => {
            tracing::error!("Error updating model {}: {}", id, e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error updating model")
        }
    })?;

    Ok(Json(stored))
}
