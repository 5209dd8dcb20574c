/// HTTP API layer
///
/// JSON endpoints over the gateway:
/// - model types, models and the read-only catalogues
/// - process graph save, read and delete

pub mod catalog;
pub mod model_types;
pub mod models;
pub mod processes;

use crate::gateway::Gateway;
use axum::{http::StatusCode, response::Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn Gateway>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }
}

/// Error response carrying a `{"message": ...}` body
pub type ApiError = (StatusCode, Json<Value>);

pub(crate) fn api_error(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "message": message })))
}

/// Every `/api` route, state not yet attached
pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .merge(model_types::routes())
        .merge(models::routes())
        .merge(catalog::routes())
        .merge(processes::routes())
}
