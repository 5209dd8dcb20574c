/// Process graph endpoints
///
/// POST runs the full save protocol on a wizard payload and answers with the
/// process id; GET reads a graph back; DELETE cascades to the child rows.
use crate::{
    api::{api_error, ApiError, AppState},
    records::Process,
    workflow::{ProcessData, ProcessStorage},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub id: String,
    pub message: String,
    pub graph_version: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/processes", get(list_processes).post(save_process))
        .route("/api/processes/{id}", get(get_process).delete(delete_process))
}

/// POST /api/processes
///
/// Body: wizard process data; an `id` updates that process.
async fn save_process(
    State(state): State<AppState>,
    Json(mut process): Json<ProcessData>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let storage = ProcessStorage::new(state.gateway.clone());

    match storage.save(&mut process).await {
        Ok(report) => {
            tracing::info!(
                "✅ Process saved: {} ({} steps, graph version {})",
                report.process_id,
                report.workflow_steps,
                report.graph_version
            );
            Ok(Json(ProcessResponse {
                id: report.process_id,
                message: "Process saved successfully".to_string(),
                graph_version: report.graph_version,
            }))
        }
        Err(e) => {
            tracing::error!("Error saving process: {}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error saving process"))
        }
    }
}

/// GET /api/processes
async fn list_processes(State(state): State<AppState>) -> Result<Json<Vec<Process>>, ApiError> {
    ProcessStorage::new(state.gateway.clone())
        .list()
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Error fetching processes: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching processes")
        })
}

/// GET /api/processes/{id}
async fn get_process(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProcessData>, ApiError> {
    match ProcessStorage::new(state.gateway.clone()).load(&id).await {
        Ok(Some(process)) => Ok(Json(process)),
        Ok(None) => Err(api_error(StatusCode::NOT_FOUND, "Process not found")),
        Err(e) => {
            tracing::error!("Error fetching process {}: {}", id, e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching process"))
        }
    }
}

/// DELETE /api/processes/{id}
async fn delete_process(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match ProcessStorage::new(state.gateway.clone()).delete(&id).await {
        Ok(true) => {
            tracing::info!("🗑️ Process deleted: {}", id);
            Ok(Json(json!({ "id": id, "message": "Process deleted successfully" })))
        }
        Ok(false) => Err(api_error(StatusCode::NOT_FOUND, "Process not found")),
        Err(e) => {
            tracing::error!("Error deleting process {}: {}", id, e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Error deleting process"))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::test_support::{app, json_request},
        gateway::{Gateway, Row, Table},
    };
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn post_saves_and_get_reads_back() {
        let (gateway, router) = app().await;
        let mut agent = Row::new();
        agent.insert("name".to_string(), json!("Analyst"));
        let agent = gateway.insert(Table::Agents, agent).await.unwrap();
        let agent_id = agent["id"].as_str().unwrap().to_string();

        let payload = json!({
            "name": "Digest",
            "description": "daily digest",
            "tasks": [{ "id": "t-1", "name": "Summarize" }],
            "agents": [{ "id": agent_id, "name": "Analyst" }],
            "workflow": [{ "task_id": "t-1", "agent_id": agent_id }]
        });
        let (status, body) =
            json_request(router.clone(), Method::POST, "/api/processes", Some(payload)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Process saved successfully");
        let id = body["id"].as_str().unwrap().to_string();

        let (status, process) =
            json_request(router.clone(), Method::GET, &format!("/api/processes/{}", id), None)
                .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(process["tasks"][0]["name"], "Summarize");
        assert_eq!(process["workflow"][0]["agent_id"], json!(agent_id));

        let (status, _) =
            json_request(router.clone(), Method::DELETE, &format!("/api/processes/{}", id), None)
                .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) =
            json_request(router, Method::GET, &format!("/api/processes/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn repeated_ids_in_payload_are_stored_once() {
        let (gateway, router) = app().await;
        let mut tool = Row::new();
        tool.insert("name".to_string(), json!("Search"));
        let tool_id = gateway.insert(Table::Tools, tool).await.unwrap()["id"].clone();
        let mut agent = Row::new();
        agent.insert("name".to_string(), json!("Analyst"));
        let agent_id = gateway.insert(Table::Agents, agent).await.unwrap()["id"].clone();

        let payload = json!({
            "name": "Repeats",
            "tools": [
                { "id": tool_id, "name": "Search" },
                { "id": tool_id, "name": "Search" }
            ],
            "agents": [
                { "id": agent_id, "name": "Analyst" },
                { "id": agent_id, "name": "Analyst" }
            ]
        });
        let (status, _) = json_request(router, Method::POST, "/api/processes", Some(payload)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(gateway.list(Table::ProcessTools).await.unwrap().len(), 1);
        assert_eq!(gateway.list(Table::ProcessAgents).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failed_save_is_a_500() {
        let (gateway, router) = app().await;
        gateway.close().await;

        let (status, body) = json_request(
            router,
            Method::POST,
            "/api/processes",
            Some(json!({ "name": "Nope" })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "message": "Error saving process" }));
    }
}
