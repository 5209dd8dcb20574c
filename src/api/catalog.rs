/// Read-only catalogue listings, ordered by name
use crate::{
    api::AppState,
    pages,
    records::{ConfigEntry, Function, Secret, Tool},
};
use axum::{extract::State, response::Json, routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/tools", get(list_tools))
        .route("/api/secrets", get(list_secrets))
        .route("/api/configs", get(list_configs))
        .route("/api/functions", get(list_functions))
}

async fn list_tools(State(state): State<AppState>) -> Json<Vec<Tool>> {
    Json(pages::tools(state.gateway.as_ref()).await)
}

async fn list_secrets(State(state): State<AppState>) -> Json<Vec<Secret>> {
    Json(pages::secrets(state.gateway.as_ref()).await)
}

async fn list_configs(State(state): State<AppState>) -> Json<Vec<ConfigEntry>> {
    Json(pages::configs(state.gateway.as_ref()).await)
}

async fn list_functions(State(state): State<AppState>) -> Json<Vec<Function>> {
    Json(pages::functions(state.gateway.as_ref()).await)
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
    async fn tools_are_listed_by_name() {
        let (gateway, router) = app().await;
        for name in ["Web Search", "Calculator"] {
            let mut row = Row::new();
            row.insert("name".to_string(), json!(name));
            gateway.insert(Table::Tools, row).await.unwrap();
        }

        let (status, body) = json_request(router, Method::GET, "/api/tools", None).await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|tool| tool["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Calculator", "Web Search"]);
    }

    #[tokio::test]
    async fn failed_listing_is_empty_not_an_error() {
        let (gateway, router) = app().await;
        gateway.close().await;

        let (status, body) = json_request(router, Method::GET, "/api/secrets", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}
