use crate::case::api::{archive_test_cases, create_test_case, delete_test_case, get_test_case, query_test_cases, restore_test_case, update_test_case};
use crate::config::{Config, StorageBackend};
use crate::dashboard::api::get_overview;
use crate::directory::api::{add_directory, get_directory_tree, list_directory_options};
use crate::ids::{IdGenerator, SequentialIds, UuidIds};
use crate::persistence::repo::Repository;
use crate::project::api::{create_project, delete_project, get_project, list_projects, update_project};
use crate::suggestion::service::SuggestionProvider;
use crate::suite::api::{create_suite, delete_suite, get_suite, list_suites, update_suite};
use crate::wizard::api::{close_wizard, get_wizard, open_wizard, send_wizard_command};
use crate::wizard::session::WizardSessions;
use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

#[derive(Clone)]
pub struct AppState {
    pub repository: Repository,
    pub suggestions: Arc<SuggestionProvider>,
    pub wizards: Arc<WizardSessions>,
}

impl FromRef<AppState> for Repository {
    fn from_ref(app_state: &AppState) -> Repository {
        app_state.repository.clone()
    }
}

impl FromRef<AppState> for Arc<WizardSessions> {
    fn from_ref(app_state: &AppState) -> Arc<WizardSessions> {
        app_state.wizards.clone()
    }
}

impl AppState {
    pub fn new(repository: Repository, suggestions: SuggestionProvider) -> Self {
        let suggestions = Arc::new(suggestions);
        let wizards = Arc::new(WizardSessions::new(repository.clone(), suggestions.clone()));
        AppState {
            repository,
            suggestions,
            wizards,
        }
    }

    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let ids: Arc<dyn IdGenerator> = if config.storage.sequential_ids {
            Arc::new(SequentialIds::default())
        } else {
            Arc::new(UuidIds)
        };
        let repository = match config.storage.backend {
            StorageBackend::Memory => {
                let repository = Repository::in_memory(ids, config.storage.latency);
                if config.storage.seed {
                    repository.seed().await;
                }
                repository
            }
            StorageBackend::DynamoDb => Repository::dynamodb(ids).await,
        };
        let suggestions = SuggestionProvider::from_config(&config.suggestions, repository.ids())?;
        Ok(AppState::new(repository, suggestions))
    }
}

pub fn build_api(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/:project_id", get(get_project).put(update_project).delete(delete_project))
        .route("/projects/:project_id/overview", get(get_overview))
        .route("/projects/:project_id/suites", get(list_suites).post(create_suite))
        .route("/projects/:project_id/suites/:suite_id", get(get_suite).put(update_suite).delete(delete_suite))
        .route("/projects/:project_id/test-cases", get(query_test_cases).post(create_test_case))
        .route("/projects/:project_id/test-cases/archive", post(archive_test_cases))
        .route("/projects/:project_id/test-cases/:id", get(get_test_case).put(update_test_case).delete(delete_test_case))
        .route("/projects/:project_id/test-cases/:id/restore", post(restore_test_case))
        .route("/projects/:project_id/directories", get(get_directory_tree).post(add_directory))
        .route("/projects/:project_id/directories/options", get(list_directory_options))
        .route("/projects/:project_id/wizard", post(open_wizard))
        .route("/wizard/:session_id", get(get_wizard).delete(close_wizard))
        .route("/wizard/:session_id/commands", post(send_wizard_command))
        .layer(cors)
        .layer(TraceLayer::new_for_http()
            .make_span_with(
                DefaultMakeSpan::new().include_headers(true))
            .on_request(
                DefaultOnRequest::new()
                    .level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Micros)
            ))
        .with_state(app_state)
}

pub struct ApiResponse<T>(pub T);

impl<T> ApiResponse<T> {
    pub fn from(result: Result<T, AppError>) -> Result<ApiResponse<T>, AppError> {
        result.map(ApiResponse)
    }

    pub fn from_option(result: Result<Option<T>, AppError>, what: &str) -> Result<ApiResponse<T>, AppError> {
        match result? {
            None => Err(AppError::NotFound(format!("{} not found", what))),
            Some(val) => Ok(ApiResponse(val)),
        }
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        match serde_json::to_string(&self.0) {
            Ok(json) => (
                StatusCode::OK,
                [("Content-Type", "application/json")],
                json,
            )
                .into_response(),
            Err(err) => AppError::Internal(format!("Failed to serialize response: {}", err)).into_response(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("{0}")]
    Processing(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            message: message.into(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorBody { message, field: None }),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    message,
                    field: Some(field.to_string()),
                },
            ),
            AppError::Processing(message) => (StatusCode::UNPROCESSABLE_ENTITY, ErrorBody { message, field: None }),
            AppError::Internal(message) => {
                tracing::error!("{}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        message: "Internal server error".to_string(),
                        field: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::suggestion::service::SuggestionProvider;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn seeded_app() -> Router {
        let ids: Arc<dyn IdGenerator> = Arc::new(SequentialIds::default());
        let repository = Repository::in_memory(ids.clone(), Duration::ZERO);
        repository.seed().await;
        build_api(AppState::new(repository, SuggestionProvider::canned(ids)))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn project_lifecycle_over_http() {
        let app = seeded_app().await;

        let (status, created) = call(&app, "POST", "/projects", Some(json!({"name": "Demo", "key": "demo"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(created["key"], "DEMO");
        assert_eq!(created["client"], "N/A");

        let (_, projects) = call(&app, "GET", "/projects", None).await;
        assert!(projects.as_array().unwrap().iter().any(|p| p["key"] == "DEMO"));

        let id = created["id"].as_str().unwrap().to_string();
        let (status, updated) = call(&app, "PUT", &format!("/projects/{}", id), Some(json!({"client": "Acme"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["client"], "Acme");
        assert_eq!(updated["name"], "Demo");

        let (status, _) = call(&app, "DELETE", &format!("/projects/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = call(&app, "GET", &format!("/projects/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn validation_errors_name_the_field() {
        let app = seeded_app().await;
        let (status, body) = call(&app, "POST", "/projects", Some(json!({"name": "", "key": "X"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "name");
    }

    #[tokio::test]
    async fn query_and_archive_over_http() {
        let app = seeded_app().await;

        let (status, page) = call(&app, "GET", "/projects/proj-001/test-cases?directory=authentication/sso&rows_per_page=50", None).await;
        assert_eq!(status, StatusCode::OK);
        let total = page["total_count"].as_u64().unwrap();
        assert!(total > 0);
        assert!(page["items"]
            .as_array()
            .unwrap()
            .iter()
            .all(|tc| tc["directory"].as_str().unwrap().starts_with("authentication/sso")));

        let (status, result) = call(
            &app,
            "POST",
            "/projects/proj-001/test-cases/archive",
            Some(json!({"ids": ["tc-22C99939", "does-not-exist"]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["archived"], 1);

        let (_, trash) = call(&app, "GET", "/projects/proj-001/test-cases?directory=Trash&rows_per_page=50", None).await;
        assert!(trash["items"].as_array().unwrap().iter().any(|tc| tc["id"] == "tc-22C99939"));

        let (_, all) = call(&app, "GET", "/projects/proj-001/test-cases?status=All&rows_per_page=50", None).await;
        assert!(!all["items"].as_array().unwrap().iter().any(|tc| tc["id"] == "tc-22C99939"));
    }

    #[tokio::test]
    async fn wizard_flow_over_http() {
        let app = seeded_app().await;

        let (status, opened) = call(&app, "POST", "/projects/proj-001/wizard", None).await;
        assert_eq!(status, StatusCode::OK);
        let session = opened["session_id"].as_str().unwrap().to_string();
        let commands = format!("/wizard/{}/commands", session);

        let (status, view) = call(
            &app,
            "POST",
            &commands,
            Some(json!({"type": "continue", "requirements": "Login page", "directory": "authentication"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["wizard"]["step"]["step"], "review_and_select");

        let (status, body) = call(&app, "POST", &commands, Some(json!({"type": "generate"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["message"].as_str().unwrap().contains("selected"));

        call(&app, "POST", &commands, Some(json!({"type": "select_all", "checked": true}))).await;
        let (_, view) = call(&app, "POST", &commands, Some(json!({"type": "generate"}))).await;
        assert_eq!(view["wizard"]["step"]["phase"]["state"], "done");
        assert_eq!(view["wizard"]["step"]["phase"]["created"], 5);

        let (_, finished) = call(&app, "POST", &commands, Some(json!({"type": "finish"}))).await;
        assert_eq!(finished["outcome"]["result"], "generated");

        let (status, _) = call(&app, "GET", &format!("/wizard/{}", session), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
