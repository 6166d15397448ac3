use crate::api::{ApiResponse, AppError};
use crate::persistence::repo::Repository;
use crate::suite::model::{NewTestSuite, TestSuite, TestSuiteChanges};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

pub async fn list_suites(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
) -> Result<ApiResponse<Vec<TestSuite>>, AppError> {
    repository.projects().require(&project_id).await?;
    ApiResponse::from(repository.suites().list(&project_id).await)
}

pub async fn get_suite(
    Path((project_id, suite_id)): Path<(String, String)>,
    State(repository): State<Repository>,
) -> Result<ApiResponse<TestSuite>, AppError> {
    ApiResponse::from_option(repository.suites().get(&project_id, &suite_id).await, "Test suite")
}

pub async fn create_suite(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
    Json(payload): Json<NewTestSuite>,
) -> Result<ApiResponse<TestSuite>, AppError> {
    ApiResponse::from(repository.suites().create(&project_id, payload).await)
}

pub async fn update_suite(
    Path((project_id, suite_id)): Path<(String, String)>,
    State(repository): State<Repository>,
    Json(payload): Json<TestSuiteChanges>,
) -> Result<ApiResponse<TestSuite>, AppError> {
    ApiResponse::from(repository.suites().update(&project_id, &suite_id, payload).await)
}

pub async fn delete_suite(
    Path((project_id, suite_id)): Path<(String, String)>,
    State(repository): State<Repository>,
) -> Result<StatusCode, AppError> {
    repository.suites().delete(&project_id, &suite_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
