use crate::api::{ApiResponse, AppError};
use crate::persistence::repo::Repository;
use crate::project::model::{NewProject, Project, ProjectChanges};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

pub async fn list_projects(State(repository): State<Repository>) -> Result<ApiResponse<Vec<Project>>, AppError> {
    ApiResponse::from(repository.projects().list().await)
}

pub async fn get_project(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
) -> Result<ApiResponse<Project>, AppError> {
    ApiResponse::from_option(repository.projects().get(&project_id).await, "Project")
}

pub async fn create_project(
    State(repository): State<Repository>,
    Json(payload): Json<NewProject>,
) -> Result<ApiResponse<Project>, AppError> {
    ApiResponse::from(repository.projects().create(payload).await)
}

pub async fn update_project(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
    Json(payload): Json<ProjectChanges>,
) -> Result<ApiResponse<Project>, AppError> {
    ApiResponse::from(repository.projects().update(&project_id, payload).await)
}

pub async fn delete_project(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
) -> Result<StatusCode, AppError> {
    repository.projects().delete(&project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
