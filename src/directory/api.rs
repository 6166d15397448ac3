use crate::api::{ApiResponse, AppError};
use crate::directory::model::{DirectoryNode, DirectoryOption, DirectoryTree, NewDirectory};
use crate::persistence::repo::Repository;
use axum::extract::{Path, State};
use axum::Json;

pub async fn get_directory_tree(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
) -> Result<ApiResponse<DirectoryTree>, AppError> {
    ApiResponse::from(repository.directories().tree(&project_id).await)
}

pub async fn add_directory(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
    Json(payload): Json<NewDirectory>,
) -> Result<ApiResponse<DirectoryNode>, AppError> {
    ApiResponse::from(repository.directories().add(&project_id, payload).await)
}

pub async fn list_directory_options(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
) -> Result<ApiResponse<Vec<DirectoryOption>>, AppError> {
    ApiResponse::from(repository.directories().options(&project_id).await)
}
