use crate::api::{ApiResponse, AppError};
use crate::dashboard::model::ProjectOverview;
use crate::dashboard::service;
use crate::persistence::repo::Repository;
use axum::extract::{Path, State};

pub async fn get_overview(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
) -> Result<ApiResponse<ProjectOverview>, AppError> {
    ApiResponse::from(service::overview(&repository, &project_id).await)
}
