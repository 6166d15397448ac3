use crate::api::{ApiResponse, AppError};
use crate::wizard::model::WizardCommand;
use crate::wizard::session::{WizardSessions, WizardView};
use axum::extract::{Path, State};
use axum::Json;
use std::sync::Arc;

pub async fn open_wizard(
    Path(project_id): Path<String>,
    State(wizards): State<Arc<WizardSessions>>,
) -> Result<ApiResponse<WizardView>, AppError> {
    ApiResponse::from(wizards.open(&project_id).await)
}

pub async fn get_wizard(
    Path(session_id): Path<String>,
    State(wizards): State<Arc<WizardSessions>>,
) -> Result<ApiResponse<WizardView>, AppError> {
    ApiResponse::from(wizards.get(&session_id))
}

pub async fn send_wizard_command(
    Path(session_id): Path<String>,
    State(wizards): State<Arc<WizardSessions>>,
    Json(command): Json<WizardCommand>,
) -> Result<ApiResponse<WizardView>, AppError> {
    ApiResponse::from(wizards.dispatch(&session_id, command).await)
}

pub async fn close_wizard(
    Path(session_id): Path<String>,
    State(wizards): State<Arc<WizardSessions>>,
) -> Result<ApiResponse<WizardView>, AppError> {
    ApiResponse::from(wizards.close(&session_id).await)
}
