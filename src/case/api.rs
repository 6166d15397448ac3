use crate::api::{ApiResponse, AppError};
use crate::case::model::{NewTestCase, Priority, Status, TestCase, TestCaseChanges};
use crate::case::query::{QueryPage, TestCaseQuery, DEFAULT_ROWS_PER_PAGE};
use crate::directory::model::DirectorySelection;
use crate::persistence::repo::Repository;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Raw query string. Values stay strings so bad input gets a proper field error.
#[derive(Deserialize, Debug, Default)]
pub struct TestCaseQueryParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub directory: Option<String>,
    pub page: Option<String>,
    pub rows_per_page: Option<String>,
}

/// Empty values and the `All` sentinel mean "no filter".
fn filter_value(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn parse_filter<T: FromStr<Err = String>>(field: &'static str, value: Option<String>) -> Result<Option<T>, AppError> {
    filter_value(value)
        .map(|v| v.parse::<T>().map_err(|e| AppError::validation(field, e)))
        .transpose()
}

fn parse_number(field: &'static str, value: Option<String>, default: usize) -> Result<usize, AppError> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| AppError::validation(field, format!("'{}' is not a valid number", v))),
    }
}

impl TestCaseQueryParams {
    pub fn into_query(self, project_id: String) -> Result<TestCaseQuery, AppError> {
        let mut query = TestCaseQuery::for_project(project_id);
        query.filters.search = self.search.unwrap_or_default();
        query.filters.status = parse_filter::<Status>("status", self.status)?;
        query.filters.priority = parse_filter::<Priority>("priority", self.priority)?;
        query.filters.assignee = filter_value(self.assignee);
        query.directory = DirectorySelection::parse(self.directory.as_deref().unwrap_or_default());
        query.page = parse_number("page", self.page, 1)?;
        query.rows_per_page = parse_number("rows_per_page", self.rows_per_page, DEFAULT_ROWS_PER_PAGE)?;
        Ok(query)
    }
}

#[derive(Deserialize, Debug)]
pub struct ArchiveRequest {
    pub ids: Vec<String>,
}

#[derive(Serialize, Debug)]
pub struct ArchiveResult {
    pub archived: usize,
}

pub async fn query_test_cases(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
    Query(params): Query<TestCaseQueryParams>,
) -> Result<ApiResponse<QueryPage<TestCase>>, AppError> {
    let query = params.into_query(project_id)?;
    ApiResponse::from(repository.test_cases().query(query).await)
}

pub async fn get_test_case(
    Path((project_id, id)): Path<(String, String)>,
    State(repository): State<Repository>,
) -> Result<ApiResponse<TestCase>, AppError> {
    ApiResponse::from_option(repository.test_cases().get(&project_id, &id).await, "Test case")
}

pub async fn create_test_case(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
    Json(payload): Json<NewTestCase>,
) -> Result<ApiResponse<TestCase>, AppError> {
    ApiResponse::from(repository.test_cases().create(&project_id, payload).await)
}

pub async fn update_test_case(
    Path((project_id, id)): Path<(String, String)>,
    State(repository): State<Repository>,
    Json(payload): Json<TestCaseChanges>,
) -> Result<ApiResponse<TestCase>, AppError> {
    ApiResponse::from(repository.test_cases().update(&project_id, &id, payload).await)
}

pub async fn delete_test_case(
    Path((project_id, id)): Path<(String, String)>,
    State(repository): State<Repository>,
) -> Result<ApiResponse<TestCase>, AppError> {
    ApiResponse::from(repository.test_cases().delete(&project_id, &id).await)
}

pub async fn archive_test_cases(
    Path(project_id): Path<String>,
    State(repository): State<Repository>,
    Json(payload): Json<ArchiveRequest>,
) -> Result<ApiResponse<ArchiveResult>, AppError> {
    let archived = repository.test_cases().archive(&project_id, &payload.ids).await?;
    Ok(ApiResponse(ArchiveResult { archived }))
}

pub async fn restore_test_case(
    Path((project_id, id)): Path<(String, String)>,
    State(repository): State<Repository>,
) -> Result<ApiResponse<TestCase>, AppError> {
    ApiResponse::from(repository.test_cases().restore(&project_id, &id).await)
}
