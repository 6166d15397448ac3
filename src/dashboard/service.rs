use crate::activity::model::Activity;
use crate::api::AppError;
use crate::case::model::{Priority, Status, TestCase};
use crate::dashboard::model::ProjectOverview;
use crate::persistence::repo::Repository;
use crate::project::model::Project;
use std::collections::BTreeMap;
use tracing::debug;

pub const RECENT_ACTIVITY_LIMIT: usize = 10;

pub fn summarize(
    project: Project,
    suites: usize,
    test_cases: &[TestCase],
    recent_activity: Vec<Activity>,
) -> ProjectOverview {
    let mut by_status: BTreeMap<Status, usize> = Status::ALL.into_iter().map(|s| (s, 0)).collect();
    let mut by_priority: BTreeMap<Priority, usize> = Priority::ALL.into_iter().map(|p| (p, 0)).collect();
    for test_case in test_cases {
        *by_status.entry(test_case.status).or_default() += 1;
        if !test_case.is_archived() {
            *by_priority.entry(test_case.priority).or_default() += 1;
        }
    }
    let archived = by_status.get(&Status::Archived).copied().unwrap_or_default();
    ProjectOverview {
        project,
        suites,
        active_test_cases: test_cases.len() - archived,
        archived_test_cases: archived,
        by_status,
        by_priority,
        recent_activity,
    }
}

pub async fn overview(repository: &Repository, project_id: &str) -> Result<ProjectOverview, AppError> {
    let project = repository.projects().require(project_id).await?;
    let suites = repository.suites().list(project_id).await?;
    let test_cases = repository.test_cases().records(project_id).await?;
    let recent_activity = repository.activity().recent(project_id, RECENT_ACTIVITY_LIMIT).await?;
    debug!(project_id, suites = suites.len(), test_cases = test_cases.len(), "Built project overview");
    Ok(summarize(project, suites.len(), &test_cases, recent_activity))
}
