use crate::activity::model::Activity;
use crate::case::model::{Priority, Status};
use crate::project::model::Project;
use serde::Serialize;
use std::collections::BTreeMap;

/// Numbers shown on a project's overview page.
#[derive(Serialize, Clone, Debug)]
pub struct ProjectOverview {
    pub project: Project,
    pub suites: usize,
    pub active_test_cases: usize,
    pub archived_test_cases: usize,
    /// Every status, archived included, zero counts kept.
    pub by_status: BTreeMap<Status, usize>,
    /// Active test cases only.
    pub by_priority: BTreeMap<Priority, usize>,
    /// Newest first.
    pub recent_activity: Vec<Activity>,
}
