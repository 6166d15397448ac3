use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    Deleted,
    Archived,
    Restored,
    Generated,
}

/// One line of a project's activity feed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Activity {
    pub id: String,
    pub project_id: String,
    pub action: ActivityAction,
    /// What was touched, e.g. `test case 'TC-0001: Login'`.
    pub subject: String,
    pub at: DateTime<Utc>,
}
