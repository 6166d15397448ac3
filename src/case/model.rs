use bon::Builder;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Critical, Priority::High, Priority::Medium, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "Critical",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Draft,
    #[serde(rename = "In Review")]
    InReview,
    Approved,
    #[serde(rename = "Need Update")]
    NeedUpdate,
    Archived,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Draft,
        Status::InReview,
        Status::Approved,
        Status::NeedUpdate,
        Status::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "Draft",
            Status::InReview => "In Review",
            Status::Approved => "Approved",
            Status::NeedUpdate => "Need Update",
            Status::Archived => "Archived",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown priority '{}'", s))
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['_', '-'], " ");
        Status::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown status '{}'", s))
    }
}

pub const UNASSIGNED: &str = "Unassigned";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Builder)]
pub struct TestCase {
    pub id: String,
    pub case_code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[builder(default = Priority::Medium)]
    pub priority: Priority,
    #[builder(default = Status::Draft)]
    pub status: Status,
    #[builder(default = UNASSIGNED.to_string())]
    pub assignee: String,
    pub last_updated: NaiveDate,
    pub project_id: String,
    pub directory: String,
}

impl TestCase {
    pub fn is_archived(&self) -> bool {
        self.status == Status::Archived
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct NewTestCase {
    pub name: String,
    pub directory: String,
    pub case_code: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub assignee: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct TestCaseChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub assignee: Option<String>,
    pub directory: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_display_and_loose_forms() {
        assert_eq!("In Review".parse::<Status>().unwrap(), Status::InReview);
        assert_eq!("need_update".parse::<Status>().unwrap(), Status::NeedUpdate);
        assert_eq!("archived".parse::<Status>().unwrap(), Status::Archived);
        assert!("Deleted".parse::<Status>().is_err());
    }

    #[test]
    fn status_serializes_with_spaces() {
        assert_eq!(serde_json::to_string(&Status::NeedUpdate).unwrap(), "\"Need Update\"");
        assert_eq!(serde_json::from_str::<Status>("\"In Review\"").unwrap(), Status::InReview);
    }

    #[test]
    fn priority_parses_case_insensitively() {
        assert_eq!("critical".parse::<Priority>().unwrap(), Priority::Critical);
        assert!("Urgent".parse::<Priority>().is_err());
    }
}
