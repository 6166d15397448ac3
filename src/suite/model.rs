use bon::Builder;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Builder)]
pub struct TestSuite {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[builder(default)]
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct NewTestSuite {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct TestSuiteChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}
