use bon::Builder;
use serde::{Deserialize, Serialize};

pub const MAX_KEY_LENGTH: usize = 5;
pub const NO_CLIENT: &str = "N/A";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Builder)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[builder(default = NO_CLIENT.to_string())]
    pub client: String,
    pub key: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct NewProject {
    pub name: String,
    pub key: String,
    pub client: Option<String>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub key: Option<String>,
    pub client: Option<String>,
}
