use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AiSuggestion {
    pub id: String,
    pub title: String,
    pub description: String,
}
