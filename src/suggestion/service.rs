use crate::api::AppError;
use crate::config::SuggestionConfig;
use crate::ids::IdGenerator;
use crate::suggestion::model::AiSuggestion;
use crate::validation::required;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

const ID_PREFIX: &str = "ai-sugg";

const LOGIN_SUGGESTIONS: [(&str, &str); 5] = [
    (
        "Verify successful login with valid credentials",
        "User enters a correct username and password, then clicks \"Login\". The user should be redirected to the dashboard.",
    ),
    (
        "Verify login failure with invalid password",
        "User enters a correct username and an incorrect password. An error message \"Invalid credentials\" should be displayed.",
    ),
    (
        "Verify \"Remember Me\" functionality",
        "User checks the \"Remember Me\" box, logs in successfully, closes the browser, and re-opens the page. The user should still be logged in.",
    ),
    (
        "Verify password visibility toggle",
        "User clicks the \"show/hide\" icon in the password field. The password text should toggle between visible and obscured.",
    ),
    (
        "Test login form with empty fields",
        "User leaves both username and password fields empty and clicks \"Login\". A validation message should appear for both fields.",
    ),
];

const MORE_SUGGESTIONS: [(&str, &str); 3] = [
    (
        "Verify account lockout after repeated failures",
        "User enters a wrong password five times in a row. The account should be locked and a notice shown.",
    ),
    (
        "Verify \"Forgot Password\" link",
        "User clicks \"Forgot Password\" on the login form. The password reset page should open.",
    ),
    (
        "Verify session timeout",
        "User stays idle after logging in until the session expires. The next action should redirect to the login page.",
    ),
];

#[derive(Serialize)]
struct SuggestionRequest<'a> {
    requirements: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    existing: Vec<&'a str>,
}

/// What a remote service answers with. Ids are assigned on our side.
#[derive(Deserialize)]
struct SuggestionDraft {
    title: String,
    #[serde(default)]
    description: String,
}

pub enum SuggestionProvider {
    /// Fixed suggestions, used for demos and tests.
    Canned { ids: Arc<dyn IdGenerator> },
    Remote {
        client: Client,
        endpoint: Url,
        ids: Arc<dyn IdGenerator>,
    },
}

impl SuggestionProvider {
    pub fn canned(ids: Arc<dyn IdGenerator>) -> Self {
        SuggestionProvider::Canned { ids }
    }

    pub fn from_config(config: &SuggestionConfig, ids: Arc<dyn IdGenerator>) -> Result<Self, AppError> {
        let Some(endpoint) = &config.endpoint else {
            info!("Using canned AI suggestions");
            return Ok(Self::canned(ids));
        };
        // a trailing slash keeps Url::join from dropping the last path segment
        let base = format!("{}/", endpoint.trim_end_matches('/'));
        let endpoint = Url::parse(&base)
            .map_err(|e| AppError::Internal(format!("invalid suggestion endpoint '{}': {}", base, e)))?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build suggestion client: {}", e)))?;
        info!(endpoint = %endpoint, "Using remote AI suggestions");
        Ok(SuggestionProvider::Remote { client, endpoint, ids })
    }

    pub async fn fetch(&self, requirements: &str) -> Result<Vec<AiSuggestion>, AppError> {
        let requirements = required("requirements", requirements)?;
        debug!(requirements = %requirements, "Fetching AI suggestions");
        match self {
            SuggestionProvider::Canned { ids } => Ok(canned(ids.as_ref(), &LOGIN_SUGGESTIONS)),
            SuggestionProvider::Remote { client, endpoint, ids } => {
                let request = SuggestionRequest {
                    requirements: &requirements,
                    existing: vec![],
                };
                post(client, endpoint, "suggestions", &request, ids.as_ref()).await
            }
        }
    }

    /// Further suggestions for the same requirements, avoiding `existing`.
    pub async fn fetch_more(&self, requirements: &str, existing: &[AiSuggestion]) -> Result<Vec<AiSuggestion>, AppError> {
        let requirements = required("requirements", requirements)?;
        debug!(requirements = %requirements, existing = existing.len(), "Fetching more AI suggestions");
        match self {
            SuggestionProvider::Canned { ids } => Ok(canned(ids.as_ref(), &MORE_SUGGESTIONS)),
            SuggestionProvider::Remote { client, endpoint, ids } => {
                let request = SuggestionRequest {
                    requirements: &requirements,
                    existing: existing.iter().map(|s| s.title.as_str()).collect(),
                };
                post(client, endpoint, "suggestions/more", &request, ids.as_ref()).await
            }
        }
    }
}

fn canned(ids: &dyn IdGenerator, templates: &[(&str, &str)]) -> Vec<AiSuggestion> {
    templates
        .iter()
        .map(|(title, description)| AiSuggestion {
            id: ids.next_id(ID_PREFIX),
            title: title.to_string(),
            description: description.to_string(),
        })
        .collect()
}

async fn post(
    client: &Client,
    endpoint: &Url,
    path: &str,
    request: &SuggestionRequest<'_>,
    ids: &dyn IdGenerator,
) -> Result<Vec<AiSuggestion>, AppError> {
    let url = endpoint
        .join(path)
        .map_err(|e| AppError::Internal(format!("invalid suggestion url: {}", e)))?;
    let unavailable = |e: reqwest::Error| {
        warn!(url = %url, "suggestion request failed: {}", e);
        AppError::Processing(format!("suggestion service unavailable: {}", e))
    };
    let drafts: Vec<SuggestionDraft> = client
        .post(url.clone())
        .json(request)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(unavailable)?
        .json()
        .await
        .map_err(unavailable)?;
    info!(url = %url, count = drafts.len(), "Received AI suggestions");
    Ok(drafts
        .into_iter()
        .filter(|d| !d.title.trim().is_empty())
        .map(|d| AiSuggestion {
            id: ids.next_id(ID_PREFIX),
            title: d.title.trim().to_string(),
            description: d.description.trim().to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use std::time::Duration;

    fn provider() -> SuggestionProvider {
        SuggestionProvider::canned(Arc::new(SequentialIds::default()))
    }

    #[tokio::test]
    async fn canned_suggestions_get_fresh_ids() {
        let provider = provider();
        let first = provider.fetch("Login page").await.unwrap();
        let second = provider.fetch("Login page").await.unwrap();
        assert_eq!(first.len(), 5);
        assert_eq!(first[0].title, "Verify successful login with valid credentials");
        assert_eq!(first[0].id, "ai-sugg-0001");
        assert_eq!(second[0].id, "ai-sugg-0006");
    }

    #[tokio::test]
    async fn more_suggestions_are_a_smaller_batch() {
        let more = provider().fetch_more("Login page", &[]).await.unwrap();
        assert_eq!(more.len(), 3);
    }

    #[tokio::test]
    async fn blank_requirements_are_rejected() {
        assert!(matches!(
            provider().fetch("   ").await,
            Err(AppError::Validation { field: "requirements", .. })
        ));
    }

    #[test]
    fn config_selects_the_provider() {
        let ids: Arc<dyn IdGenerator> = Arc::new(SequentialIds::default());
        let canned = SuggestionConfig {
            endpoint: None,
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(
            SuggestionProvider::from_config(&canned, ids.clone()).unwrap(),
            SuggestionProvider::Canned { .. }
        ));

        let remote = SuggestionConfig {
            endpoint: Some("http://localhost:9000/ai".to_string()),
            timeout: Duration::from_secs(1),
        };
        match SuggestionProvider::from_config(&remote, ids.clone()).unwrap() {
            SuggestionProvider::Remote { endpoint, .. } => {
                assert_eq!(endpoint.join("suggestions/more").unwrap().as_str(), "http://localhost:9000/ai/suggestions/more");
            }
            SuggestionProvider::Canned { .. } => panic!("expected the remote provider"),
        }

        let broken = SuggestionConfig {
            endpoint: Some("not a url".to_string()),
            timeout: Duration::from_secs(1),
        };
        assert!(SuggestionProvider::from_config(&broken, ids).is_err());
    }
}
