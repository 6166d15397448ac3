use crate::api::AppError;
use crate::persistence::repo::Repository;
use crate::suggestion::service::SuggestionProvider;
use crate::wizard::model::{Effect, Wizard, WizardCommand, WizardOutcome, WizardReply};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

struct Session {
    project_id: String,
    wizard: Wizard,
}

#[derive(Serialize, Clone, Debug)]
pub struct WizardView {
    pub session_id: String,
    pub project_id: String,
    pub wizard: Wizard,
    /// Set once the wizard exited; the session is gone at that point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<WizardOutcome>,
}

/// Open wizards keyed by session id. The lock is never held across an await:
/// effects run unlocked and their replies are applied afterwards, if the
/// session is still there.
pub struct WizardSessions {
    repository: Repository,
    suggestions: Arc<SuggestionProvider>,
    sessions: Mutex<HashMap<String, Session>>,
}

fn not_found(session_id: &str) -> AppError {
    AppError::NotFound(format!("Wizard session '{}' not found", session_id))
}

impl WizardSessions {
    pub fn new(repository: Repository, suggestions: Arc<SuggestionProvider>) -> Self {
        WizardSessions {
            repository,
            suggestions,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Session>>, AppError> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal("wizard session lock poisoned".to_string()))
    }

    fn view(session_id: &str, session: &Session, outcome: Option<WizardOutcome>) -> WizardView {
        WizardView {
            session_id: session_id.to_string(),
            project_id: session.project_id.clone(),
            wizard: session.wizard.clone(),
            outcome,
        }
    }

    pub async fn open(&self, project_id: &str) -> Result<WizardView, AppError> {
        self.repository.projects().require(project_id).await?;
        let session_id = self.repository.next_id("wiz");
        let session = Session {
            project_id: project_id.to_string(),
            wizard: Wizard::new(),
        };
        let view = Self::view(&session_id, &session, None);
        self.lock()?.insert(session_id.clone(), session);
        info!(project_id, session_id = %session_id, "Opened AI wizard");
        Ok(view)
    }

    pub fn get(&self, session_id: &str) -> Result<WizardView, AppError> {
        let sessions = self.lock()?;
        let session = sessions.get(session_id).ok_or_else(|| not_found(session_id))?;
        Ok(Self::view(session_id, session, None))
    }

    pub async fn close(&self, session_id: &str) -> Result<WizardView, AppError> {
        self.dispatch(session_id, WizardCommand::Close).await
    }

    /// Runs `command` and then every effect it starts. Returns the wizard
    /// as it stands once the effects settled.
    pub async fn dispatch(&self, session_id: &str, command: WizardCommand) -> Result<WizardView, AppError> {
        let project_id = self
            .lock()?
            .get(session_id)
            .map(|s| s.project_id.clone())
            .ok_or_else(|| not_found(session_id))?;
        if let WizardCommand::Continue { directory, .. } = &command {
            let directory = directory.trim();
            if !directory.is_empty() && !self.repository.directories().contains(&project_id, directory).await? {
                return Err(AppError::validation(
                    "directory",
                    format!("directory '{}' does not exist in project '{}'", directory, project_id),
                ));
            }
        }

        let command_name = command.name();
        let (effect, view) = {
            let mut sessions = self.lock()?;
            let session = sessions.get_mut(session_id).ok_or_else(|| not_found(session_id))?;
            let effect = session.wizard.handle(command)?;
            if let Some(Effect::Exit(outcome)) = &effect {
                let outcome = outcome.clone();
                let view = Self::view(session_id, session, Some(outcome.clone()));
                sessions.remove(session_id);
                info!(session_id, ?outcome, "AI wizard exited");
                return Ok(view);
            }
            (effect, Self::view(session_id, session, None))
        };
        debug!(session_id, command = command_name, "Wizard command handled");

        let Some(effect) = effect else {
            return Ok(view);
        };
        let Some(reply) = self.run(&project_id, effect).await else {
            return Ok(view);
        };

        let mut sessions = self.lock()?;
        match sessions.get_mut(session_id) {
            Some(session) => {
                session.wizard.apply(reply);
                Ok(Self::view(session_id, session, None))
            }
            // closed while the effect was running
            None => Err(not_found(session_id)),
        }
    }

    async fn run(&self, project_id: &str, effect: Effect) -> Option<WizardReply> {
        let reply = match effect {
            Effect::FetchSuggestions { ticket, requirements } => match self.suggestions.fetch(&requirements).await {
                Ok(suggestions) => WizardReply::SuggestionsLoaded { ticket, suggestions },
                Err(e) => WizardReply::Failed {
                    ticket,
                    reason: e.to_string(),
                },
            },
            Effect::FetchMoreSuggestions {
                ticket,
                requirements,
                existing,
            } => match self.suggestions.fetch_more(&requirements, &existing).await {
                Ok(suggestions) => WizardReply::MoreSuggestionsLoaded { ticket, suggestions },
                Err(e) => WizardReply::Failed {
                    ticket,
                    reason: e.to_string(),
                },
            },
            Effect::Materialize {
                ticket,
                directory,
                suggestions,
            } => match self
                .repository
                .test_cases()
                .materialize(project_id, &directory, &suggestions)
                .await
            {
                Ok(created) => WizardReply::Materialized {
                    ticket,
                    created: created.len(),
                },
                Err(e) => WizardReply::Failed {
                    ticket,
                    reason: e.to_string(),
                },
            },
            Effect::Exit(_) => return None,
        };
        Some(reply)
    }
}
