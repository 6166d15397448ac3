use crate::api::AppError;
use crate::suggestion::model::AiSuggestion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The AI-generate wizard. Only changed through [`Wizard::handle`] and
/// [`Wizard::apply`], see `wizard::machine`.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Wizard {
    pub step: WizardStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<Pending>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    /// Survives resets so a reply issued before a reset never matches again.
    #[serde(skip)]
    pub(crate) next_ticket: u64,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WizardStep {
    DefineRequirement {
        requirements: String,
        directory: String,
        loading: bool,
    },
    ReviewAndSelect {
        requirements: String,
        directory: String,
        suggestions: Vec<AiSuggestion>,
        selected: BTreeSet<String>,
        mode: ReviewMode,
    },
    Complete {
        directory: String,
        selected: Vec<AiSuggestion>,
        phase: CompletePhase,
    },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReviewMode {
    Viewing,
    EditingRequirements { draft: String },
    ConfirmingRegenerate { requirements: String },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CompletePhase {
    Generating,
    Done { created: usize, directory: String },
    Failed { reason: String },
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct Pending {
    pub ticket: u64,
    pub request: PendingRequest,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingRequest {
    Suggestions,
    MoreSuggestions,
    Regenerate { requirements: String },
    Materialize,
}

/// User input.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardCommand {
    Continue { requirements: String, directory: String },
    ToggleSuggestion { id: String, checked: bool },
    SelectAll { checked: bool },
    EditSuggestion {
        id: String,
        title: Option<String>,
        description: Option<String>,
    },
    GenerateMore,
    EditRequirements,
    CancelEditRequirements,
    RequestRegenerate { requirements: String },
    ConfirmRegenerate,
    DismissRegenerate,
    Generate,
    Cancel,
    Finish,
    Close,
}

impl WizardCommand {
    pub fn name(&self) -> &'static str {
        match self {
            WizardCommand::Continue { .. } => "continue",
            WizardCommand::ToggleSuggestion { .. } => "toggle_suggestion",
            WizardCommand::SelectAll { .. } => "select_all",
            WizardCommand::EditSuggestion { .. } => "edit_suggestion",
            WizardCommand::GenerateMore => "generate_more",
            WizardCommand::EditRequirements => "edit_requirements",
            WizardCommand::CancelEditRequirements => "cancel_edit_requirements",
            WizardCommand::RequestRegenerate { .. } => "request_regenerate",
            WizardCommand::ConfirmRegenerate => "confirm_regenerate",
            WizardCommand::DismissRegenerate => "dismiss_regenerate",
            WizardCommand::Generate => "generate",
            WizardCommand::Cancel => "cancel",
            WizardCommand::Finish => "finish",
            WizardCommand::Close => "close",
        }
    }
}

/// Result of an effect, fed back into the wizard.
#[derive(Clone, Debug, PartialEq)]
pub enum WizardReply {
    SuggestionsLoaded { ticket: u64, suggestions: Vec<AiSuggestion> },
    MoreSuggestionsLoaded { ticket: u64, suggestions: Vec<AiSuggestion> },
    Materialized { ticket: u64, created: usize },
    Failed { ticket: u64, reason: String },
}

impl WizardReply {
    pub fn ticket(&self) -> u64 {
        match self {
            WizardReply::SuggestionsLoaded { ticket, .. }
            | WizardReply::MoreSuggestionsLoaded { ticket, .. }
            | WizardReply::Materialized { ticket, .. }
            | WizardReply::Failed { ticket, .. } => *ticket,
        }
    }
}

/// Work the owner of a wizard has to carry out after a command.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    FetchSuggestions { ticket: u64, requirements: String },
    FetchMoreSuggestions {
        ticket: u64,
        requirements: String,
        existing: Vec<AiSuggestion>,
    },
    Materialize {
        ticket: u64,
        directory: String,
        suggestions: Vec<AiSuggestion>,
    },
    Exit(WizardOutcome),
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum WizardOutcome {
    NoChanges,
    Generated { count: usize },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("no suggestion is selected")]
    NothingSelected,
    #[error("another request is still in progress")]
    Busy,
    #[error("'{command}' is not allowed while {state}")]
    InvalidCommand { command: &'static str, state: &'static str },
    #[error("suggestion '{0}' does not exist")]
    UnknownSuggestion(String),
    #[error("{field} is required")]
    Validation { field: &'static str },
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::Validation { field } => AppError::validation(field, err.to_string()),
            WizardError::UnknownSuggestion(_) => AppError::NotFound(err.to_string()),
            WizardError::NothingSelected | WizardError::Busy | WizardError::InvalidCommand { .. } => {
                AppError::Processing(err.to_string())
            }
        }
    }
}
