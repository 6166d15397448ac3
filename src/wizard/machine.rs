use crate::suggestion::model::AiSuggestion;
use crate::wizard::model::{
    CompletePhase, Effect, Pending, PendingRequest, ReviewMode, Wizard, WizardCommand, WizardError, WizardOutcome,
    WizardReply, WizardStep,
};
use std::collections::BTreeSet;
use tracing::{debug, warn};

fn non_empty(field: &'static str, value: &str) -> Result<String, WizardError> {
    let value = value.trim();
    if value.is_empty() {
        Err(WizardError::Validation { field })
    } else {
        Ok(value.to_string())
    }
}

impl Default for Wizard {
    fn default() -> Self {
        Wizard::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Wizard {
            step: WizardStep::DefineRequirement {
                requirements: String::new(),
                directory: String::new(),
                loading: false,
            },
            pending: None,
            notice: None,
            next_ticket: 0,
        }
    }

    fn state_name(&self) -> &'static str {
        match &self.step {
            WizardStep::DefineRequirement { .. } => "defining requirements",
            WizardStep::ReviewAndSelect { mode, .. } => match mode {
                ReviewMode::Viewing => "reviewing suggestions",
                ReviewMode::EditingRequirements { .. } => "editing requirements",
                ReviewMode::ConfirmingRegenerate { .. } => "confirming regeneration",
            },
            WizardStep::Complete { phase, .. } => match phase {
                CompletePhase::Generating => "generating test cases",
                CompletePhase::Done { .. } => "done",
                CompletePhase::Failed { .. } => "failed",
            },
        }
    }

    fn start(&mut self, request: PendingRequest) -> u64 {
        self.next_ticket += 1;
        self.pending = Some(Pending {
            ticket: self.next_ticket,
            request,
        });
        self.next_ticket
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        match self.pending {
            Some(_) => Err(WizardError::Busy),
            None => Ok(()),
        }
    }

    /// Back to a blank first step. Outstanding tickets stay invalid.
    fn exit(&mut self, outcome: WizardOutcome) -> Option<Effect> {
        *self = Wizard {
            next_ticket: self.next_ticket,
            ..Wizard::new()
        };
        Some(Effect::Exit(outcome))
    }

    /// Applies a user command. On error the wizard is left untouched.
    pub fn handle(&mut self, command: WizardCommand) -> Result<Option<Effect>, WizardError> {
        let invalid = WizardError::InvalidCommand {
            command: command.name(),
            state: self.state_name(),
        };
        if command == WizardCommand::Close {
            return Ok(self.exit(WizardOutcome::NoChanges));
        }

        let effect = match (&mut self.step, command) {
            (WizardStep::DefineRequirement { .. }, WizardCommand::Continue { requirements, directory }) => {
                self.ensure_idle()?;
                let requirements = non_empty("requirements", &requirements)?;
                let directory = non_empty("directory", &directory)?;
                let ticket = self.start(PendingRequest::Suggestions);
                self.step = WizardStep::DefineRequirement {
                    requirements: requirements.clone(),
                    directory,
                    loading: true,
                };
                Some(Effect::FetchSuggestions { ticket, requirements })
            }
            (WizardStep::DefineRequirement { .. }, WizardCommand::Cancel) => self.exit(WizardOutcome::NoChanges),

            (WizardStep::ReviewAndSelect { suggestions, selected, .. }, WizardCommand::ToggleSuggestion { id, checked }) => {
                if !suggestions.iter().any(|s| s.id == id) {
                    return Err(WizardError::UnknownSuggestion(id));
                }
                if checked {
                    selected.insert(id);
                } else {
                    selected.remove(&id);
                }
                None
            }
            (WizardStep::ReviewAndSelect { suggestions, selected, .. }, WizardCommand::SelectAll { checked }) => {
                *selected = if checked {
                    suggestions.iter().map(|s| s.id.clone()).collect()
                } else {
                    BTreeSet::new()
                };
                None
            }
            (
                WizardStep::ReviewAndSelect { suggestions, .. },
                WizardCommand::EditSuggestion { id, title, description },
            ) => {
                let title = title.as_deref().map(|t| non_empty("title", t)).transpose()?;
                let suggestion = suggestions
                    .iter_mut()
                    .find(|s| s.id == id)
                    .ok_or(WizardError::UnknownSuggestion(id))?;
                if let Some(title) = title {
                    suggestion.title = title;
                }
                if let Some(description) = description {
                    suggestion.description = description.trim().to_string();
                }
                None
            }
            (
                WizardStep::ReviewAndSelect {
                    requirements,
                    suggestions,
                    mode: ReviewMode::Viewing,
                    ..
                },
                WizardCommand::GenerateMore,
            ) => {
                let requirements = requirements.clone();
                let existing = suggestions.clone();
                self.ensure_idle()?;
                let ticket = self.start(PendingRequest::MoreSuggestions);
                Some(Effect::FetchMoreSuggestions {
                    ticket,
                    requirements,
                    existing,
                })
            }
            (
                WizardStep::ReviewAndSelect {
                    requirements,
                    mode: mode @ ReviewMode::Viewing,
                    ..
                },
                WizardCommand::EditRequirements,
            ) => {
                *mode = ReviewMode::EditingRequirements {
                    draft: requirements.clone(),
                };
                None
            }
            (
                WizardStep::ReviewAndSelect {
                    mode: mode @ ReviewMode::EditingRequirements { .. },
                    ..
                },
                WizardCommand::CancelEditRequirements,
            ) => {
                *mode = ReviewMode::Viewing;
                None
            }
            (
                WizardStep::ReviewAndSelect {
                    mode: mode @ (ReviewMode::Viewing | ReviewMode::EditingRequirements { .. }),
                    ..
                },
                WizardCommand::RequestRegenerate { requirements },
            ) => {
                let requirements = non_empty("requirements", &requirements)?;
                *mode = ReviewMode::ConfirmingRegenerate { requirements };
                None
            }
            (
                WizardStep::ReviewAndSelect {
                    mode: ReviewMode::ConfirmingRegenerate { requirements },
                    ..
                },
                WizardCommand::ConfirmRegenerate,
            ) => {
                let requirements = requirements.clone();
                self.ensure_idle()?;
                let ticket = self.start(PendingRequest::Regenerate {
                    requirements: requirements.clone(),
                });
                if let WizardStep::ReviewAndSelect { mode, .. } = &mut self.step {
                    *mode = ReviewMode::Viewing;
                }
                Some(Effect::FetchSuggestions { ticket, requirements })
            }
            (
                WizardStep::ReviewAndSelect {
                    mode: mode @ ReviewMode::ConfirmingRegenerate { .. },
                    ..
                },
                WizardCommand::DismissRegenerate,
            ) => {
                *mode = ReviewMode::Viewing;
                None
            }
            (
                WizardStep::ReviewAndSelect {
                    directory,
                    suggestions,
                    selected,
                    ..
                },
                WizardCommand::Generate,
            ) => {
                if selected.is_empty() {
                    return Err(WizardError::NothingSelected);
                }
                let directory = directory.clone();
                let chosen: Vec<AiSuggestion> = suggestions.iter().filter(|s| selected.contains(&s.id)).cloned().collect();
                self.ensure_idle()?;
                let ticket = self.start(PendingRequest::Materialize);
                self.step = WizardStep::Complete {
                    directory: directory.clone(),
                    selected: chosen.clone(),
                    phase: CompletePhase::Generating,
                };
                Some(Effect::Materialize {
                    ticket,
                    directory,
                    suggestions: chosen,
                })
            }
            (WizardStep::ReviewAndSelect { .. }, WizardCommand::Cancel) => self.exit(WizardOutcome::NoChanges),

            (
                WizardStep::Complete {
                    phase: CompletePhase::Done { created, .. },
                    ..
                },
                WizardCommand::Finish,
            ) => {
                let count = *created;
                self.exit(WizardOutcome::Generated { count })
            }
            (
                WizardStep::Complete {
                    phase: CompletePhase::Failed { .. },
                    ..
                },
                WizardCommand::Finish,
            ) => self.exit(WizardOutcome::NoChanges),

            _ => return Err(invalid),
        };
        if !matches!(effect, Some(Effect::Exit(_))) {
            self.notice = None;
        }
        debug!(state = self.state_name(), "Wizard command applied");
        Ok(effect)
    }

    /// Applies the result of an effect. Replies whose ticket is not the
    /// pending one are dropped and `false` is returned.
    pub fn apply(&mut self, reply: WizardReply) -> bool {
        let request = match self.pending.take() {
            Some(pending) if pending.ticket == reply.ticket() => pending.request,
            other => {
                self.pending = other;
                debug!(ticket = reply.ticket(), "Ignoring stale wizard reply");
                return false;
            }
        };

        match (&mut self.step, request, reply) {
            (
                WizardStep::DefineRequirement {
                    requirements, directory, ..
                },
                PendingRequest::Suggestions,
                WizardReply::SuggestionsLoaded { suggestions, .. },
            ) => {
                self.step = WizardStep::ReviewAndSelect {
                    requirements: requirements.clone(),
                    directory: directory.clone(),
                    suggestions,
                    selected: BTreeSet::new(),
                    mode: ReviewMode::Viewing,
                };
            }
            (WizardStep::DefineRequirement { loading, .. }, PendingRequest::Suggestions, WizardReply::Failed { reason, .. }) => {
                *loading = false;
                warn!("Fetching suggestions failed: {}", reason);
                self.notice = Some(format!("Could not load suggestions: {}", reason));
            }
            (
                WizardStep::ReviewAndSelect {
                    requirements,
                    suggestions,
                    selected,
                    ..
                },
                PendingRequest::Regenerate {
                    requirements: new_requirements,
                },
                WizardReply::SuggestionsLoaded {
                    suggestions: replacement,
                    ..
                },
            ) => {
                *requirements = new_requirements;
                *suggestions = replacement;
                selected.clear();
            }
            (
                WizardStep::ReviewAndSelect { suggestions, .. },
                PendingRequest::MoreSuggestions,
                WizardReply::MoreSuggestionsLoaded { suggestions: more, .. },
            ) => {
                suggestions.extend(more);
            }
            (
                WizardStep::ReviewAndSelect { .. },
                PendingRequest::Regenerate { .. } | PendingRequest::MoreSuggestions,
                WizardReply::Failed { reason, .. },
            ) => {
                warn!("Refreshing suggestions failed: {}", reason);
                self.notice = Some(format!("Could not load suggestions: {}", reason));
            }
            (
                WizardStep::Complete { directory, phase, .. },
                PendingRequest::Materialize,
                WizardReply::Materialized { created, .. },
            ) => {
                *phase = CompletePhase::Done {
                    created,
                    directory: directory.clone(),
                };
            }
            (WizardStep::Complete { phase, .. }, PendingRequest::Materialize, WizardReply::Failed { reason, .. }) => {
                warn!("Generating test cases failed: {}", reason);
                *phase = CompletePhase::Failed { reason };
            }
            (_, request, reply) => {
                warn!(?request, ?reply, "Wizard reply does not fit the current step");
                return false;
            }
        }
        true
    }
}
