use crate::model::{StepId, ViewStep};

use super::SessionError;

/// Single-step text edit as an explicit state machine. Transitions are
/// guarded: an illegal call returns an error and changes nothing, so the UI
/// layer cannot half-enter an edit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EditSession {
    #[default]
    Idle,
    Editing {
        step: StepId,
        draft: String,
    },
    Committing {
        step: StepId,
        draft: String,
    },
}

impl EditSession {
    pub fn is_idle(&self) -> bool {
        matches!(self, EditSession::Idle)
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, EditSession::Editing { .. })
    }

    pub fn is_committing(&self) -> bool {
        matches!(self, EditSession::Committing { .. })
    }

    pub fn target(&self) -> Option<&StepId> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing { step, .. } | EditSession::Committing { step, .. } => Some(step),
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match self {
            EditSession::Idle => None,
            EditSession::Editing { draft, .. } | EditSession::Committing { draft, .. } => {
                Some(draft)
            }
        }
    }

    /// Enter `Editing` for the single checked step of the current projection,
    /// seeding the draft with its current description. Requires `Idle` and
    /// exactly one checked step.
    pub fn begin(&mut self, projected: &[ViewStep]) -> Result<(), SessionError> {
        if !self.is_idle() {
            return Err(SessionError::InvalidEditState("begin"));
        }
        let mut checked = projected.iter().filter(|v| v.checked);
        let (first, extra) = (checked.next(), checked.count());
        match first {
            Some(v) if extra == 0 => {
                *self = EditSession::Editing {
                    step: v.step.id.clone(),
                    draft: v.step.description.clone(),
                };
                Ok(())
            }
            Some(_) => Err(SessionError::EditSelection { checked: extra + 1 }),
            None => Err(SessionError::EditSelection { checked: 0 }),
        }
    }

    /// Replace the draft text. Content policy (empty drafts included) is the
    /// service's concern, not enforced here.
    pub fn update_draft(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        match self {
            EditSession::Editing { draft, .. } => {
                *draft = text.into();
                Ok(())
            }
            _ => Err(SessionError::InvalidEditState("update draft")),
        }
    }

    /// `Editing -> Committing`; yields the target and draft for the single
    /// update call.
    pub fn start_commit(&mut self) -> Result<(StepId, String), SessionError> {
        match self {
            EditSession::Editing { step, draft } => {
                let step = step.clone();
                let draft = draft.clone();
                *self = EditSession::Committing {
                    step: step.clone(),
                    draft: draft.clone(),
                };
                Ok((step, draft))
            }
            _ => Err(SessionError::InvalidEditState("commit")),
        }
    }

    /// `Committing -> Idle`, clearing the draft.
    pub fn commit_succeeded(&mut self) -> Result<StepId, SessionError> {
        match self {
            EditSession::Committing { step, .. } => {
                let step = step.clone();
                *self = EditSession::Idle;
                Ok(step)
            }
            _ => Err(SessionError::InvalidEditState("commit success")),
        }
    }

    /// `Committing -> Editing`, draft preserved for a retry.
    pub fn commit_failed(&mut self) -> Result<(), SessionError> {
        match self {
            EditSession::Committing { step, draft } => {
                *self = EditSession::Editing {
                    step: step.clone(),
                    draft: draft.clone(),
                };
                Ok(())
            }
            _ => Err(SessionError::InvalidEditState("commit failure")),
        }
    }
}
