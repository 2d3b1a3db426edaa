//! Client-side state reconciliation over the remote snapshot.
//!
//! The session owns the last authoritative snapshot, the selected collection,
//! the filter, and the projected step list with its checked overlay. Durable
//! state never lives here: every mutation goes to the service and is followed
//! by a refresh, and the projection is rebuilt wholesale from the snapshot.

use anyhow::Result;

use crate::model::{CollectionId, Filter, Snapshot, Step, StepId, ViewStep};
use crate::service::CollectionService;

mod batch;
mod edit;
mod error;
mod projection;

pub use batch::{BatchOp, StepOutcome, execute};
pub use edit::EditSession;
pub use error::SessionError;
pub use projection::project;

/// Captures the session epoch at the moment a fetch is issued. A response is
/// applied only if the epoch is still current when it lands.
#[derive(Clone, Copy, Debug)]
pub struct FetchToken(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// The selection or filter changed while the fetch was in flight; the
    /// response was discarded.
    Stale,
}

#[derive(Debug, Default)]
pub struct Session {
    snapshot: Option<Snapshot>,
    epoch: u64,
    selected: Option<CollectionId>,
    filter: Filter,
    steps: Vec<ViewStep>,
    recently_completed: Vec<Step>,
    edit: EditSession,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn selected(&self) -> Option<&CollectionId> {
        self.selected.as_ref()
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    /// The current projection with its checked overlay.
    pub fn steps(&self) -> &[ViewStep] {
        &self.steps
    }

    /// Completions observed since the last applied snapshot. Advisory only:
    /// nothing derives correctness from this list.
    pub fn recently_completed(&self) -> &[Step] {
        &self.recently_completed
    }

    pub fn select_collection(&mut self, id: Option<CollectionId>) {
        self.selected = id;
        self.epoch += 1;
        self.reproject();
    }

    pub fn set_filter(&mut self, filter: Filter) {
        if self.filter == filter {
            return;
        }
        self.filter = filter;
        self.epoch += 1;
        self.reproject();
    }

    pub fn flip_filter(&mut self) {
        self.set_filter(self.filter.flipped());
    }

    /// Capture the epoch before issuing a fetch.
    pub fn fetch_token(&self) -> FetchToken {
        FetchToken(self.epoch)
    }

    /// Replace the snapshot wholesale and rebuild the projection. A response
    /// whose token predates the latest selection/filter change is discarded
    /// rather than rendered under the wrong view.
    pub fn apply_snapshot(&mut self, token: FetchToken, snapshot: Snapshot) -> ApplyOutcome {
        if token.0 != self.epoch {
            return ApplyOutcome::Stale;
        }
        self.snapshot = Some(snapshot);
        self.recently_completed.clear();
        self.reproject();
        ApplyOutcome::Applied
    }

    /// Fetch and apply in one suspension. Mutating callers use this after a
    /// batch or commit; racing callers use `fetch_token`/`apply_snapshot`.
    pub async fn refresh<S: CollectionService>(&mut self, service: &S) -> Result<ApplyOutcome> {
        let token = self.fetch_token();
        let snapshot = service.fetch_all().await?;
        Ok(self.apply_snapshot(token, snapshot))
    }

    /// Flip the checked flag for a projected step; ids outside the current
    /// projection are ignored.
    pub fn toggle(&mut self, id: &StepId) {
        if let Some(v) = self.steps.iter_mut().find(|v| v.id() == id) {
            v.checked = !v.checked;
        }
    }

    pub fn checked_ids(&self) -> Vec<StepId> {
        self.steps
            .iter()
            .filter(|v| v.checked)
            .map(|v| v.step.id.clone())
            .collect()
    }

    pub fn checked_count(&self) -> usize {
        self.steps.iter().filter(|v| v.checked).count()
    }

    pub fn clear_selection(&mut self) {
        for v in &mut self.steps {
            v.checked = false;
        }
    }

    /// Fold batch outcomes into the local view. Successful deletes leave the
    /// projection and the selection immediately; successful completes and
    /// reverts only uncheck (the step leaves the filtered view on the next
    /// refresh, not before). Failed steps are left exactly as they were.
    pub fn absorb_outcomes(&mut self, outcomes: &[StepOutcome]) {
        for outcome in outcomes {
            if outcome.result.is_err() {
                continue;
            }
            match outcome.op {
                BatchOp::Delete => {
                    self.steps.retain(|v| v.id() != &outcome.step_id);
                }
                BatchOp::Complete => {
                    if let Some(v) = self.steps.iter_mut().find(|v| v.id() == &outcome.step_id) {
                        v.checked = false;
                        let step = v.step.clone();
                        self.recently_completed.push(step);
                    }
                }
                BatchOp::Revert => {
                    if let Some(v) = self.steps.iter_mut().find(|v| v.id() == &outcome.step_id) {
                        v.checked = false;
                    }
                }
            }
        }
    }

    pub fn edit(&self) -> &EditSession {
        &self.edit
    }

    /// Start editing the single checked step.
    pub fn edit_begin(&mut self) -> Result<(), SessionError> {
        self.edit.begin(&self.steps)
    }

    pub fn edit_update_draft(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        self.edit.update_draft(text)
    }

    pub fn edit_start_commit(&mut self) -> Result<(StepId, String), SessionError> {
        self.edit.start_commit()
    }

    /// The committed step also leaves the selection, matching the invariant
    /// that editing always starts from exactly one checked step.
    pub fn edit_commit_succeeded(&mut self) -> Result<StepId, SessionError> {
        let id = self.edit.commit_succeeded()?;
        if let Some(v) = self.steps.iter_mut().find(|v| v.id() == &id) {
            v.checked = false;
        }
        Ok(id)
    }

    pub fn edit_commit_failed(&mut self) -> Result<(), SessionError> {
        self.edit.commit_failed()
    }

    pub fn edit_cancel(&mut self) {
        self.edit = EditSession::Idle;
    }

    /// Rebuild the projection from the current snapshot. Every checked flag
    /// resets, which is what keeps the selection a subset of the visible
    /// steps without diffing old against new. An edit session survives only
    /// if its target is still projected.
    fn reproject(&mut self) {
        self.steps = match &self.snapshot {
            Some(snapshot) => project(snapshot, self.selected.as_ref(), self.filter),
            None => Vec::new(),
        };
        let abandoned = match self.edit.target() {
            Some(target) => !self.steps.iter().any(|v| v.id() == target),
            None => false,
        };
        if abandoned {
            self.edit = EditSession::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Collection;

    fn step(id: &str, n: u32, done: bool) -> Step {
        Step {
            id: StepId(id.to_string()),
            description: format!("step {id}"),
            step_number: n,
            is_completed: done,
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            collections: vec![Collection {
                id: CollectionId("c1".to_string()),
                name: "butter chicken".to_string(),
                steps: vec![step("1", 1, false), step("2", 2, true), step("3", 3, false)],
            }],
        }
    }

    fn session_with_snapshot() -> Session {
        let mut session = Session::new();
        session.select_collection(Some(CollectionId("c1".to_string())));
        let token = session.fetch_token();
        assert_eq!(
            session.apply_snapshot(token, snapshot()),
            ApplyOutcome::Applied
        );
        session
    }

    #[test]
    fn selection_resets_on_filter_change() {
        let mut session = session_with_snapshot();
        session.toggle(&StepId("1".to_string()));
        assert_eq!(session.checked_ids(), vec![StepId("1".to_string())]);

        session.flip_filter();
        assert!(session.checked_ids().is_empty());

        // Flipping back does not resurrect the old selection either.
        session.flip_filter();
        assert!(session.checked_ids().is_empty());
    }

    #[test]
    fn toggle_ignores_ids_outside_projection() {
        let mut session = session_with_snapshot();
        // Step 2 is completed and not part of the open view.
        session.toggle(&StepId("2".to_string()));
        session.toggle(&StepId("missing".to_string()));
        assert!(session.checked_ids().is_empty());
    }

    #[test]
    fn checked_ids_stay_subset_of_projection() {
        let mut session = session_with_snapshot();
        session.toggle(&StepId("1".to_string()));
        session.toggle(&StepId("3".to_string()));

        // A refresh where step 1 became completed drops it from the open view
        // and therefore from the selection.
        let token = session.fetch_token();
        let mut next = snapshot();
        next.collections[0].steps[0].is_completed = true;
        assert_eq!(session.apply_snapshot(token, next), ApplyOutcome::Applied);

        let visible: Vec<StepId> = session.steps().iter().map(|v| v.id().clone()).collect();
        for id in session.checked_ids() {
            assert!(visible.contains(&id));
        }
        assert!(session.checked_ids().is_empty());
    }

    #[test]
    fn stale_fetch_is_discarded() {
        let mut session = session_with_snapshot();
        let token = session.fetch_token();

        // The user switches collections while the fetch is in flight.
        session.select_collection(Some(CollectionId("c2".to_string())));
        assert_eq!(session.apply_snapshot(token, snapshot()), ApplyOutcome::Stale);
        assert!(session.steps().is_empty());

        // A fetch started after the switch applies normally.
        let token = session.fetch_token();
        assert_eq!(session.apply_snapshot(token, snapshot()), ApplyOutcome::Applied);
    }

    #[test]
    fn last_completed_fetch_wins() {
        let mut session = session_with_snapshot();
        let first = session.fetch_token();
        let second = session.fetch_token();

        let mut newer = snapshot();
        newer.collections[0].steps.push(step("4", 4, false));

        assert_eq!(session.apply_snapshot(second, newer), ApplyOutcome::Applied);
        // The older response still carries a current epoch (no selection
        // change happened), so it replaces the newer one wholesale: last
        // applied wins, there is no merge.
        assert_eq!(session.apply_snapshot(first, snapshot()), ApplyOutcome::Applied);
        assert_eq!(session.steps().len(), 2);
    }

    #[test]
    fn absorb_delete_removes_from_view_and_selection() {
        let mut session = session_with_snapshot();
        session.toggle(&StepId("1".to_string()));
        session.toggle(&StepId("3".to_string()));

        let outcomes = vec![
            StepOutcome {
                step_id: StepId("1".to_string()),
                op: BatchOp::Delete,
                result: Ok(()),
                detail: None,
            },
            StepOutcome {
                step_id: StepId("3".to_string()),
                op: BatchOp::Delete,
                result: Err(anyhow::anyhow!("boom")),
                detail: None,
            },
        ];
        session.absorb_outcomes(&outcomes);

        let visible: Vec<&str> = session.steps().iter().map(|v| v.id().as_str()).collect();
        assert_eq!(visible, vec!["3"]);
        assert_eq!(session.checked_ids(), vec![StepId("3".to_string())]);
    }

    #[test]
    fn absorb_complete_unchecks_but_keeps_step_until_refresh() {
        let mut session = session_with_snapshot();
        session.toggle(&StepId("1".to_string()));

        session.absorb_outcomes(&[StepOutcome {
            step_id: StepId("1".to_string()),
            op: BatchOp::Complete,
            result: Ok(()),
            detail: None,
        }]);

        // Still visible (server truth arrives with the next refresh), no
        // longer checked, and recorded in the advisory completion log.
        assert!(session.steps().iter().any(|v| v.id().as_str() == "1"));
        assert!(session.checked_ids().is_empty());
        assert_eq!(session.recently_completed().len(), 1);

        let token = session.fetch_token();
        let mut next = snapshot();
        next.collections[0].steps[0].is_completed = true;
        session.apply_snapshot(token, next);
        assert!(!session.steps().iter().any(|v| v.id().as_str() == "1"));
        assert!(session.recently_completed().is_empty());
    }

    #[test]
    fn edit_session_abandoned_when_target_leaves_projection() {
        let mut session = session_with_snapshot();
        session.toggle(&StepId("1".to_string()));
        session.edit_begin().unwrap();
        assert!(session.edit().is_editing());

        let token = session.fetch_token();
        let mut next = snapshot();
        next.collections[0].steps.remove(0);
        session.apply_snapshot(token, next);
        assert!(session.edit().is_idle());
    }

    #[test]
    fn edit_survives_refresh_while_target_projected() {
        let mut session = session_with_snapshot();
        session.toggle(&StepId("1".to_string()));
        session.edit_begin().unwrap();
        session.edit_update_draft("chop finely").unwrap();

        let token = session.fetch_token();
        session.apply_snapshot(token, snapshot());
        assert_eq!(session.edit().draft(), Some("chop finely"));
    }
}
