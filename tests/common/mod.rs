use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{Result, anyhow};

use stepwise::model::{Collection, CollectionId, Snapshot, Step, StepId};
use stepwise::service::CollectionService;

/// In-memory stand-in for the remote collection service. Mutations mirror
/// the real service's behavior: step numbers are assigned on append and
/// renumbered on delete, completion flips a flag, and the read model is only
/// observable through `fetch_all`.
#[derive(Default)]
pub struct FakeService {
    state: Mutex<Snapshot>,
    next_id: Mutex<u32>,
    /// Step ids whose mutations fail with an injected error.
    pub fail: Mutex<HashSet<String>>,
    /// Completion-order log of finished mutation calls, e.g. `"complete 2"`.
    pub calls: Mutex<Vec<String>>,
    /// When set to `(held, releaser)`, the mutation for step `held` does not
    /// finish until the mutation for step `releaser` has completed. Makes
    /// out-of-order completion deterministic without sleeping.
    pub hold: Option<(String, String)>,
    gate: tokio::sync::Notify,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, id: &str) {
        self.fail.lock().unwrap().insert(id.to_string());
    }

    pub fn seed_collection(&self, name: &str) -> CollectionId {
        let id = self.mint();
        let collection = Collection {
            id: CollectionId(id.clone()),
            name: name.to_string(),
            steps: Vec::new(),
        };
        self.state.lock().unwrap().collections.push(collection);
        CollectionId(id)
    }

    pub fn seed_step(&self, collection: &CollectionId, description: &str, completed: bool) -> StepId {
        let id = self.mint();
        let mut state = self.state.lock().unwrap();
        let c = state
            .collections
            .iter_mut()
            .find(|c| &c.id == collection)
            .expect("seed into known collection");
        let step_number = c.steps.iter().map(|s| s.step_number).max().unwrap_or(0) + 1;
        c.steps.push(Step {
            id: StepId(id.clone()),
            description: description.to_string(),
            step_number,
            is_completed: completed,
        });
        StepId(id)
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn mint(&self) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        next.to_string()
    }

    async fn gated(&self, id: &StepId) {
        if let Some((held, _)) = &self.hold
            && held == id.as_str()
        {
            self.gate.notified().await;
        }
    }

    fn release(&self, id: &StepId) {
        if let Some((_, releaser)) = &self.hold
            && releaser == id.as_str()
        {
            self.gate.notify_one();
        }
    }

    fn check_fail(&self, op: &str, id: &StepId) -> Result<()> {
        if self.fail.lock().unwrap().contains(id.as_str()) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{} {} failed", op, id.as_str()));
            return Err(anyhow!("injected {} failure for step {}", op, id.as_str()));
        }
        Ok(())
    }

    fn record(&self, op: &str, id: &StepId) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", op, id.as_str()));
    }

    fn with_step<T>(
        &self,
        id: &StepId,
        f: impl FnOnce(&mut Step) -> T,
    ) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        for c in &mut state.collections {
            if let Some(step) = c.steps.iter_mut().find(|s| &s.id == id) {
                return Ok(f(step));
            }
        }
        Err(anyhow!("step not found: {}", id.as_str()))
    }
}

impl CollectionService for FakeService {
    async fn fetch_all(&self) -> Result<Snapshot> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn create_collection(&self, name: &str) -> Result<Collection> {
        let id = self.seed_collection(name);
        let state = self.state.lock().unwrap();
        Ok(state
            .collection(&id)
            .cloned()
            .unwrap_or_else(|| Collection {
                id,
                name: name.to_string(),
                steps: Vec::new(),
            }))
    }

    async fn create_step(&self, collection: &CollectionId, description: &str) -> Result<Step> {
        {
            let state = self.state.lock().unwrap();
            if state.collection(collection).is_none() {
                return Err(anyhow!("collection not found: {}", collection.as_str()));
            }
        }
        let id = self.seed_step(collection, description, false);
        self.with_step(&id, |s| s.clone())
    }

    async fn delete_step(&self, step: &StepId) -> Result<String> {
        self.gated(step).await;
        self.check_fail("delete", step)?;

        let found = {
            let mut state = self.state.lock().unwrap();
            let mut found = false;
            for c in &mut state.collections {
                if let Some(pos) = c.steps.iter().position(|s| &s.id == step) {
                    let removed = c.steps.remove(pos);
                    for s in &mut c.steps {
                        if s.step_number > removed.step_number {
                            s.step_number -= 1;
                        }
                    }
                    found = true;
                    break;
                }
            }
            found
        };

        self.record("delete", step);
        self.release(step);
        if found {
            Ok("step deleted".to_string())
        } else {
            Err(anyhow!("step not found: {}", step.as_str()))
        }
    }

    async fn update_step(&self, step: &StepId, description: &str) -> Result<Step> {
        self.check_fail("update", step)?;
        let updated = self.with_step(step, |s| {
            s.description = description.to_string();
            s.clone()
        })?;
        self.record("update", step);
        Ok(updated)
    }

    async fn complete_step(&self, step: &StepId) -> Result<Step> {
        self.gated(step).await;
        self.check_fail("complete", step)?;
        let updated = self.with_step(step, |s| {
            s.is_completed = true;
            s.clone()
        })?;
        self.record("complete", step);
        self.release(step);
        Ok(updated)
    }

    async fn revert_step(&self, step: &StepId) -> Result<Step> {
        self.gated(step).await;
        self.check_fail("revert", step)?;
        let updated = self.with_step(step, |s| {
            s.is_completed = false;
            s.clone()
        })?;
        self.record("revert", step);
        self.release(step);
        Ok(updated)
    }
}
