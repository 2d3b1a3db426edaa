//! The boundary with the remote collection service.
//!
//! All mutations are fire-and-refresh: correctness never depends on a
//! response payload beyond success/failure, so callers re-fetch the snapshot
//! after any mutation instead of merging responses into local state.

use anyhow::Result;

use crate::model::{Collection, CollectionId, Snapshot, Step, StepId};

#[allow(async_fn_in_trait)]
pub trait CollectionService {
    /// Full authoritative read of every collection and its steps. The sole
    /// source-of-truth refresh; callable repeatedly.
    async fn fetch_all(&self) -> Result<Snapshot>;

    async fn create_collection(&self, name: &str) -> Result<Collection>;

    /// Appends a step; the service assigns the step number.
    async fn create_step(&self, collection: &CollectionId, description: &str) -> Result<Step>;

    /// Returns a human-readable acknowledgement, not a structured object.
    async fn delete_step(&self, step: &StepId) -> Result<String>;

    /// Updates the description only; completion state is untouched.
    async fn update_step(&self, step: &StepId, description: &str) -> Result<Step>;

    async fn complete_step(&self, step: &StepId) -> Result<Step>;

    async fn revert_step(&self, step: &StepId) -> Result<Step>;
}
