use anyhow::Result;
use futures::StreamExt;
use futures::stream::FuturesUnordered;

use crate::model::StepId;
use crate::service::CollectionService;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchOp {
    Delete,
    Complete,
    Revert,
}

impl BatchOp {
    pub fn label(self) -> &'static str {
        match self {
            BatchOp::Delete => "delete",
            BatchOp::Complete => "complete",
            BatchOp::Revert => "revert",
        }
    }
}

#[derive(Debug)]
pub struct StepOutcome {
    pub step_id: StepId,
    pub op: BatchOp,
    pub result: Result<()>,
    /// Service acknowledgement text, when the operation returns one.
    pub detail: Option<String>,
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Issue one mutation per target step, all in flight at once, and report one
/// outcome per target in input order. There is no transaction across steps:
/// each call succeeds or fails on its own, and a failure leaves the other
/// calls untouched. An empty target set issues no calls at all.
///
/// The scatter is joined only to collect outcomes; completions are folded in
/// whatever order they arrive.
pub async fn execute<S: CollectionService>(
    service: &S,
    op: BatchOp,
    targets: &[StepId],
) -> Vec<StepOutcome> {
    if targets.is_empty() {
        return Vec::new();
    }

    let mut calls = FuturesUnordered::new();
    for (slot, id) in targets.iter().enumerate() {
        calls.push(async move {
            let outcome = match op {
                BatchOp::Delete => service.delete_step(id).await.map(Some),
                BatchOp::Complete => service.complete_step(id).await.map(|_| None),
                BatchOp::Revert => service.revert_step(id).await.map(|_| None),
            };
            (slot, outcome)
        });
    }

    let mut completed: Vec<(usize, Result<Option<String>>)> = Vec::with_capacity(targets.len());
    while let Some(done) = calls.next().await {
        completed.push(done);
    }

    completed.sort_by_key(|(slot, _)| *slot);
    completed
        .into_iter()
        .map(|(slot, outcome)| match outcome {
            Ok(detail) => StepOutcome {
                step_id: targets[slot].clone(),
                op,
                result: Ok(()),
                detail,
            },
            Err(err) => StepOutcome {
                step_id: targets[slot].clone(),
                op,
                result: Err(err),
                detail: None,
            },
        })
        .collect()
}
