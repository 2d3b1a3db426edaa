use crate::model::{CollectionId, Filter, Snapshot, ViewStep};

/// Derive the checkable step list for one collection and filter: the steps of
/// `collection` matching `filter`, ordered by step number, all unchecked.
/// Pure in its inputs; an unknown or unset collection projects to nothing.
pub fn project(
    snapshot: &Snapshot,
    collection: Option<&CollectionId>,
    filter: Filter,
) -> Vec<ViewStep> {
    let Some(id) = collection else {
        return Vec::new();
    };
    let Some(collection) = snapshot.collection(id) else {
        return Vec::new();
    };

    let mut steps: Vec<ViewStep> = collection
        .steps
        .iter()
        .filter(|s| filter.matches(s))
        .map(|s| ViewStep {
            step: s.clone(),
            checked: false,
        })
        .collect();
    steps.sort_by_key(|v| v.step.step_number);
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Collection, Step, StepId};

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
            collections: vec![
                Collection {
                    id: CollectionId("c1".to_string()),
                    name: "butter chicken".to_string(),
                    steps: vec![step("2", 2, true), step("1", 1, false), step("3", 3, false)],
                },
                Collection {
                    id: CollectionId("c2".to_string()),
                    name: "dal".to_string(),
                    steps: vec![step("9", 1, false)],
                },
            ],
        }
    }

    #[test]
    fn projects_only_matching_steps_in_step_number_order() {
        let snap = snapshot();
        let id = CollectionId("c1".to_string());

        let open = project(&snap, Some(&id), Filter::Open);
        let ids: Vec<&str> = open.iter().map(|v| v.id().as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!(open.iter().all(|v| !v.checked));

        let completed = project(&snap, Some(&id), Filter::Completed);
        let ids: Vec<&str> = completed.iter().map(|v| v.id().as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn identical_inputs_project_identically() {
        let snap = snapshot();
        let id = CollectionId("c1".to_string());
        assert_eq!(
            project(&snap, Some(&id), Filter::Open),
            project(&snap, Some(&id), Filter::Open)
        );
    }

    #[test]
    fn open_and_completed_partition_the_collection() {
        let snap = snapshot();
        let id = CollectionId("c1".to_string());

        let open = project(&snap, Some(&id), Filter::Open);
        let completed = project(&snap, Some(&id), Filter::Completed);

        let mut union: Vec<StepId> = open
            .iter()
            .chain(completed.iter())
            .map(|v| v.id().clone())
            .collect();
        union.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        let mut all: Vec<StepId> = snap.collections[0]
            .steps
            .iter()
            .map(|s| s.id.clone())
            .collect();
        all.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        assert_eq!(union, all);
        assert!(open.iter().all(|o| completed.iter().all(|c| o.id() != c.id())));
    }

    #[test]
    fn unknown_or_unset_collection_projects_empty() {
        let snap = snapshot();
        assert!(project(&snap, None, Filter::Open).is_empty());
        let missing = CollectionId("nope".to_string());
        assert!(project(&snap, Some(&missing), Filter::Open).is_empty());
    }
}
