use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionId(pub String);

impl CollectionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub String);

impl StepId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A named group of steps, as returned by the remote read-all query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub id: CollectionId,
    pub name: String,

    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: StepId,
    pub description: String,
    pub step_number: u32,
    pub is_completed: bool,
}

/// The full authoritative read of all collections and their steps at one
/// point in time. Replaced wholesale on every successful fetch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub collections: Vec<Collection>,
}

impl Snapshot {
    pub fn collection(&self, id: &CollectionId) -> Option<&Collection> {
        self.collections.iter().find(|c| &c.id == id)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    Open,
    Completed,
}

impl Filter {
    pub fn matches(self, step: &Step) -> bool {
        match self {
            Filter::Open => !step.is_completed,
            Filter::Completed => step.is_completed,
        }
    }

    pub fn flipped(self) -> Filter {
        match self {
            Filter::Open => Filter::Completed,
            Filter::Completed => Filter::Open,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::Open => "open",
            Filter::Completed => "completed",
        }
    }
}

/// A step decorated with the ephemeral checked flag. Rebuilt from scratch on
/// every projection recompute; holds no identity across a refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewStep {
    pub step: Step,
    pub checked: bool,
}

impl ViewStep {
    pub fn id(&self) -> &StepId {
        &self.step.id
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    pub version: u32,

    #[serde(default)]
    pub remote: Option<RemoteConfig>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            version: 1,
            remote: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: String,
}
