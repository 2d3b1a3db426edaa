//! The seven protocol operations, mapped onto the service's JSON routes.

use anyhow::{Context, Result};
use serde_json::json;

use crate::model::{Collection, CollectionId, Snapshot, Step, StepId};
use crate::service::CollectionService;

use super::{RemoteClient, with_retries};

impl CollectionService for RemoteClient {
    async fn fetch_all(&self) -> Result<Snapshot> {
        with_retries("fetch collections", || async {
            let resp = self
                .client
                .get(self.url("/collections"))
                .send()
                .await
                .context("send")?;

            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                anyhow::bail!(
                    "remote endpoint not found (is the tracker service running at {}?)",
                    self.remote.base_url
                );
            }

            let collections: Vec<Collection> = self
                .ensure_ok(resp, "fetch collections")?
                .json()
                .await
                .context("parse collections")?;
            Ok(Snapshot { collections })
        })
        .await
    }

    async fn create_collection(&self, name: &str) -> Result<Collection> {
        let resp = self
            .client
            .post(self.url("/collections"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .context("create collection request")?;

        let collection: Collection = self
            .ensure_ok(resp, "create collection")?
            .json()
            .await
            .context("parse created collection")?;
        Ok(collection)
    }

    async fn create_step(&self, collection: &CollectionId, description: &str) -> Result<Step> {
        let resp = self
            .client
            .post(self.url(&format!("/collections/{}/steps", collection.as_str())))
            .json(&json!({ "description": description }))
            .send()
            .await
            .context("create step request")?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("collection not found: {}", collection.as_str());
        }

        let step: Step = self
            .ensure_ok(resp, "create step")?
            .json()
            .await
            .context("parse created step")?;
        Ok(step)
    }

    async fn delete_step(&self, step: &StepId) -> Result<String> {
        let resp = self
            .client
            .delete(self.url(&format!("/steps/{}", step.as_str())))
            .send()
            .await
            .context("delete step request")?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("step not found: {}", step.as_str());
        }

        // The service answers with a human-readable acknowledgement, not a
        // structured object.
        let ack: String = self
            .ensure_ok(resp, "delete step")?
            .json()
            .await
            .context("parse delete acknowledgement")?;
        Ok(ack)
    }

    async fn update_step(&self, step: &StepId, description: &str) -> Result<Step> {
        let resp = self
            .client
            .patch(self.url(&format!("/steps/{}", step.as_str())))
            .json(&json!({ "description": description }))
            .send()
            .await
            .context("update step request")?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("step not found: {}", step.as_str());
        }

        let step: Step = self
            .ensure_ok(resp, "update step")?
            .json()
            .await
            .context("parse updated step")?;
        Ok(step)
    }

    async fn complete_step(&self, step: &StepId) -> Result<Step> {
        self.completion(step, "complete").await
    }

    async fn revert_step(&self, step: &StepId) -> Result<Step> {
        self.completion(step, "revert").await
    }
}

impl RemoteClient {
    async fn completion(&self, step: &StepId, action: &str) -> Result<Step> {
        let resp = self
            .client
            .post(self.url(&format!("/steps/{}/{}", step.as_str(), action)))
            .send()
            .await
            .with_context(|| format!("{} step request", action))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            anyhow::bail!("step not found: {}", step.as_str());
        }

        let step: Step = self
            .ensure_ok(resp, action)?
            .json()
            .await
            .with_context(|| format!("parse {} response", action))?;
        Ok(step)
    }
}
