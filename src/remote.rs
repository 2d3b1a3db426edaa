use anyhow::{Context, Result};

use crate::model::RemoteConfig;

mod http_client;
use self::http_client::with_retries;

mod operations;

/// HTTP client for the remote collection service. One instance per
/// configured remote; cheap to clone through the underlying pool.
pub struct RemoteClient {
    remote: RemoteConfig,
    client: reqwest::Client,
}

impl RemoteClient {
    pub fn new(remote: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("stepwise")
            .build()
            .context("build reqwest client")?;
        Ok(Self { remote, client })
    }

    pub fn remote(&self) -> &RemoteConfig {
        &self.remote
    }
}
