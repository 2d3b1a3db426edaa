use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::model::{RemoteConfig, WorkspaceConfig};

pub const STORE_DIR: &str = ".stepwise";

/// The client's app directory. The only durable client state is the remote
/// configuration; everything else (selection, filter, drafts) is ephemeral
/// by design.
#[derive(Clone, Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Resolve `$STEPWISE_HOME`, else `$HOME/.stepwise`, creating the
    /// directory and a default config on first use.
    pub fn open() -> Result<Self> {
        let root = match std::env::var_os("STEPWISE_HOME") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = std::env::var_os("HOME").ok_or_else(|| {
                    anyhow!("HOME is not set (set STEPWISE_HOME to choose a config directory)")
                })?;
                Path::new(&home).join(STORE_DIR)
            }
        };
        Self::open_at(&root)
    }

    pub fn open_at(root: &Path) -> Result<Self> {
        let ws = Self {
            root: root.to_path_buf(),
        };
        if !root.is_dir() {
            fs::create_dir_all(root)
                .with_context(|| format!("create app dir {}", root.display()))?;
            ws.write_config(&WorkspaceConfig::default())
                .context("write default config")?;
        }
        Ok(ws)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn read_config(&self) -> Result<WorkspaceConfig> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(WorkspaceConfig::default());
        }
        let bytes = fs::read(&path).context("read config.json")?;
        serde_json::from_slice(&bytes).context("parse config.json")
    }

    pub fn write_config(&self, cfg: &WorkspaceConfig) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(cfg).context("serialize config")?;
        write_atomic(&self.config_path(), &bytes).context("write config.json")
    }

    pub fn set_remote(&self, remote: RemoteConfig) -> Result<()> {
        let mut cfg = self.read_config()?;
        cfg.remote = Some(remote);
        self.write_config(&cfg)
    }

    pub fn require_remote(&self) -> Result<RemoteConfig> {
        self.read_config()?
            .remote
            .context("no remote configured (run `stepwise login --url ...`)")
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create parent directories")?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes).with_context(|| format!("write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
