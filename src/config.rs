use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::ConnectOptions;

/// File name of the per-user state file, under `$HOME`.
pub const CONFIG_FILE_NAME: &str = ".dbsnap.json";

/// Persisted command-line state: which head is current and how to reach
/// the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Head container selected by the last `init`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<String>,
    #[serde(default)]
    pub connection: ConnectOptions,
}

impl Config {
    /// `$HOME/.dbsnap.json`, or `None` when `HOME` is unset.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(CONFIG_FILE_NAME))
    }

    /// Read the config at `path`. A missing file yields the default config.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the config to `path` as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content + "\n").map_err(|e| Error::io(path, e))?;
        Ok(())
    }

    /// The current head, or [`Error::NotInitialized`] when none was chosen.
    pub fn require_head(&self) -> Result<&str> {
        self.head
            .as_deref()
            .ok_or_else(|| Error::not_initialized("no database selected, run `dbsnap init <db>` first"))
    }
}
