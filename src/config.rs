use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::dispatch::dispatcher::DispatchOpts;
use crate::foundation::error::{RenderError, RenderResult};
use crate::layout::engine::LayoutOpts;

/// Explicit configuration passed to each component at construction.
///
/// Every field has a default, so a config file only needs the values it changes.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutOpts,
    pub dispatch: DispatchOpts,
    pub storage: StorageConfig,
}

/// Locations of the filesystem-backed collaborators used by the command-line tool.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding scene definitions, one file per key.
    pub definitions_dir: PathBuf,
    /// Directory row-job payloads are spooled into.
    pub spool_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            definitions_dir: PathBuf::from("definitions"),
            spool_dir: PathBuf::from("spool"),
        }
    }
}

impl Config {
    /// Parse and validate a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> RenderResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| RenderError::serde(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RenderError::validation(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> RenderResult<()> {
        self.layout.canvas()?;
        if self.dispatch.threads == Some(0) {
            return Err(RenderError::validation(
                "dispatch 'threads' must be >= 1 when set",
            ));
        }
        if self.layout.reverb_type.trim().is_empty() {
            return Err(RenderError::validation("layout 'reverb_type' must be set"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
