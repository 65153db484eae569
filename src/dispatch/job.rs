use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::foundation::core::Row;
use crate::foundation::error::{RenderError, RenderResult};
use crate::identity::fingerprint::{RowsFingerprint, RunId};
use crate::scene::keys::RowPartKey;

/// Compositor that renders audio and video of a row in one pass.
pub const COMBINED_COMPOSITOR: &str = "combined";

/// One row of one scene, as submitted to the job transport.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderJob {
    pub row_num: Row,
    pub run_id: RunId,
    pub rows_hash: RowsFingerprint,
    pub compositor: String,
    pub key: String,
    pub definition_key: String,
    /// Scene the row belongs to; not part of the wire payload.
    #[serde(skip)]
    pub scene_id: u32,
    /// Set when the definition has several scenes, so row-part keys name the scene.
    #[serde(skip)]
    pub scene_scoped: bool,
}

impl RenderJob {
    /// Key the row job writes its render to.
    pub fn row_part_key(&self) -> RenderResult<RowPartKey> {
        RowPartKey::new(
            &self.definition_key,
            self.scene_scoped.then_some(self.scene_id),
            &self.run_id,
            self.row_num,
            &self.rows_hash,
        )
    }

    /// Wire payload.
    pub fn to_payload(&self) -> RenderResult<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| RenderError::serde(format!("encode render job payload: {e}")))
    }
}

/// Acknowledgment handle for an accepted job.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ActivationId(pub String);

/// Asynchronous job transport.
///
/// `submit` returns as soon as the transport has accepted the job; it must not wait for the
/// job to run. A rejected job is reported as `Err`. Accepted jobs cannot be withdrawn.
/// Implementations are called concurrently from worker threads.
pub trait JobInvoker: Send + Sync {
    fn submit(&self, job: &RenderJob) -> RenderResult<ActivationId>;
}

/// Accepts every job and keeps it in memory.
#[derive(Debug, Default)]
pub struct RecordingInvoker {
    jobs: Mutex<Vec<RenderJob>>,
    next: AtomicU64,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs accepted so far, in acceptance order.
    pub fn jobs(&self) -> Vec<RenderJob> {
        match self.jobs.lock() {
            Ok(jobs) => jobs.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl JobInvoker for RecordingInvoker {
    fn submit(&self, job: &RenderJob) -> RenderResult<ActivationId> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        self.jobs
            .lock()
            .map_err(|_| RenderError::submission("recording invoker lock poisoned"))?
            .push(job.clone());
        Ok(ActivationId(format!("activation-{n}")))
    }
}

/// Writes each job payload as a JSON file into a spool directory for a worker to pick up.
///
/// The activation id is the spool file name.
#[derive(Clone, Debug)]
pub struct SpoolInvoker {
    dir: PathBuf,
}

impl SpoolInvoker {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(job: &RenderJob) -> String {
        format!(
            "{}-s{}-r{}@{}.json",
            job.run_id, job.scene_id, job.row_num, job.rows_hash
        )
    }
}

impl JobInvoker for SpoolInvoker {
    fn submit(&self, job: &RenderJob) -> RenderResult<ActivationId> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            RenderError::submission(format!("create spool dir '{}': {e}", self.dir.display()))
        })?;
        let name = Self::file_name(job);
        let path = self.dir.join(&name);
        let body = serde_json::to_vec_pretty(&job.to_payload()?)?;
        std::fs::write(&path, body)
            .map_err(|e| RenderError::submission(format!("spool '{}': {e}", path.display())))?;
        Ok(ActivationId(name))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/job.rs"]
mod tests;
