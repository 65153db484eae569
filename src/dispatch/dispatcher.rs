use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;

use crate::dispatch::job::{ActivationId, COMBINED_COMPOSITOR, JobInvoker, RenderJob};
use crate::foundation::error::{RenderError, RenderResult};
use crate::identity::fingerprint::{RunId, fingerprint_rows};
use crate::io::store::ObjectStore;
use crate::scene::model::SceneDefinition;

/// Dispatcher settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DispatchOpts {
    /// Submission worker threads. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

/// Acknowledged dispatch: every row job was accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct DispatchReceipt {
    pub run_id: RunId,
    pub definition_key: String,
    /// One per job, in [`plan_jobs`] order.
    pub activation_ids: Vec<ActivationId>,
    #[serde(skip)]
    pub jobs: Vec<RenderJob>,
}

/// Partition a definition into row jobs.
///
/// Scenes are taken in order; within a scene, one job per distinct row in ascending row
/// order, tagged with that scene's rows fingerprint. Every job shares `run_id`.
pub fn plan_jobs(
    definition_key: &str,
    definition: &SceneDefinition,
    run_id: &RunId,
) -> Vec<RenderJob> {
    let scenes = definition.scenes();
    let scene_scoped = scenes.len() > 1;
    let mut jobs = Vec::new();
    for scene in scenes.iter() {
        let rows = scene.rows();
        let rows_hash = fingerprint_rows(rows.iter().copied());
        for row in rows {
            jobs.push(RenderJob {
                row_num: row,
                run_id: run_id.clone(),
                rows_hash: rows_hash.clone(),
                compositor: COMBINED_COMPOSITOR.to_string(),
                key: definition_key.to_string(),
                definition_key: definition_key.to_string(),
                scene_id: scene.scene_id,
                scene_scoped,
            });
        }
    }
    jobs
}

/// Reads a definition back and fans its row jobs out to a [`JobInvoker`].
///
/// Holds no per-dispatch state; concurrent dispatches share only the collaborators.
pub struct Dispatcher {
    store: Arc<dyn ObjectStore>,
    invoker: Arc<dyn JobInvoker>,
    pool: rayon::ThreadPool,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        invoker: Arc<dyn JobInvoker>,
        opts: &DispatchOpts,
    ) -> RenderResult<Self> {
        Ok(Self {
            store,
            invoker,
            pool: build_thread_pool(opts.threads)?,
        })
    }

    /// Fetch the definition stored under `definition_key` and dispatch it.
    #[tracing::instrument(skip(self))]
    pub fn dispatch_key(&self, definition_key: &str) -> RenderResult<DispatchReceipt> {
        if definition_key.trim().is_empty() {
            return Err(RenderError::MissingParameter("definition_key"));
        }
        let body = self.store.get(definition_key)?;
        let definition = SceneDefinition::from_slice(&body)?;
        self.dispatch(definition_key, &definition)
    }

    /// Submit one job per distinct row per scene, all concurrently, under a fresh run id.
    ///
    /// Succeeds only if every submission is acknowledged. On any rejection the whole call
    /// fails; jobs that were already accepted stay accepted.
    #[tracing::instrument(skip(self, definition), fields(run_id = tracing::field::Empty))]
    pub fn dispatch(
        &self,
        definition_key: &str,
        definition: &SceneDefinition,
    ) -> RenderResult<DispatchReceipt> {
        if definition_key.trim().is_empty() {
            return Err(RenderError::MissingParameter("definition_key"));
        }
        check_scene_ids(definition)?;
        let run_id = RunId::new();
        tracing::Span::current().record("run_id", tracing::field::display(&run_id));

        let jobs = plan_jobs(definition_key, definition, &run_id);
        if jobs.is_empty() {
            tracing::warn!(definition_key, "definition has no inputs; nothing submitted");
        }

        let invoker = self.invoker.as_ref();
        let acks = self.pool.install(|| {
            jobs.par_iter()
                .map(|job| submit_one(invoker, job))
                .collect::<Vec<_>>()
        });

        let mut activation_ids = Vec::with_capacity(acks.len());
        let mut rejected = Vec::new();
        for ack in acks {
            match ack {
                Ok(id) => activation_ids.push(id),
                Err(e) => rejected.push(e),
            }
        }
        if let Some(first) = rejected.first() {
            return Err(RenderError::submission(format!(
                "{} of {} row jobs rejected for run {run_id}: {first}",
                rejected.len(),
                jobs.len()
            )));
        }

        tracing::info!(jobs = jobs.len(), "spawned row jobs");
        Ok(DispatchReceipt {
            run_id,
            definition_key: definition_key.to_string(),
            activation_ids,
            jobs,
        })
    }
}

fn submit_one(invoker: &dyn JobInvoker, job: &RenderJob) -> RenderResult<ActivationId> {
    match invoker.submit(job) {
        Ok(id) => {
            tracing::debug!(
                scene = job.scene_id,
                row = %job.row_num,
                activation = %id.0,
                "row job accepted"
            );
            Ok(id)
        }
        Err(e) => {
            tracing::warn!(scene = job.scene_id, row = %job.row_num, error = %e, "row job rejected");
            Err(e)
        }
    }
}

/// Scene ids name row-part keys, so they must not repeat within a definition.
fn check_scene_ids(definition: &SceneDefinition) -> RenderResult<()> {
    let mut seen = HashSet::new();
    for scene in definition.scenes().iter() {
        if !seen.insert(scene.scene_id) {
            return Err(RenderError::validation(format!(
                "duplicate scene id {}",
                scene.scene_id
            )));
        }
    }
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> RenderResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(RenderError::validation(
            "dispatch 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| RenderError::validation(format!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/dispatcher.rs"]
mod tests;
