//! Scene layout and row-parallel compositor dispatch for multi-participant performance videos.
//!
//! Each participant records a part on their own. This crate turns the list of parts into a
//! persisted scene definition and then fans the rendering of that definition out as
//! independent per-row jobs.
//!
//! # Pipeline overview
//!
//! 1. **Layout**: `SongPart`s + canvas settings + a [`Packer`] -> [`SceneDefinition`]
//!    (positions, sizes, stereo pan), persisted as `{choir}+{song}+auto.json`.
//! 2. **Partition**: the definition's scenes are split into rows; each scene's row set is
//!    fingerprinted ([`fingerprint_rows`]).
//! 3. **Dispatch**: one [`RenderJob`] per distinct row per scene is submitted concurrently to a
//!    [`JobInvoker`] under a single [`RunId`]; the call succeeds only if every job is accepted.
//!
//! Media decoding, compositing, storage and job transport are external: the crate reaches them
//! only through the [`Packer`], [`ObjectStore`], [`PartsSource`] and [`JobInvoker`] traits.
#![forbid(unsafe_code)]

mod config;
mod dispatch;
mod foundation;
mod identity;
mod io;
mod layout;
mod response;
mod scene;

pub use config::{Config, StorageConfig};
pub use dispatch::dispatcher::{DispatchOpts, DispatchReceipt, Dispatcher, plan_jobs};
pub use dispatch::job::{
    ActivationId, COMBINED_COMPOSITOR, JobInvoker, RecordingInvoker, RenderJob, SpoolInvoker,
};
pub use dispatch::rows::{
    RowBand, complete_run_rows, inputs_for_row, max_row_len, row_band, row_volume,
    rows_complete,
};
pub use foundation::core::{Canvas, Row, UNPOSITIONED_ROW};
pub use foundation::error::{RenderError, RenderResult};
pub use identity::fingerprint::{
    FINGERPRINT_LEN, RUN_ID_LEN, RowsFingerprint, RunId, fingerprint_rows,
};
pub use io::parts::{PartsResponse, PartsSource, StaticParts};
pub use io::store::{DirStore, MemoryStore, ObjectStore};
pub use layout::engine::{
    LayoutEngine, LayoutOpts, LayoutOutcome, LayoutRequest, StoredLayout, compute_layout,
    shuffle_rectangles, stereo_pan,
};
pub use layout::packer::{Packer, ShelfPacker};
pub use response::ActionResponse;
pub use scene::keys::{
    AUTO_SUFFIX, FINAL_SUFFIX, ObjectKey, ROW_PART_EXT, RowPartKey, SCENE_TAG, auto_definition_key,
    final_render_key,
};
pub use scene::model::{
    DEFAULT_ASPECT_RATIO, IMPLICIT_SCENE_ID, InputSpec, OutputSpec, Rectangle, Scene,
    SceneDefinition, SongPart,
};
