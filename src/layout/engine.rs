use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::foundation::core::Canvas;
use crate::foundation::error::{RenderError, RenderResult};
use crate::io::parts::{PartsResponse, PartsSource};
use crate::io::store::ObjectStore;
use crate::layout::packer::Packer;
use crate::scene::keys::auto_definition_key;
use crate::scene::model::{InputSpec, OutputSpec, Rectangle, SceneDefinition};

/// Canvas and output settings for one layout.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutOpts {
    pub width: u32,
    pub height: u32,
    /// Gap between packed boxes, in pixels.
    pub margin: u32,
    /// Center the packed group on the canvas.
    pub center: bool,
    /// Derive a stereo pan for each placed part from its horizontal position.
    pub panning: bool,
    pub reverb: f64,
    pub reverb_type: String,
    pub watermark: Option<String>,
}

impl Default for LayoutOpts {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            margin: 10,
            center: true,
            panning: true,
            reverb: 0.1,
            reverb_type: "hall".to_string(),
            watermark: Some("choirless_watermark.png".to_string()),
        }
    }
}

impl LayoutOpts {
    pub fn canvas(&self) -> RenderResult<Canvas> {
        Canvas::new(self.width, self.height)
    }
}

/// Which song to lay out.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayoutRequest {
    pub choir_id: Option<String>,
    pub song_id: Option<String>,
}

impl LayoutRequest {
    pub fn new(choir_id: impl Into<String>, song_id: impl Into<String>) -> Self {
        Self {
            choir_id: Some(choir_id.into()),
            song_id: Some(song_id.into()),
        }
    }

    /// Request named by an object key (`{choir}+{song}+...`), e.g. from a storage
    /// notification.
    pub fn from_key(key: &str) -> Self {
        let mut parts = key.split('+');
        let mut next = || parts.next().map(str::to_string);
        Self {
            choir_id: next(),
            song_id: next(),
        }
    }

    /// `(choir_id, song_id)`, or [`RenderError::MissingParameter`].
    pub fn ids(&self) -> RenderResult<(&str, &str)> {
        let choir = present(&self.choir_id).ok_or(RenderError::MissingParameter("choir_id"))?;
        let song = present(&self.song_id).ok_or(RenderError::MissingParameter("song_id"))?;
        Ok((choir, song))
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.trim().is_empty())
}

/// Result of a layout that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutOutcome {
    Rendered(SceneDefinition),
    /// The provider failed or listed no parts.
    NothingToDo,
}

/// Lay out a song's parts on the canvas.
///
/// Visible parts are ordered by their reversed id, packed, and given a pan when
/// `opts.panning` is set; hidden parts follow without position or pan.
#[tracing::instrument(skip_all, fields(choir = ?request.choir_id, song = ?request.song_id))]
pub fn compute_layout(
    request: &LayoutRequest,
    upstream: &PartsResponse,
    opts: &LayoutOpts,
    packer: &dyn Packer,
) -> RenderResult<LayoutOutcome> {
    let (choir_id, song_id) = request.ids()?;
    if upstream.is_empty() {
        tracing::info!(ok = upstream.ok, "nothing to do");
        return Ok(LayoutOutcome::NothingToDo);
    }
    let canvas = opts.canvas()?;

    let mut seen = HashSet::with_capacity(upstream.parts.len());
    let mut visible = Vec::new();
    let mut hidden = Vec::new();
    for part in &upstream.parts {
        if !seen.insert(part.part_id.as_str()) {
            return Err(RenderError::validation(format!(
                "duplicate part id '{}'",
                part.part_id
            )));
        }
        let (w, h) = part.dimensions()?;
        let rect = Rectangle::new(part.part_id.clone(), w, h);
        if part.hidden {
            hidden.push(rect);
        } else {
            visible.push(rect);
        }
    }

    shuffle_rectangles(&mut visible);
    let placed = if visible.is_empty() {
        Vec::new()
    } else {
        packer.pack(&visible, canvas, opts.margin, opts.center)?
    };
    check_packed(&visible, &placed)?;
    tracing::debug!(
        visible = placed.len(),
        hidden = hidden.len(),
        "packed parts"
    );

    let inputs = placed
        .iter()
        .chain(hidden.iter())
        .map(|r| input_spec(r, canvas, opts.panning))
        .collect();

    Ok(LayoutOutcome::Rendered(SceneDefinition {
        choir_id: choir_id.to_string(),
        song_id: song_id.to_string(),
        output: OutputSpec {
            size: canvas.size(),
            reverb: opts.reverb,
            reverb_type: opts.reverb_type.clone(),
            panning: opts.panning,
            watermark: opts.watermark.clone(),
        },
        inputs,
        scenes: None,
    }))
}

/// Reproducible pseudo-shuffle: sort by the character-reversed id.
///
/// Ids start with a timestamp, so comparing them reversed puts their varying tail first.
/// Equal keys keep their input order.
pub fn shuffle_rectangles(rects: &mut [Rectangle]) {
    rects.sort_by_cached_key(|r| r.id.chars().rev().collect::<String>());
}

/// Stereo pan of a box from the horizontal position of its center: -1 left, 1 right.
///
/// Not clamped; a box hanging off the canvas pans past the ends.
pub fn stereo_pan(x: i64, width: u32, container_width: u32) -> f64 {
    let center = x as f64 + f64::from(width) / 2.0;
    2.0 * (center / f64::from(container_width)) - 1.0
}

fn input_spec(r: &Rectangle, canvas: Canvas, panning: bool) -> InputSpec {
    let position = r.position();
    let pan = match position {
        Some([x, _]) if panning => Some(stereo_pan(x, r.width, canvas.width)),
        _ => None,
    };
    InputSpec {
        part_id: r.id.clone(),
        size: [r.width, r.height],
        volume: 1.0,
        panning: 0.0,
        offset: 0,
        position,
        pan,
    }
}

fn check_packed(submitted: &[Rectangle], placed: &[Rectangle]) -> RenderResult<()> {
    if submitted.len() != placed.len() {
        return Err(RenderError::validation(format!(
            "packer returned {} rectangles for {} inputs",
            placed.len(),
            submitted.len()
        )));
    }
    let mut pending = submitted
        .iter()
        .map(|r| (r.id.as_str(), (r.width, r.height)))
        .collect::<HashMap<_, _>>();
    for r in placed {
        match pending.remove(r.id.as_str()) {
            Some(size) if size == (r.width, r.height) => {}
            Some(_) => {
                return Err(RenderError::validation(format!(
                    "packer resized rectangle '{}'",
                    r.id
                )));
            }
            None => {
                return Err(RenderError::validation(format!(
                    "packer returned unknown or repeated rectangle '{}'",
                    r.id
                )));
            }
        }
        if r.position().is_none() {
            return Err(RenderError::validation(format!(
                "packer left rectangle '{}' unplaced",
                r.id
            )));
        }
    }
    Ok(())
}

/// Result of [`LayoutEngine::run`].
#[derive(Clone, Debug, PartialEq)]
pub enum StoredLayout {
    /// The definition was persisted under `key`.
    Written {
        key: String,
        definition: SceneDefinition,
    },
    NothingToDo,
}

/// Fetches parts, lays them out and persists the definition.
pub struct LayoutEngine {
    opts: LayoutOpts,
    packer: Arc<dyn Packer>,
    parts: Arc<dyn PartsSource>,
    store: Arc<dyn ObjectStore>,
}

impl LayoutEngine {
    pub fn new(
        opts: LayoutOpts,
        packer: Arc<dyn Packer>,
        parts: Arc<dyn PartsSource>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            opts,
            packer,
            parts,
            store,
        }
    }

    pub fn opts(&self) -> &LayoutOpts {
        &self.opts
    }

    /// Lay out the requested song and write it to `{choir}+{song}+auto.json`.
    #[tracing::instrument(skip(self))]
    pub fn run(&self, request: &LayoutRequest) -> RenderResult<StoredLayout> {
        let (choir_id, song_id) = request.ids()?;
        let key = auto_definition_key(choir_id, song_id)?;
        let upstream = self.parts.song_parts(choir_id, song_id)?;

        match compute_layout(request, &upstream, &self.opts, self.packer.as_ref())? {
            LayoutOutcome::NothingToDo => Ok(StoredLayout::NothingToDo),
            LayoutOutcome::Rendered(definition) => {
                self.store.put(&key, &definition.to_vec()?)?;
                tracing::info!(%key, inputs = definition.inputs.len(), "wrote definition");
                Ok(StoredLayout::Written { key, definition })
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/engine.rs"]
mod tests;
