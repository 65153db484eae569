use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::foundation::core::Row;
use crate::foundation::error::{RenderError, RenderResult};

/// Aspect ratio assumed for parts that do not report one.
pub const DEFAULT_ASPECT_RATIO: &str = "640:480";

/// Scene id given to the implicit scene of a definition without `scenes`.
pub const IMPLICIT_SCENE_ID: u32 = 1;

/// One participant's recorded clip, as reported by the metadata provider.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongPart {
    /// Unique part identifier; ids are time-prefixed.
    pub part_id: String,
    #[serde(default)]
    pub choir_id: String,
    #[serde(default)]
    pub song_id: String,
    /// `"W:H"`; [`DEFAULT_ASPECT_RATIO`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    /// Audio-only parts take no space on the canvas.
    #[serde(default)]
    pub hidden: bool,
}

impl SongPart {
    /// Parse the aspect ratio into `(width, height)`.
    pub fn dimensions(&self) -> RenderResult<(u32, u32)> {
        let ratio = match self.aspect_ratio.as_deref() {
            Some(r) if !r.trim().is_empty() => r,
            _ => DEFAULT_ASPECT_RATIO,
        };
        parse_aspect_ratio(ratio).ok_or_else(|| {
            RenderError::validation(format!(
                "part '{}' has invalid aspect ratio '{ratio}'",
                self.part_id
            ))
        })
    }
}

fn parse_aspect_ratio(ratio: &str) -> Option<(u32, u32)> {
    let (w, h) = ratio.split_once(':')?;
    let w = w.trim().parse::<u32>().ok()?;
    let h = h.trim().parse::<u32>().ok()?;
    (w > 0 && h > 0).then_some((w, h))
}

/// A box handed to (and returned by) the packer.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rectangle {
    pub id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
}

impl Rectangle {
    /// An unplaced rectangle.
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            x: None,
            y: None,
        }
    }

    /// Copy of this rectangle placed at `(x, y)`.
    pub fn placed_at(&self, x: i64, y: i64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..self.clone()
        }
    }

    /// `[x, y]` once both coordinates are set.
    pub fn position(&self) -> Option<[i64; 2]> {
        Some([self.x?, self.y?])
    }
}

/// Per-part compositing instructions inside a definition.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InputSpec {
    pub part_id: String,
    pub size: [u32; 2],
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub panning: f64,
    /// Start offset in milliseconds.
    #[serde(default)]
    pub offset: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[i64; 2]>,
    /// Stereo pan, nominally in `[-1, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pan: Option<f64>,
}

fn default_volume() -> f64 {
    1.0
}

impl InputSpec {
    /// Row bucket this input is rendered in.
    pub fn row(&self) -> Row {
        Row::of_position(self.position)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OutputSpec {
    pub size: [u32; 2],
    pub reverb: f64,
    pub reverb_type: String,
    pub panning: bool,
    pub watermark: Option<String>,
}

/// One independently laid-out group of inputs.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub scene_id: u32,
    pub inputs: Vec<InputSpec>,
}

impl Scene {
    /// Distinct rows of this scene, ascending.
    pub fn rows(&self) -> BTreeSet<Row> {
        self.inputs.iter().map(InputSpec::row).collect()
    }
}

/// The persisted layout document consumed by the compositor dispatcher.
///
/// Definitions are written once per render request and never patched in place.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneDefinition {
    pub choir_id: String,
    pub song_id: String,
    pub output: OutputSpec,
    pub inputs: Vec<InputSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenes: Option<Vec<Scene>>,
}

impl SceneDefinition {
    /// Parse a definition from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> RenderResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| RenderError::serde(format!("parse scene definition JSON: {e}")))
    }

    /// Serialize to the persisted JSON form.
    pub fn to_vec(&self) -> RenderResult<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| RenderError::serde(format!("encode scene definition JSON: {e}")))
    }

    /// The scenes to render, always at least one.
    ///
    /// A definition without `scenes` (or with an empty list) is a single scene with id
    /// [`IMPLICIT_SCENE_ID`] over the top-level `inputs`.
    pub fn scenes(&self) -> Cow<'_, [Scene]> {
        match &self.scenes {
            Some(scenes) if !scenes.is_empty() => Cow::Borrowed(scenes.as_slice()),
            _ => Cow::Owned(vec![Scene {
                scene_id: IMPLICIT_SCENE_ID,
                inputs: self.inputs.clone(),
            }]),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
