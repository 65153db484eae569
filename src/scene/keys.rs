//! Object-store key conventions shared with upstream and downstream stages.
//!
//! Keys are `{choir_id}+{song_id}+{suffix}.{ext}`. Consumers recover the ids by splitting on
//! `+` and `.`, so ids and suffixes must not contain those delimiters where noted.

use std::fmt;

use crate::foundation::core::Row;
use crate::foundation::error::{RenderError, RenderResult};
use crate::identity::fingerprint::{RowsFingerprint, RunId};

/// Suffix of definitions produced by the layout engine.
pub const AUTO_SUFFIX: &str = "auto";
/// Suffix of the final stitched render.
pub const FINAL_SUFFIX: &str = "final";
/// Extension of row-part renders.
pub const ROW_PART_EXT: &str = "nut";

/// A parsed `{choir_id}+{song_id}+{suffix}.{ext}` key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectKey {
    pub choir_id: String,
    pub song_id: String,
    /// Everything after the second `+`; may itself contain `+`.
    pub suffix: String,
    pub ext: String,
}

impl ObjectKey {
    pub fn new(
        choir_id: impl Into<String>,
        song_id: impl Into<String>,
        suffix: impl Into<String>,
        ext: impl Into<String>,
    ) -> RenderResult<Self> {
        let key = Self {
            choir_id: choir_id.into(),
            song_id: song_id.into(),
            suffix: suffix.into(),
            ext: ext.into(),
        };
        for (name, v) in [("choir_id", &key.choir_id), ("song_id", &key.song_id)] {
            check_segment(name, v)?;
        }
        if key.suffix.is_empty() || key.suffix.contains('.') {
            return Err(RenderError::validation(format!(
                "key suffix '{}' must be non-empty and free of '.'",
                key.suffix
            )));
        }
        if key.ext.is_empty() || key.ext.contains(['+', '.']) {
            return Err(RenderError::validation(format!(
                "key extension '{}' must be non-empty and free of '+' and '.'",
                key.ext
            )));
        }
        Ok(key)
    }

    /// Parse `{choir}+{song}+{suffix}.{ext}`.
    pub fn parse(key: &str) -> RenderResult<Self> {
        let (stem, ext) = key
            .rsplit_once('.')
            .ok_or_else(|| RenderError::validation(format!("key '{key}' has no extension")))?;
        let mut parts = stem.splitn(3, '+');
        let (Some(choir_id), Some(song_id), Some(suffix)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(RenderError::validation(format!(
                "key '{key}' is not of the form choir+song+suffix.ext"
            )));
        };
        Self::new(choir_id, song_id, suffix, ext)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{}+{}.{}",
            self.choir_id, self.song_id, self.suffix, self.ext
        )
    }
}

fn check_segment(name: &str, v: &str) -> RenderResult<()> {
    if v.is_empty() || v.contains(['+', '.']) {
        return Err(RenderError::validation(format!(
            "{name} '{v}' must be non-empty and free of '+' and '.'"
        )));
    }
    Ok(())
}

/// Key of the definition the layout engine writes for a song.
pub fn auto_definition_key(choir_id: &str, song_id: &str) -> RenderResult<String> {
    Ok(ObjectKey::new(choir_id, song_id, AUTO_SUFFIX, "json")?.to_string())
}

/// Key of the final stitched video for a song.
pub fn final_render_key(choir_id: &str, song_id: &str) -> RenderResult<String> {
    Ok(ObjectKey::new(choir_id, song_id, FINAL_SUFFIX, "mp4")?.to_string())
}

/// Joins a definition id and a scene id in the row-part keys of multi-scene definitions.
pub const SCENE_TAG: &str = "-s";

/// Key of one rendered row: `{choir}+{song}+{def_id}+{run_id}+{row}@{rows_hash}.nut`.
///
/// All rows of one scene of one run share the `{choir}+{song}+{def_id}+{run_id}` prefix.
/// For a definition with several scenes `def_id` is `{definition id}-s{scene_id}`, so each
/// scene's rows land under their own prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowPartKey {
    pub choir_id: String,
    pub song_id: String,
    pub def_id: String,
    pub run_id: RunId,
    pub row: Row,
    pub rows_hash: RowsFingerprint,
}

impl RowPartKey {
    /// Row-part key for a row of the definition stored under `definition_key`.
    ///
    /// `scene` is set only when the definition has more than one scene.
    pub fn new(
        definition_key: &str,
        scene: Option<u32>,
        run_id: &RunId,
        row: Row,
        rows_hash: &RowsFingerprint,
    ) -> RenderResult<Self> {
        let def = ObjectKey::parse(definition_key)?;
        check_segment("definition id", &def.suffix)?;
        let def_id = match scene {
            Some(id) => format!("{}{SCENE_TAG}{id}", def.suffix),
            None => def.suffix,
        };
        Ok(Self {
            choir_id: def.choir_id,
            song_id: def.song_id,
            def_id,
            run_id: run_id.clone(),
            row,
            rows_hash: rows_hash.clone(),
        })
    }

    /// Common prefix of every row part written by this run.
    pub fn run_prefix(&self) -> String {
        format!(
            "{}+{}+{}+{}",
            self.choir_id, self.song_id, self.def_id, self.run_id
        )
    }

    pub fn parse(key: &str) -> RenderResult<Self> {
        let bad = || {
            RenderError::validation(format!(
                "row part key '{key}' is not of the form choir+song+def+run+row@hash.{ROW_PART_EXT}"
            ))
        };
        let stem = key
            .strip_suffix(&format!(".{ROW_PART_EXT}"))
            .ok_or_else(bad)?;
        let segments = stem.split('+').collect::<Vec<_>>();
        let [choir_id, song_id, def_id, run_id, section] = segments.as_slice() else {
            return Err(bad());
        };
        let (row, rows_hash) = section.split_once('@').ok_or_else(bad)?;
        let row = row.parse::<i64>().map_err(|_| bad())?;
        for (name, v) in [
            ("choir_id", choir_id),
            ("song_id", song_id),
            ("definition id", def_id),
        ] {
            check_segment(name, v)?;
        }
        Ok(Self {
            choir_id: choir_id.to_string(),
            song_id: song_id.to_string(),
            def_id: def_id.to_string(),
            run_id: RunId::from_token(*run_id)?,
            row: Row::from(row),
            rows_hash: RowsFingerprint::parse(rows_hash)?,
        })
    }
}

impl fmt::Display for RowPartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{}@{}.{ROW_PART_EXT}",
            self.run_prefix(),
            self.row,
            self.rows_hash
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/keys.rs"]
mod tests;
