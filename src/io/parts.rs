use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{RenderError, RenderResult};
use crate::scene::model::SongPart;

/// Song-parts listing as returned by the metadata provider.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PartsResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub parts: Vec<SongPart>,
}

impl PartsResponse {
    /// A successful listing.
    pub fn ok(parts: Vec<SongPart>) -> Self {
        Self { ok: true, parts }
    }

    /// A provider-reported failure.
    pub fn failed() -> Self {
        Self::default()
    }

    /// True when there is nothing to lay out: the provider failed or listed no parts.
    pub fn is_empty(&self) -> bool {
        !self.ok || self.parts.is_empty()
    }
}

/// Song-metadata provider capability.
///
/// A provider that answers but reports failure should return `Ok` with `ok == false`;
/// `Err` is reserved for transport failures.
pub trait PartsSource: Send + Sync {
    fn song_parts(&self, choir_id: &str, song_id: &str) -> RenderResult<PartsResponse>;
}

/// Provider serving one fixed listing, filtered to the requested song.
#[derive(Clone, Debug)]
pub struct StaticParts {
    response: PartsResponse,
}

impl StaticParts {
    pub fn new(response: PartsResponse) -> Self {
        Self { response }
    }

    /// Load a provider response from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RenderError::validation(format!("open parts JSON '{}': {e}", path.display()))
        })?;
        let response: PartsResponse = serde_json::from_reader(BufReader::new(f))
            .map_err(|e| RenderError::serde(format!("parse parts JSON: {e}")))?;
        Ok(Self::new(response))
    }
}

impl PartsSource for StaticParts {
    fn song_parts(&self, choir_id: &str, song_id: &str) -> RenderResult<PartsResponse> {
        // Parts without ids belong to whichever song is asked for.
        let matches = |id: &str, want: &str| id.is_empty() || id == want;
        Ok(PartsResponse {
            ok: self.response.ok,
            parts: self
                .response
                .parts
                .iter()
                .filter(|p| matches(&p.choir_id, choir_id) && matches(&p.song_id, song_id))
                .cloned()
                .collect(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/io/parts.rs"]
mod tests;
