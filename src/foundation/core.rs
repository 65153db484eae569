use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::foundation::error::{RenderError, RenderResult};

/// Pixel dimensions of the output canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Build a canvas, rejecting zero-sized dimensions.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::validation("canvas width/height must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// `[width, height]`, the shape used by persisted definitions.
    pub fn size(self) -> [u32; 2] {
        [self.width, self.height]
    }
}

/// Wire value of the unpositioned row bucket.
pub const UNPOSITIONED_ROW: i64 = -1;

/// One unit of row-parallel work.
///
/// Placed inputs share a row when they share a `y` coordinate. Inputs without a position
/// (audio-only parts) all fall into [`Row::Unpositioned`].
///
/// Rows compare, order and hash by their [`wire`](Row::wire) value, so the unpositioned
/// bucket and an input placed at `y = -1` are the same row, and ordering is numeric.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Row {
    /// Bucket for inputs that carry no canvas position.
    Unpositioned,
    /// Inputs whose top edge sits at this `y`.
    At(i64),
}

impl Row {
    /// Row of an input with the given optional `[x, y]` position.
    pub fn of_position(position: Option<[i64; 2]>) -> Self {
        match position {
            Some([_, y]) => Self::from(y),
            None => Self::Unpositioned,
        }
    }

    /// Integer form used in job payloads, object keys and fingerprints.
    pub fn wire(self) -> i64 {
        match self {
            Self::Unpositioned => UNPOSITIONED_ROW,
            Self::At(y) => y,
        }
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.wire() == other.wire()
    }
}

impl Eq for Row {}

impl PartialOrd for Row {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Row {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wire().cmp(&other.wire())
    }
}

impl Hash for Row {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.wire().hash(state);
    }
}

impl From<i64> for Row {
    fn from(v: i64) -> Self {
        if v == UNPOSITIONED_ROW {
            Self::Unpositioned
        } else {
            Self::At(v)
        }
    }
}

impl From<Row> for i64 {
    fn from(row: Row) -> Self {
        row.wire()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
