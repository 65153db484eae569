use std::collections::BTreeSet;
use std::fmt;

use sha1::Digest as _;

use crate::foundation::core::Row;
use crate::foundation::error::{RenderError, RenderResult};

/// Hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 8;

/// Characters kept from the random UUID backing a [`RunId`].
pub const RUN_ID_LEN: usize = 8;

/// Short content hash of a scene's row set.
///
/// Identifies row-rendering work by geometry rather than by run: two scenes with the same
/// rows share a fingerprint no matter when, how often, or in what order they were hashed.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RowsFingerprint(String);

impl RowsFingerprint {
    /// Accept an externally supplied token (e.g. parsed from an object key).
    pub fn parse(token: &str) -> RenderResult<Self> {
        let ok = token.len() == FINGERPRINT_LEN
            && token
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !ok {
            return Err(RenderError::validation(format!(
                "rows hash '{token}' must be {FINGERPRINT_LEN} lowercase hex characters"
            )));
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowsFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint a set of rows.
///
/// Rows are deduplicated, sorted numerically, rendered in their wire form and joined with
/// `-`; the fingerprint is the first [`FINGERPRINT_LEN`] hex characters of the SHA-1 of that
/// string. `[720, 0, 360, 0]` and `[0, 360, 720]` both hash `"0-360-720"` to `0807fa78`,
/// the value the stitching stage recomputes from row-part keys.
pub fn fingerprint_rows(rows: impl IntoIterator<Item = Row>) -> RowsFingerprint {
    let rows = rows.into_iter().collect::<BTreeSet<_>>();
    let canonical = canonical_rows(&rows);
    let digest = sha1::Sha1::digest(canonical.as_bytes());
    let mut out = String::with_capacity(FINGERPRINT_LEN);
    for b in digest.iter().take(FINGERPRINT_LEN / 2) {
        out.push_str(&format!("{:02x}", b));
    }
    RowsFingerprint(out)
}

fn canonical_rows(rows: &BTreeSet<Row>) -> String {
    rows.iter()
        .map(|r| r.wire().to_string())
        .collect::<Vec<_>>()
        .join("-")
}

/// Token shared by every row job submitted in one dispatch call.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Mint a fresh random run id.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(RUN_ID_LEN);
        Self(id)
    }

    /// Wrap an existing token (e.g. one parsed from an object key).
    pub fn from_token(token: impl Into<String>) -> RenderResult<Self> {
        let token = token.into();
        if token.is_empty() || token.contains(['+', '@', '.']) {
            return Err(RenderError::validation(format!(
                "run id '{token}' must be non-empty and free of '+', '@' and '.'"
            )));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/identity/fingerprint.rs"]
mod tests;
