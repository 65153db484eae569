//! Row-level geometry and bookkeeping shared by row jobs and the stitching stage.

use std::collections::BTreeSet;

use crate::foundation::core::Row;
use crate::foundation::error::{RenderError, RenderResult};
use crate::identity::fingerprint::{RowsFingerprint, fingerprint_rows};
use crate::io::store::ObjectStore;
use crate::scene::keys::{ROW_PART_EXT, RowPartKey};
use crate::scene::model::InputSpec;

/// Inputs rendered by `row`, in definition order.
pub fn inputs_for_row(inputs: &[InputSpec], row: Row) -> impl Iterator<Item = &InputSpec> {
    inputs.iter().filter(move |i| i.row() == row)
}

/// Size of the most populated row.
pub fn max_row_len(inputs: &[InputSpec]) -> usize {
    let rows = inputs.iter().map(InputSpec::row).collect::<BTreeSet<_>>();
    rows.into_iter()
        .map(|r| inputs_for_row(inputs, r).count())
        .max()
        .unwrap_or(0)
}

/// Gain applied to a row's audio mix so sparse rows are not louder than full ones.
pub fn row_volume(inputs: &[InputSpec], row: Row) -> f64 {
    let max = max_row_len(inputs);
    if max == 0 {
        return 0.0;
    }
    inputs_for_row(inputs, row).count() as f64 / max as f64
}

/// Vertical slice of the output canvas a row job renders into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowBand {
    /// Top edge of the row's boxes on the canvas.
    pub top: i64,
    /// Bottom edge of the row's boxes on the canvas.
    pub bottom: i64,
    /// Height of the rendered slice, including padding.
    pub height: i64,
    pub width: u32,
    /// Where the boxes sit inside the slice.
    pub row_y: i64,
}

/// Band geometry for `row`, or `None` when the row has no positioned inputs.
///
/// Each band is `margin` taller than its boxes. The first band also takes the space above
/// the layout and the last band the space below it, so stacked bands fill the canvas.
pub fn row_band(
    inputs: &[InputSpec],
    row: Row,
    output_size: [u32; 2],
    margin: u32,
) -> Option<RowBand> {
    let (total_top, total_bottom) = vertical_extent(inputs.iter())?;
    let (top, bottom) = vertical_extent(inputs_for_row(inputs, row))?;
    let [width, total_height] = output_size;

    let mut height = bottom - top + i64::from(margin);
    let mut row_y = 0;
    if top == total_top {
        height += top;
        row_y = top;
    }
    if bottom == total_bottom {
        height += i64::from(total_height) - total_bottom;
    }
    Some(RowBand {
        top,
        bottom,
        height,
        width,
        row_y,
    })
}

fn vertical_extent<'a>(inputs: impl Iterator<Item = &'a InputSpec>) -> Option<(i64, i64)> {
    inputs
        .filter_map(|i| {
            let [_, y] = i.position?;
            Some((y, y + i64::from(i.size[1])))
        })
        .reduce(|(t0, b0), (t1, b1)| (t0.min(t1), b0.max(b1)))
}

/// Whether the row-part keys of one run cover exactly the rows fingerprinted by `expected`.
///
/// All keys must belong to the same run.
pub fn rows_complete<S: AsRef<str>>(keys: &[S], expected: &RowsFingerprint) -> RenderResult<bool> {
    let parsed = keys
        .iter()
        .map(|k| RowPartKey::parse(k.as_ref()))
        .collect::<RenderResult<Vec<_>>>()?;
    if let Some(first) = parsed.first() {
        let prefix = first.run_prefix();
        if let Some(other) = parsed.iter().find(|k| k.run_prefix() != prefix) {
            return Err(RenderError::validation(format!(
                "row part '{other}' does not belong to run '{prefix}'"
            )));
        }
    }
    let found = fingerprint_rows(parsed.iter().map(|k| k.row));
    Ok(parsed.iter().all(|k| &k.rows_hash == expected) && &found == expected)
}

/// Row parts stored so far for the run (and scene) `landed` belongs to, sorted by row, once
/// every row of its fingerprint is present; `None` while rows are still missing.
///
/// Called when any one row part lands. Lists `{run prefix}+` in `store`, ignoring objects
/// that are not row parts.
#[tracing::instrument(skip(store), fields(run = %landed.run_prefix()))]
pub fn complete_run_rows(
    store: &dyn ObjectStore,
    landed: &RowPartKey,
) -> RenderResult<Option<Vec<RowPartKey>>> {
    let prefix = format!("{}+", landed.run_prefix());
    let suffix = format!(".{ROW_PART_EXT}");
    let keys = store
        .list(&prefix)?
        .into_iter()
        .filter(|k| k.ends_with(&suffix))
        .collect::<Vec<_>>();
    if !rows_complete(&keys, &landed.rows_hash)? {
        tracing::debug!(found = keys.len(), "rows still missing");
        return Ok(None);
    }
    let mut parts = keys
        .iter()
        .map(|k| RowPartKey::parse(k))
        .collect::<RenderResult<Vec<_>>>()?;
    parts.sort_by_key(|k| k.row);
    Ok(Some(parts))
}

#[cfg(test)]
#[path = "../../tests/unit/dispatch/rows.rs"]
mod tests;
