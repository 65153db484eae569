use crate::foundation::core::Canvas;
use crate::foundation::error::{RenderError, RenderResult};
use crate::scene::model::Rectangle;

/// Rectangle placement capability consumed by the layout engine.
///
/// Contract: return exactly one placed rectangle per input rectangle, preserving `id`,
/// `width` and `height`, with `x`/`y` set, without overlap inside `container` (keeping
/// `margin` between boxes), and centered as a group when `center` is set. The returned order
/// is the order inputs appear in the definition.
pub trait Packer: Send + Sync {
    fn pack(
        &self,
        rects: &[Rectangle],
        container: Canvas,
        margin: u32,
        center: bool,
    ) -> RenderResult<Vec<Rectangle>>;
}

impl<F> Packer for F
where
    F: Fn(&[Rectangle], Canvas, u32, bool) -> RenderResult<Vec<Rectangle>> + Send + Sync,
{
    fn pack(
        &self,
        rects: &[Rectangle],
        container: Canvas,
        margin: u32,
        center: bool,
    ) -> RenderResult<Vec<Rectangle>> {
        self(rects, container, margin, center)
    }
}

/// Reference packer: fills shelves left to right, starting a new shelf when the next box
/// would cross the right edge.
///
/// Boxes keep their size. Every box on a shelf shares the shelf's `y`, so a shelf is exactly
/// one render row. Shelves may run past the bottom of the container when the boxes do not
/// fit; placements are never clamped.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShelfPacker;

impl Packer for ShelfPacker {
    fn pack(
        &self,
        rects: &[Rectangle],
        container: Canvas,
        margin: u32,
        center: bool,
    ) -> RenderResult<Vec<Rectangle>> {
        if rects.iter().any(|r| r.width == 0 || r.height == 0) {
            return Err(RenderError::validation(
                "shelf packer requires rectangles with width/height > 0",
            ));
        }

        let margin = i64::from(margin);
        let right_edge = i64::from(container.width);
        let mut out = Vec::with_capacity(rects.len());
        let (mut x, mut y) = (margin, margin);
        let mut shelf_h = 0i64;
        let mut shelf_len = 0usize;

        for r in rects {
            let (w, h) = (i64::from(r.width), i64::from(r.height));
            if shelf_len > 0 && x + w + margin > right_edge {
                y += shelf_h + margin;
                x = margin;
                shelf_h = 0;
                shelf_len = 0;
            }
            out.push(r.placed_at(x, y));
            x += w + margin;
            shelf_h = shelf_h.max(h);
            shelf_len += 1;
        }

        if center && !out.is_empty() {
            center_group(&mut out, container);
        }
        Ok(out)
    }
}

fn center_group(placed: &mut [Rectangle], container: Canvas) {
    let mut min = (i64::MAX, i64::MAX);
    let mut max = (i64::MIN, i64::MIN);
    for r in placed.iter() {
        let Some([x, y]) = r.position() else {
            continue;
        };
        min = (min.0.min(x), min.1.min(y));
        max = (
            max.0.max(x + i64::from(r.width)),
            max.1.max(y + i64::from(r.height)),
        );
    }
    let dx = (i64::from(container.width) - (max.0 - min.0)) / 2 - min.0;
    let dy = (i64::from(container.height) - (max.1 - min.1)) / 2 - min.1;
    for r in placed.iter_mut() {
        r.x = r.x.map(|x| x + dx);
        r.y = r.y.map(|y| y + dy);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layout/packer.rs"]
mod tests;
