use crate::types::{Band, Sample};
use ndarray::{s, ArrayView2};
use serde::{Deserialize, Serialize};

/// Coerce a configured window size to the next odd value.
///
/// The effective window size is always odd; an even size becomes size + 1.
/// Idempotent, and the result is never smaller than the input.
pub fn normalize_window_size(size: usize) -> usize {
    if size % 2 != 0 {
        size
    } else {
        size + 1
    }
}

/// Moving-window geometry derived from a configured window size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    size: usize,
}

impl WindowSpec {
    pub fn new(size: usize) -> Self {
        Self {
            size: normalize_window_size(size),
        }
    }

    /// Effective (odd) window size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Half-window offset
    pub fn radius(&self) -> usize {
        self.size / 2
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Clamped window view over one band, bounded by
/// `[max(0, i-r), min(H, i+r)) x [max(0, j-r), min(W, j+r))`.
///
/// Near edges the view is smaller, never padded or reflected; the result is
/// at least 1x1 for any in-bounds (i, j). No pixel storage is copied.
pub fn window_view(band: &Band, i: usize, j: usize, radius: usize) -> ArrayView2<'_, Sample> {
    let (rows, cols) = band.dim();
    let top = i.saturating_sub(radius);
    let bottom = (i + radius).min(rows).max(top + 1);
    let left = j.saturating_sub(radius);
    let right = (j + radius).min(cols).max(left + 1);
    band.slice(s![top..bottom, left..right])
}

/// Full centered window view, bounded by
/// `[max(0, i-r), min(H, i+r+1)) x [max(0, j-r), min(W, j+r+1))`.
///
/// Used by the moment extractor and the box-filter path, which evaluate the
/// complete (2r+1)-sized neighborhood; borders clamp the same way as
/// [`window_view`].
pub fn window_view_centered(
    band: &Band,
    i: usize,
    j: usize,
    radius: usize,
) -> ArrayView2<'_, Sample> {
    let (rows, cols) = band.dim();
    let top = i.saturating_sub(radius);
    let bottom = (i + radius + 1).min(rows);
    let left = j.saturating_sub(radius);
    let right = (j + radius + 1).min(cols);
    band.slice(s![top..bottom, left..right])
}
