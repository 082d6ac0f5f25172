use crate::core::window::{normalize_window_size, WindowSpec};
use crate::maybe_rayon::*;
use crate::types::{Band, RasterError, RasterResult, Sample};
use serde::{Deserialize, Serialize};

/// Non-local means parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlMeansParams {
    /// Size of the patches compared for similarity (even sizes are coerced
    /// to size + 1)
    pub patch_size: usize,
    /// Maximal distance in pixels where candidate patches are searched
    pub patch_distance: usize,
    /// Cut-off distance `h`; higher values accept more patches and smooth
    /// more aggressively
    pub cutoff_distance: Sample,
}

impl Default for NlMeansParams {
    fn default() -> Self {
        Self {
            patch_size: 7,
            patch_distance: 5,
            cutoff_distance: 0.1,
        }
    }
}

impl NlMeansParams {
    pub fn patch(&self) -> WindowSpec {
        WindowSpec::new(self.patch_size)
    }

    pub fn validate(&self) -> RasterResult<()> {
        if self.patch_size == 0 {
            return Err(RasterError::Configuration(
                "Patch size must be a positive integer".to_string(),
            ));
        }
        if self.patch_distance == 0 {
            return Err(RasterError::Configuration(
                "Patch distance must be a positive integer".to_string(),
            ));
        }
        if self.cutoff_distance <= 0.0 {
            return Err(RasterError::Configuration(format!(
                "Cut-off distance must be > 0, got {}",
                self.cutoff_distance
            )));
        }
        Ok(())
    }
}

/// Apply non-local means denoising to one band.
///
/// Each pixel becomes a weighted average of candidate pixels within
/// `patch_distance`, weighted by the similarity of the surrounding
/// `patch_size` patches: `w = exp(-d2 / h^2)` with `d2` the mean squared
/// patch difference over mutually in-bounds offsets. The center candidate
/// always contributes with weight 1, so the weight sum never degenerates.
pub fn nl_means_filter(band: &Band, params: &NlMeansParams) -> RasterResult<Band> {
    log::debug!(
        "Applying non-local means: patch size {}, distance {}, h {}",
        normalize_window_size(params.patch_size),
        params.patch_distance,
        params.cutoff_distance
    );

    let (rows, cols) = band.dim();
    let patch_radius = params.patch().radius() as isize;
    let search = params.patch_distance as isize;
    let h2 = (params.cutoff_distance * params.cutoff_distance) as f64;

    let data: Vec<Sample> = (0..rows)
        .into_par_iter()
        .flat_map(|i| {
            let mut row = vec![0.0; cols];
            for (j, out) in row.iter_mut().enumerate() {
                let mut weighted_sum = 0.0f64;
                let mut weight_sum = 0.0f64;

                for di in -search..=search {
                    for dj in -search..=search {
                        let ci = i as isize + di;
                        let cj = j as isize + dj;
                        if ci < 0 || cj < 0 || ci as usize >= rows || cj as usize >= cols {
                            continue;
                        }

                        let d2 = patch_distance_squared(
                            band,
                            (i as isize, j as isize),
                            (ci, cj),
                            patch_radius,
                        );
                        let weight = (-d2 / h2).exp();
                        weighted_sum += weight * band[[ci as usize, cj as usize]] as f64;
                        weight_sum += weight;
                    }
                }

                *out = (weighted_sum / weight_sum) as Sample;
            }
            row
        })
        .collect();

    Band::from_shape_vec((rows, cols), data)
        .map_err(|e| RasterError::Processing(e.to_string()))
}

/// Mean squared difference between the patches around `a` and `b`,
/// restricted to offsets in bounds for both patch centers.
fn patch_distance_squared(
    band: &Band,
    a: (isize, isize),
    b: (isize, isize),
    radius: isize,
) -> f64 {
    let (rows, cols) = band.dim();
    let in_bounds = |r: isize, c: isize| r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols;

    let mut sum = 0.0f64;
    let mut count = 0usize;
    for dr in -radius..=radius {
        for dc in -radius..=radius {
            let (ar, ac) = (a.0 + dr, a.1 + dc);
            let (br, bc) = (b.0 + dr, b.1 + dc);
            if in_bounds(ar, ac) && in_bounds(br, bc) {
                let diff = band[[ar as usize, ac as usize]] as f64
                    - band[[br as usize, bc as usize]] as f64;
                sum += diff * diff;
                count += 1;
            }
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
