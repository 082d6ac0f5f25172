use crate::core::moments::local_statistics;
use crate::core::window::{window_view, WindowSpec};
use crate::maybe_rayon::*;
use crate::types::{Band, RasterError, RasterResult, Sample};
use serde::{Deserialize, Serialize};

/// Fixed noise coefficient assumed by the Lee and Kuan weighting
pub const NOISE_COEFFICIENT: Sample = 0.25;

/// Stand-in for the squared coefficient of variation when the local window
/// mean is zero. A fixed guard value, not a derived one.
pub const ZERO_MEAN_CV_SQUARED: Sample = 0.1;

/// Speckle filtering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeckleFilterParams {
    /// Filter window size (even sizes are coerced to size + 1)
    pub window_size: usize,
    /// Damping factor (Frost filter only)
    pub damping_factor: Sample,
}

impl Default for SpeckleFilterParams {
    fn default() -> Self {
        Self {
            window_size: 3,
            damping_factor: 2.0,
        }
    }
}

impl SpeckleFilterParams {
    pub fn window(&self) -> WindowSpec {
        WindowSpec::new(self.window_size)
    }

    pub fn validate(&self) -> RasterResult<()> {
        if self.window_size == 0 {
            return Err(RasterError::Configuration(
                "Window size must be a positive integer".to_string(),
            ));
        }
        if self.damping_factor < 0.0 {
            return Err(RasterError::Configuration(format!(
                "Damping factor must be >= 0, got {}",
                self.damping_factor
            )));
        }
        Ok(())
    }
}

/// Squared coefficient of variation with the zero-mean guard applied
fn squared_cv(mean: Sample, std: Sample) -> Sample {
    if mean == 0.0 {
        ZERO_MEAN_CV_SQUARED
    } else {
        let ci = std / mean;
        ci * ci
    }
}

/// Apply the Lee filter to one band.
///
/// Blends each pixel with its local window mean using the weight
/// `w = 1 - cu^2/ci^2` (zero when `cu > ci`), where `ci` is the window's
/// coefficient of variation and `cu` the fixed noise coefficient.
pub fn lee_filter(band: &Band, spec: WindowSpec) -> RasterResult<Band> {
    log::debug!("Applying Lee filter, window size {}", spec.size());

    let (rows, cols) = band.dim();
    let radius = spec.radius();
    let two_cu = NOISE_COEFFICIENT * NOISE_COEFFICIENT;

    let data: Vec<Sample> = (0..rows)
        .into_par_iter()
        .flat_map(|i| {
            let mut row = vec![0.0; cols];
            for (j, out) in row.iter_mut().enumerate() {
                let window = window_view(band, i, j, radius);
                let stats = local_statistics(&window);

                let two_ci = squared_cv(stats.mean, stats.std);
                let weight = if NOISE_COEFFICIENT > two_ci.sqrt() {
                    0.0
                } else {
                    1.0 - two_cu / two_ci
                };

                let pixel = band[[i, j]];
                *out = (pixel * weight + stats.mean * (1.0 - weight)).round();
            }
            row
        })
        .collect();

    Band::from_shape_vec((rows, cols), data)
        .map_err(|e| RasterError::Processing(e.to_string()))
}

/// Apply the Kuan filter to one band.
///
/// Same local statistics as Lee but with the weight divided by
/// `1 + cu^2`, which tempers the blend toward the window mean.
pub fn kuan_filter(band: &Band, spec: WindowSpec) -> RasterResult<Band> {
    log::debug!("Applying Kuan filter, window size {}", spec.size());

    let (rows, cols) = band.dim();
    let radius = spec.radius();
    let two_cu = NOISE_COEFFICIENT * NOISE_COEFFICIENT;
    let divisor = 1.0 + two_cu;

    let data: Vec<Sample> = (0..rows)
        .into_par_iter()
        .flat_map(|i| {
            let mut row = vec![0.0; cols];
            for (j, out) in row.iter_mut().enumerate() {
                let window = window_view(band, i, j, radius);
                let stats = local_statistics(&window);

                let two_ci = squared_cv(stats.mean, stats.std);
                let weight = if NOISE_COEFFICIENT > two_ci.sqrt() {
                    0.0
                } else {
                    (1.0 - two_cu / two_ci) / divisor
                };

                let pixel = band[[i, j]];
                *out = (pixel * weight + stats.mean * (1.0 - weight)).round();
            }
            row
        })
        .collect();

    Band::from_shape_vec((rows, cols), data)
        .map_err(|e| RasterError::Processing(e.to_string()))
}

/// Apply the Frost filter to one band.
///
/// Each output pixel is a weighted average over the window with
/// `weight(x) = exp(-factor_a * |x - center|)`, the distance measured on
/// pixel intensity. `factor_a = damping * cv(window)/mean(window)`; a zero
/// local mean collapses `factor_a` to 0, and damping 0 degenerates to the
/// unweighted window average.
pub fn frost_filter(band: &Band, spec: WindowSpec, damping: Sample) -> RasterResult<Band> {
    log::debug!(
        "Applying Frost filter, window size {}, damping {}",
        spec.size(),
        damping
    );

    let (rows, cols) = band.dim();
    let radius = spec.radius();

    let data: Vec<Sample> = (0..rows)
        .into_par_iter()
        .flat_map(|i| {
            let mut row = vec![0.0; cols];
            for (j, out) in row.iter_mut().enumerate() {
                let window = window_view(band, i, j, radius);
                let stats = local_statistics(&window);

                let sigma_zero = if stats.mean == 0.0 {
                    0.0
                } else {
                    stats.coefficient_of_variation / stats.mean
                };
                let factor_a = (damping * sigma_zero) as f64;

                let (wr, wc) = window.dim();
                let center = window[[wr / 2, wc / 2]] as f64;

                let mut weighted_sum = 0.0f64;
                let mut weight_sum = 0.0f64;
                for &x in window.iter() {
                    let weight = (-factor_a * (x as f64 - center).abs()).exp();
                    weighted_sum += weight * x as f64;
                    weight_sum += weight;
                }

                *out = if weight_sum > 0.0 {
                    (weighted_sum / weight_sum) as Sample
                } else {
                    center as Sample
                };
            }
            row
        })
        .collect();

    Band::from_shape_vec((rows, cols), data)
        .map_err(|e| RasterError::Processing(e.to_string()))
}

/// Apply the window-median filter to one band.
pub fn median_filter(band: &Band, spec: WindowSpec) -> RasterResult<Band> {
    log::debug!("Applying median filter, window size {}", spec.size());

    let (rows, cols) = band.dim();
    let radius = spec.radius();

    let data: Vec<Sample> = (0..rows)
        .into_par_iter()
        .flat_map(|i| {
            let mut row = vec![0.0; cols];
            let mut values = Vec::with_capacity(spec.size() * spec.size());
            for (j, out) in row.iter_mut().enumerate() {
                let window = window_view(band, i, j, radius);
                values.clear();
                values.extend(window.iter().copied());
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

                let mid = values.len() / 2;
                let median = if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
                };
                *out = median.round();
            }
            row
        })
        .collect();

    Band::from_shape_vec((rows, cols), data)
        .map_err(|e| RasterError::Processing(e.to_string()))
}
